//! Lifecycle events emitted by a store.
//!
//! Every mutation that changes the manifest produces events, delivered
//! synchronously before the mutating call returns and in manifest order.
//! Consumers such as a transaction log or a UI binding can:
//! - receive events over a channel with [`EventFeed::subscribe`]
//! - register a callback with [`EventFeed::on`]
//!
//! # Usage
//!
//! ```rust
//! use recstore_core::{FieldType, Model, Store, StoreConfig, StoreEvent};
//!
//! let model = Model::builder("person")
//!     .field("firstname", FieldType::Text)
//!     .build()
//!     .unwrap();
//! let store = Store::new(StoreConfig::new().model(model)).unwrap();
//! let events = store.subscribe();
//!
//! store.add(serde_json::json!({"firstname": "John"})).unwrap();
//!
//! assert!(matches!(events.try_recv(), Ok(StoreEvent::RecordCreate(_))));
//! ```

use crate::record::Record;
use parking_lot::RwLock;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

type Listener = dyn Fn(&StoreEvent) + Send + Sync;

/// Type of a store event, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A record was added.
    RecordCreate,
    /// A record field changed while the record was held by the store.
    RecordUpdate,
    /// A record was removed.
    RecordDelete,
    /// The store was cleared.
    Clear,
    /// The store was bulk loaded.
    Load,
    /// Tombstones were reclaimed.
    Compact,
}

impl EventKind {
    /// Returns the dotted event name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::RecordCreate => "record.create",
            EventKind::RecordUpdate => "record.update",
            EventKind::RecordDelete => "record.delete",
            EventKind::Clear => "clear",
            EventKind::Load => "load",
            EventKind::Compact => "compact",
        }
    }
}

/// A single lifecycle event.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// A record was added.
    RecordCreate(Record),
    /// A field of a held record changed.
    RecordUpdate {
        /// The changed record.
        record: Record,
        /// Name of the changed field.
        field: String,
    },
    /// A record was removed.
    RecordDelete(Record),
    /// Every record was discarded.
    Clear,
    /// The manifest was replaced by a bulk load.
    Load {
        /// Number of records loaded.
        count: usize,
    },
    /// Tombstoned slots were reclaimed.
    Compact {
        /// Number of slots reclaimed.
        removed: usize,
    },
}

impl StoreEvent {
    /// Returns the event kind.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            StoreEvent::RecordCreate(_) => EventKind::RecordCreate,
            StoreEvent::RecordUpdate { .. } => EventKind::RecordUpdate,
            StoreEvent::RecordDelete(_) => EventKind::RecordDelete,
            StoreEvent::Clear => EventKind::Clear,
            StoreEvent::Load { .. } => EventKind::Load,
            StoreEvent::Compact { .. } => EventKind::Compact,
        }
    }

    /// Returns the record the event is about, if any.
    #[must_use]
    pub fn record(&self) -> Option<&Record> {
        match self {
            StoreEvent::RecordCreate(record)
            | StoreEvent::RecordUpdate { record, .. }
            | StoreEvent::RecordDelete(record) => Some(record),
            _ => None,
        }
    }
}

/// Distributes store events to subscribers and listeners.
///
/// The feed:
/// - Preserves emission order
/// - Supports multiple subscribers
/// - Drops subscribers whose receiver was dropped
/// - Is thread-safe
#[derive(Default)]
pub struct EventFeed {
    subscribers: RwLock<Vec<Sender<StoreEvent>>>,
    listeners: RwLock<Vec<Arc<Listener>>>,
}

impl EventFeed {
    /// Creates an empty feed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to the feed.
    ///
    /// Returns a receiver that gets every future event. The receiver should
    /// be drained regularly to avoid unbounded memory growth.
    pub fn subscribe(&self) -> Receiver<StoreEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Registers a callback invoked for every future event.
    ///
    /// Callbacks run on the emitting thread after the store has released
    /// its internal locks, so they may call back into the store.
    pub fn on<F>(&self, listener: F)
    where
        F: Fn(&StoreEvent) + Send + Sync + 'static,
    {
        self.listeners.write().push(Arc::new(listener));
    }

    /// Emits one event.
    pub fn emit(&self, event: StoreEvent) {
        // Snapshot listeners so a callback can register another one
        let listeners: Vec<Arc<Listener>> = self.listeners.read().clone();
        for listener in &listeners {
            listener(&event);
        }

        let mut subscribers = self.subscribers.write();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Emits events in order.
    pub fn emit_batch(&self, events: Vec<StoreEvent>) {
        if events.is_empty() || !self.has_consumers() {
            return;
        }
        for event in events {
            self.emit(event);
        }
    }

    /// Returns true if anyone is listening.
    #[must_use]
    pub fn has_consumers(&self) -> bool {
        !self.subscribers.read().is_empty() || !self.listeners.read().is_empty()
    }

    /// Returns the number of channel subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Returns the number of callback listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}
