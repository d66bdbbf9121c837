//! The record store.
//!
//! A [`Store`] keeps an insertion-ordered manifest of records. Removal
//! leaves a tombstone so positions held by indexes stay valid; `compact`
//! reclaims tombstones and renumbers. Two counters describe the manifest:
//!
//! - [`Store::length`]: slots, tombstones included
//! - [`Store::size`]: the active set (live records passing every enabled
//!   filter)
//!
//! # Example
//!
//! ```rust
//! use recstore_core::{FieldType, Model, Store, StoreConfig};
//! use serde_json::json;
//!
//! let model = Model::builder("person")
//!     .field("firstname", FieldType::Text)
//!     .field("lastname", FieldType::Text)
//!     .build()
//!     .unwrap();
//! let store = Store::new(StoreConfig::new().model(model).index("lastname")).unwrap();
//!
//! store.add_many([
//!     json!({"firstname": "John", "lastname": "Doe"}),
//!     json!({"firstname": "Jill", "lastname": "Doe"}),
//! ]).unwrap();
//!
//! store.remove(0);
//! assert_eq!(store.length(), 2);
//! assert_eq!(store.size(), 1);
//! assert_eq!(store.first().unwrap().get("firstname").unwrap(), "Jill");
//! assert_eq!(store.get_index_records("lastname", "Doe").unwrap().len(), 1);
//! ```

mod state;

pub use state::CompactionResult;
pub(crate) use state::Direction;

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::events::{EventFeed, StoreEvent};
use crate::filter::{Filter, FilterStatus};
use crate::index::{FieldIndex, IndexKind, IndexStats, Position};
use crate::model::{FieldDef, Model};
use crate::record::Record;
use crate::value::{Data, Value};
use parking_lot::RwLock;
use state::StoreState;
use std::fmt;
use std::ops::{Bound, RangeBounds};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use tracing::{debug, trace};

/// Anything a store can turn into a record.
pub trait IntoRecord {
    /// Converts into a record built by `model`.
    ///
    /// # Errors
    ///
    /// Fails if raw data does not fit the model, or if an existing record
    /// was built by a different model.
    fn into_record(self, model: &Model) -> StoreResult<Record>;
}

impl IntoRecord for Record {
    fn into_record(self, model: &Model) -> StoreResult<Record> {
        if self.model() != model {
            return Err(StoreError::ModelMismatch {
                expected: model.name().to_string(),
                actual: self.model().name().to_string(),
            });
        }
        Ok(self)
    }
}

impl IntoRecord for &Record {
    fn into_record(self, model: &Model) -> StoreResult<Record> {
        self.clone().into_record(model)
    }
}

impl IntoRecord for Data {
    fn into_record(self, model: &Model) -> StoreResult<Record> {
        Ok(model.create(self)?)
    }
}

impl IntoRecord for serde_json::Value {
    fn into_record(self, model: &Model) -> StoreResult<Record> {
        Ok(model.create_json(self)?)
    }
}

/// Identifies a record to remove: a manifest position or the record.
#[derive(Debug, Clone, Copy)]
pub enum Selector<'a> {
    /// A manifest position.
    Position(Position),
    /// A record handle.
    Record(&'a Record),
}

impl From<Position> for Selector<'_> {
    fn from(position: Position) -> Self {
        Selector::Position(position)
    }
}

impl<'a> From<&'a Record> for Selector<'a> {
    fn from(record: &'a Record) -> Self {
        Selector::Record(record)
    }
}

pub(crate) struct StoreShared {
    name: String,
    model: Model,
    state: RwLock<StoreState>,
    feed: EventFeed,
}

impl StoreShared {
    /// Writes a field of a held record, re-keying indexes and filter
    /// membership under the same lock.
    ///
    /// Returns `None` if the record is no longer held by this store.
    pub(crate) fn write_field(
        &self,
        record: &Record,
        slot: usize,
        value: &Value,
    ) -> Option<Value> {
        let previous = {
            let mut state = self.state.write();
            let position = state.position_of(record)?;
            let previous = record.replace_value(slot, value.clone());
            if previous == *value {
                return Some(previous);
            }
            state.rekey(position, slot, &previous, value);
            if state.filters.has_enabled() {
                state.refresh_position(position);
            }
            previous
        };
        let field = self.model.field_at(slot).name.clone();
        trace!(store = %self.name, oid = %record.oid(), field = %field, "record updated");
        self.feed.emit(StoreEvent::RecordUpdate {
            record: record.clone(),
            field,
        });
        Some(previous)
    }

    pub(crate) fn navigate(
        &self,
        record: &Record,
        direction: Direction,
        steps: usize,
        cycle: bool,
    ) -> Option<Record> {
        let state = self.state.read();
        let position = state.position_of(record)?;
        let target = state.navigate(position, direction, steps, cycle)?;
        state.record_at(target).cloned()
    }

    fn resolve(&self, state: &StoreState, selector: Selector<'_>) -> Option<Position> {
        match selector {
            Selector::Position(position) => state.record_at(position).map(|_| position),
            Selector::Record(record) => state.position_of(record),
        }
    }
}

/// An in-memory record store.
///
/// `Store` is a cheap handle; clones operate on the same records. Every
/// operation completes atomically with respect to other callers, and its
/// lifecycle events are delivered before it returns.
#[derive(Clone)]
pub struct Store {
    shared: Arc<StoreShared>,
}

impl Store {
    /// Creates a store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Configuration`] when no model is configured and
    /// [`StoreError::UnknownField`] when an index names an undeclared field.
    pub fn new(config: StoreConfig) -> StoreResult<Self> {
        let name = config.resolved_name().to_string();
        let model = config
            .model
            .ok_or_else(|| StoreError::configuration("a store requires a model"))?;

        let store = Self {
            shared: Arc::new(StoreShared {
                name,
                model,
                state: RwLock::new(StoreState::default()),
                feed: EventFeed::new(),
            }),
        };
        for (field, kind) in &config.indexes {
            match kind {
                Some(kind) => store.create_index_with(field, *kind)?,
                None => store.create_index(field)?,
            };
        }
        debug!(store = %store.name(), model = %store.model().name(), "store created");
        Ok(store)
    }

    pub(crate) fn from_shared(shared: Arc<StoreShared>) -> Self {
        Self { shared }
    }

    /// Returns the store name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Returns the model records are built with.
    #[must_use]
    pub fn model(&self) -> &Model {
        &self.shared.model
    }

    /// Returns true if both handles refer to the same store.
    #[must_use]
    pub fn ptr_eq(&self, other: &Store) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// Subscribes to lifecycle events.
    pub fn subscribe(&self) -> Receiver<StoreEvent> {
        self.shared.feed.subscribe()
    }

    /// Registers a lifecycle event callback.
    pub fn on<F>(&self, listener: F)
    where
        F: Fn(&StoreEvent) + Send + Sync + 'static,
    {
        self.shared.feed.on(listener);
    }

    /// Returns the manifest slot count, tombstones included.
    #[must_use]
    pub fn length(&self) -> usize {
        self.shared.state.read().length()
    }

    /// Returns the number of records in the active set.
    #[must_use]
    pub fn size(&self) -> usize {
        self.shared.state.read().size()
    }

    /// Returns true if the active set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    // ---- mutation ----

    /// Adds one record, building it from raw data if needed.
    ///
    /// A record held by another store moves to this one. A record already
    /// held by this store is returned as is.
    ///
    /// # Errors
    ///
    /// Fails if the data does not fit the model; the store is unchanged.
    pub fn add<T: IntoRecord>(&self, item: T) -> StoreResult<Record> {
        let mut records = self.add_many(std::iter::once(item))?;
        records
            .pop()
            .ok_or_else(|| StoreError::configuration("add produced no record"))
    }

    /// Adds records in order and returns them in the same order.
    ///
    /// `RecordCreate` events fire once every record is in place, in
    /// insertion order.
    ///
    /// # Errors
    ///
    /// Fails if any item does not fit the model; no record is added.
    pub fn add_many<I, T>(&self, items: I) -> StoreResult<Vec<Record>>
    where
        I: IntoIterator<Item = T>,
        T: IntoRecord,
    {
        let records = self.build_records(items)?;

        let mut events = Vec::with_capacity(records.len());
        {
            let mut state = self.shared.state.write();
            let owner = Arc::downgrade(&self.shared);
            for record in &records {
                if state.position_of(record).is_some() {
                    continue;
                }
                let position = state.append(record.clone());
                record.attach(owner.clone());
                trace!(store = %self.name(), oid = %record.oid(), position, "record added");
                events.push(StoreEvent::RecordCreate(record.clone()));
            }
        }
        self.shared.feed.emit_batch(events);
        Ok(records)
    }

    /// Replaces the whole manifest with `items`.
    ///
    /// Indexes are rebuilt in a single pass each, so loading hundreds of
    /// thousands of records stays linear. Instead of per-record events a
    /// single `Load` event fires. Returns the number of records loaded.
    ///
    /// # Errors
    ///
    /// Fails if any item does not fit the model; the store is unchanged.
    pub fn load<I, T>(&self, items: I) -> StoreResult<usize>
    where
        I: IntoIterator<Item = T>,
        T: IntoRecord,
    {
        let records = self.build_records(items)?;

        let count = {
            let mut state = self.shared.state.write();
            let previous = state.load(Vec::new());
            for record in &previous {
                record.detach();
            }
            let owner = Arc::downgrade(&self.shared);
            for record in &records {
                record.attach(owner.clone());
            }
            state.load(records);
            state.live()
        };
        debug!(store = %self.name(), count, "records loaded");
        self.shared.feed.emit(StoreEvent::Load { count });
        Ok(count)
    }

    fn build_records<I, T>(&self, items: I) -> StoreResult<Vec<Record>>
    where
        I: IntoIterator<Item = T>,
        T: IntoRecord,
    {
        let records = items
            .into_iter()
            .map(|item| item.into_record(&self.shared.model))
            .collect::<StoreResult<Vec<_>>>()?;

        // Records held by another store move here
        for record in &records {
            if record.is_owned_by(&self.shared) {
                continue;
            }
            if let Some(other) = record.store() {
                other.remove(record);
            }
        }
        Ok(records)
    }

    /// Removes one record by position or reference.
    ///
    /// The slot is tombstoned: `length` is unchanged and `size` drops by one
    /// if the record was active. Returns `None`, changing nothing, when the
    /// position is out of range, already tombstoned, or the record is not
    /// held by this store.
    pub fn remove<'a>(&self, target: impl Into<Selector<'a>>) -> Option<Record> {
        let removed = {
            let mut state = self.shared.state.write();
            let position = self.shared.resolve(&state, target.into())?;
            let removed = state.remove_at(position)?;
            removed.detach();
            trace!(store = %self.name(), oid = %removed.oid(), position, "record removed");
            removed
        };
        self.shared
            .feed
            .emit(StoreEvent::RecordDelete(removed.clone()));
        Some(removed)
    }

    /// Removes several records.
    ///
    /// The result is aligned with `targets`: `None` marks a target that was
    /// invalid or already removed. `RecordDelete` events fire in manifest
    /// order.
    pub fn remove_many<'a, I, S>(&self, targets: I) -> Vec<Option<Record>>
    where
        I: IntoIterator<Item = S>,
        S: Into<Selector<'a>>,
    {
        let (removed, mut ordered) = {
            let mut state = self.shared.state.write();
            let positions: Vec<Option<Position>> = targets
                .into_iter()
                .map(|t| self.shared.resolve(&state, t.into()))
                .collect();
            let removed = state.remove_batch(&positions);
            for record in removed.iter().flatten() {
                record.detach();
            }
            let ordered: Vec<(Position, Record)> = positions
                .iter()
                .zip(&removed)
                .filter_map(|(p, r)| Some(((*p)?, r.clone()?)))
                .collect();
            (removed, ordered)
        };

        ordered.sort_by_key(|(position, _)| *position);
        debug!(store = %self.name(), count = ordered.len(), "records removed");
        let events = ordered
            .into_iter()
            .map(|(_, record)| StoreEvent::RecordDelete(record))
            .collect();
        self.shared.feed.emit_batch(events);
        removed
    }

    /// Discards every record.
    ///
    /// Afterwards `length` and `size` are both zero. Indexes and filters
    /// stay registered.
    pub fn clear(&self) {
        let previous = {
            let mut state = self.shared.state.write();
            let previous = state.reset();
            for record in &previous {
                record.detach();
            }
            previous
        };
        debug!(store = %self.name(), discarded = previous.len(), "store cleared");
        self.shared.feed.emit(StoreEvent::Clear);
    }

    /// Reclaims tombstoned slots and renumbers the manifest.
    ///
    /// Relative order is preserved and every index is rewritten to the new
    /// positions.
    pub fn compact(&self) -> CompactionResult {
        let result = self.shared.state.write().compact();
        debug!(
            store = %self.name(),
            before = result.slots_before,
            after = result.slots_after,
            "store compacted"
        );
        self.shared.feed.emit(StoreEvent::Compact {
            removed: result.tombstones_removed,
        });
        result
    }

    // ---- lookup ----

    /// Returns the manifest position of a record, or `None` if this store
    /// does not hold it.
    #[must_use]
    pub fn index_of(&self, record: &Record) -> Option<Position> {
        self.shared.state.read().position_of(record)
    }

    /// Returns true if this store holds the record.
    #[must_use]
    pub fn contains(&self, record: &Record) -> bool {
        self.index_of(record).is_some()
    }

    /// Returns the record at a manifest position.
    ///
    /// Tombstoned and out-of-range positions yield `None`.
    #[must_use]
    pub fn get_record(&self, position: Position) -> Option<Record> {
        self.shared.state.read().record_at(position).cloned()
    }

    /// Returns the first record of the active set.
    #[must_use]
    pub fn first(&self) -> Option<Record> {
        let state = self.shared.state.read();
        state
            .active()
            .first()
            .and_then(|p| state.record_at(*p).cloned())
    }

    /// Returns the last record of the active set.
    #[must_use]
    pub fn last(&self) -> Option<Record> {
        let state = self.shared.state.read();
        state
            .active()
            .last()
            .and_then(|p| state.record_at(*p).cloned())
    }

    /// Returns true if the record is held and passes every enabled filter.
    #[must_use]
    pub fn is_active(&self, record: &Record) -> bool {
        let state = self.shared.state.read();
        state
            .position_of(record)
            .is_some_and(|p| state.is_active(p))
    }

    /// Returns the active set in manifest order.
    #[must_use]
    pub fn records(&self) -> Vec<Record> {
        self.shared.state.read().active_records()
    }

    /// Returns the field data of the active set in manifest order.
    #[must_use]
    pub fn data(&self) -> Vec<Data> {
        self.records().iter().map(Record::data).collect()
    }

    /// Calls `f` on every record of the active set, in order.
    ///
    /// The set is captured before the first call, so `f` may write fields
    /// (indexed ones included) or otherwise use the store.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&Record),
    {
        for record in self.records() {
            f(&record);
        }
    }

    // ---- filters ----

    /// Registers a filter, disabled.
    ///
    /// A filter with the same name is replaced; if the replaced filter was
    /// enabled the active set is recomputed.
    pub fn add_filter(&self, filter: Filter) {
        let name = filter.name().to_string();
        let mut state = self.shared.state.write();
        if state.filters.register(filter) == Some(true) {
            state.refresh_active();
        }
        debug!(store = %self.name(), filter = %name, "filter registered");
    }

    /// Deregisters the named filter, or every filter for `None`.
    ///
    /// Returns false if nothing was registered under the name.
    pub fn remove_filter(&self, name: Option<&str>) -> bool {
        let mut state = self.shared.state.write();
        let (removed, was_enabled) = match name {
            Some(name) => match state.filters.deregister(name) {
                Some(enabled) => (true, enabled),
                None => (false, false),
            },
            None => {
                let any = state.filters.len() > 0;
                (any, state.filters.deregister_all())
            }
        };
        if was_enabled {
            state.refresh_active();
        }
        removed
    }

    /// Enables the named filter, or every filter for `None`, and applies
    /// the result.
    ///
    /// Enabling an already enabled filter changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownFilter`] for an unregistered name.
    pub fn filter(&self, name: Option<&str>) -> StoreResult<()> {
        self.set_filter_enabled(name, true)
    }

    /// Disables the named filter and restores the records it excluded.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownFilter`] for an unregistered name.
    pub fn disable_filter(&self, name: &str) -> StoreResult<()> {
        self.set_filter_enabled(Some(name), false)
    }

    /// Disables every filter without deregistering them.
    pub fn clear_filter(&self) {
        // Cannot fail: no name is given
        let _ = self.set_filter_enabled(None, false);
    }

    fn set_filter_enabled(&self, name: Option<&str>, enabled: bool) -> StoreResult<()> {
        let mut state = self.shared.state.write();
        let changed = match name {
            Some(name) => state
                .filters
                .set_enabled(name, enabled)
                .ok_or_else(|| StoreError::unknown_filter(name))?,
            None => state.filters.set_all_enabled(enabled),
        };
        if changed {
            state.refresh_active();
            debug!(
                store = %self.name(),
                filter = name.unwrap_or("*"),
                enabled,
                size = state.size(),
                "filters applied"
            );
        }
        Ok(())
    }

    /// Returns every registered filter with its enabled flag.
    #[must_use]
    pub fn filters(&self) -> Vec<FilterStatus> {
        self.shared.state.read().filters.status()
    }

    // ---- indexes ----

    fn field_def(&self, field: &str) -> StoreResult<&FieldDef> {
        self.shared
            .model
            .field(field)
            .ok_or_else(|| StoreError::unknown_field(field))
    }

    /// Indexes a field, using a BTree for numeric fields and a hash index
    /// otherwise. Returns the kind chosen.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownField`] if the model does not declare
    /// the field; no index is created.
    pub fn create_index(&self, field: &str) -> StoreResult<IndexKind> {
        let kind = if self.field_def(field)?.field_type.is_numeric() {
            IndexKind::BTree
        } else {
            IndexKind::Hash
        };
        self.create_index_with(field, kind)
    }

    /// Indexes a field with the given structure.
    ///
    /// An existing index on the field is rebuilt if its kind differs.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownField`] if the model does not declare
    /// the field; no index is created.
    pub fn create_index_with(&self, field: &str, kind: IndexKind) -> StoreResult<IndexKind> {
        let slot = self
            .shared
            .model
            .slot(field)
            .ok_or_else(|| StoreError::unknown_field(field))?;
        if self.shared.state.write().create_index(field, slot, kind) {
            debug!(store = %self.name(), field, ?kind, "index created");
        }
        Ok(kind)
    }

    /// Drops the index on `field`, or every index for `None`.
    ///
    /// Returns the number of indexes dropped.
    pub fn remove_index(&self, field: Option<&str>) -> usize {
        let removed = self.shared.state.write().remove_index(field);
        debug!(store = %self.name(), field = field.unwrap_or("*"), removed, "index removed");
        removed
    }

    /// Returns the indexed field names in creation order.
    #[must_use]
    pub fn indexed_field_names(&self) -> Vec<String> {
        self.shared.state.read().indexed_field_names()
    }

    /// Returns the structure backing a field's index.
    #[must_use]
    pub fn index_kind(&self, field: &str) -> Option<IndexKind> {
        self.shared.state.read().index(field).map(FieldIndex::kind)
    }

    fn with_index<R>(
        &self,
        field: &str,
        f: impl FnOnce(&StoreState, &FieldIndex) -> R,
    ) -> StoreResult<R> {
        self.field_def(field)?;
        let state = self.shared.state.read();
        let index = state
            .index(field)
            .ok_or_else(|| StoreError::not_indexed(field))?;
        Ok(f(&*state, index))
    }

    fn lookup_key(&self, field: &str, value: Value) -> StoreResult<Value> {
        let def = self.field_def(field)?;
        // A value of the wrong type simply matches nothing
        Ok(def
            .field_type
            .coerce(field, value.clone())
            .unwrap_or(value))
    }

    /// Returns the live records whose `field` equals `value`, in manifest
    /// order.
    ///
    /// Filters do not apply: the index covers every live record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownField`] or [`StoreError::NotIndexed`].
    pub fn get_index_records(
        &self,
        field: &str,
        value: impl Into<Value>,
    ) -> StoreResult<Vec<Record>> {
        let key = self.lookup_key(field, value.into())?;
        self.with_index(field, |state, index| {
            index
                .as_index()
                .lookup(&key)
                .iter()
                .filter_map(|p| state.record_at(*p).cloned())
                .collect()
        })
    }

    /// Returns the number of live records whose `field` equals `value`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownField`] or [`StoreError::NotIndexed`].
    pub fn index_count(&self, field: &str, value: impl Into<Value>) -> StoreResult<usize> {
        let key = self.lookup_key(field, value.into())?;
        self.with_index(field, |_, index| index.as_index().count(&key))
    }

    /// Returns the live records whose `field` lies in `range`, ordered by
    /// value and then by manifest position.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownField`], [`StoreError::NotIndexed`], or
    /// [`StoreError::NotOrdered`] when the field has a hash index.
    pub fn get_index_range<R>(&self, field: &str, range: R) -> StoreResult<Vec<Record>>
    where
        R: RangeBounds<Value>,
    {
        let key = |bound: Bound<&Value>| -> StoreResult<Bound<Value>> {
            Ok(match bound {
                Bound::Included(v) => Bound::Included(self.lookup_key(field, v.clone())?),
                Bound::Excluded(v) => Bound::Excluded(self.lookup_key(field, v.clone())?),
                Bound::Unbounded => Bound::Unbounded,
            })
        };
        let bounds = (key(range.start_bound())?, key(range.end_bound())?);
        self.with_index(field, |state, index| -> StoreResult<Vec<Record>> {
            let btree = index.as_btree().ok_or_else(|| StoreError::NotOrdered {
                field: field.to_string(),
            })?;
            if is_empty_range(&bounds) {
                return Ok(Vec::new());
            }
            Ok(btree
                .range(bounds)
                .into_iter()
                .filter_map(|p| state.record_at(p).cloned())
                .collect())
        })?
    }

    /// Summarizes the index on `field`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownField`] or [`StoreError::NotIndexed`].
    pub fn index_stats(&self, field: &str) -> StoreResult<IndexStats> {
        self.with_index(field, |_, index| index.stats())
    }
}

/// Returns true for ranges a `BTreeMap` would reject.
fn is_empty_range(bounds: &(Bound<Value>, Bound<Value>)) -> bool {
    match bounds {
        (Bound::Included(start), Bound::Included(end)) => start > end,
        (Bound::Included(start) | Bound::Excluded(start), Bound::Excluded(end))
        | (Bound::Excluded(start), Bound::Included(end)) => start >= end,
        _ => false,
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.read();
        f.debug_struct("Store")
            .field("name", &self.shared.name)
            .field("model", &self.shared.model.name())
            .field("length", &state.length())
            .field("size", &state.size())
            .finish()
    }
}
