//! # RecStore Core
//!
//! In-memory, schema-validated record store.
//!
//! This crate provides:
//! - Models that validate and default record fields
//! - An insertion-ordered manifest with tombstone deletion and compaction
//! - Hash and BTree secondary indexes kept current on every write
//! - Named, AND-composed filters over the manifest
//! - Doubly-linked, optionally cyclic traversal of the filtered records
//! - Lifecycle events for external consumers
//!
//! ## Usage
//!
//! ```rust
//! use recstore_core::{FieldType, Filter, Model, Store, StoreConfig};
//! use serde_json::json;
//!
//! let model = Model::builder("person")
//!     .field("firstname", FieldType::Text)
//!     .field("lastname", FieldType::Text)
//!     .field_with_default("val", FieldType::Integer, 15)
//!     .build()
//!     .unwrap();
//! let store = Store::new(StoreConfig::new().name("people").model(model)).unwrap();
//!
//! store.add_many([
//!     json!({"firstname": "John", "lastname": "Doe"}),
//!     json!({"firstname": "Bob", "lastname": "Smith"}),
//!     json!({"firstname": "Jill", "lastname": "Doe"}),
//! ]).unwrap();
//!
//! store.add_filter(Filter::new("does", |r| {
//!     r.get("lastname").is_some_and(|v| v == "Doe")
//! }));
//! store.filter(Some("does")).unwrap();
//!
//! let john = store.first().unwrap();
//! assert_eq!(john.next().unwrap().get("firstname").unwrap(), "Jill");
//! assert_eq!(john.previous_cycle().unwrap().get("firstname").unwrap(), "Jill");
//! assert_eq!(store.size(), 2);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod events;
mod filter;
pub mod index;
mod model;
mod record;
mod store;
mod value;

pub use config::{StoreConfig, DEFAULT_STORE_NAME};
pub use error::{ModelError, ModelResult, StoreError, StoreResult};
pub use events::{EventFeed, EventKind, StoreEvent};
pub use filter::{Filter, FilterStatus};
pub use index::{IndexKind, IndexStats, Position};
pub use model::{FieldDef, FieldType, Model, ModelBuilder};
pub use record::{Oid, Record};
pub use store::{CompactionResult, IntoRecord, Selector, Store};
pub use value::{data_from_json, data_to_json, Data, Value};
