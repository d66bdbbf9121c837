//! Test fixtures and store helpers.
//!
//! Provides the `person` model used throughout the test suite and
//! convenience functions for common store scenarios.

use parking_lot::Mutex;
use recstore_core::{Data, EventKind, FieldType, Filter, Model, Record, Store, StoreConfig, Value};
use std::sync::Arc;

/// Default of the `val` field on the person model.
pub const DEFAULT_VAL: i64 = 15;

/// Returns the person model: `firstname` and `lastname` text fields and an
/// integer `val` defaulting to [`DEFAULT_VAL`].
pub fn person_model() -> Model {
    Model::builder("person")
        .field("firstname", FieldType::Text)
        .field("lastname", FieldType::Text)
        .field_with_default("val", FieldType::Integer, DEFAULT_VAL)
        .build()
        .expect("person model is valid")
}

/// Creates an empty, unnamed store over the person model.
pub fn person_store() -> Store {
    Store::new(StoreConfig::new().model(person_model())).expect("Failed to create store")
}

/// Builds raw person data.
pub fn person(firstname: &str, lastname: &str) -> Data {
    let mut data = Data::new();
    data.insert("firstname".into(), Value::from(firstname));
    data.insert("lastname".into(), Value::from(lastname));
    data
}

/// Builds raw person data with an explicit `val`.
pub fn person_with_val(firstname: &str, lastname: &str, val: i64) -> Data {
    let mut data = person(firstname, lastname);
    data.insert("val".into(), Value::from(val));
    data
}

/// Returns the `firstname` of a record, or an empty string.
pub fn firstname(record: &Record) -> String {
    record
        .get("firstname")
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

/// Returns the first names of `records`, in order.
pub fn firstnames(records: &[Record]) -> Vec<String> {
    records.iter().map(firstname).collect()
}

/// Passes records whose last name is "Doe".
pub fn doe_family() -> Filter {
    Filter::new("doe_family", |record| {
        record.get("lastname").is_some_and(|v| v == "Doe")
    })
}

/// Passes records whose first name starts with 'J'.
pub fn j_names() -> Filter {
    Filter::new("j_names", |record| {
        record
            .get("firstname")
            .and_then(|v| v.as_str().map(|s| s.starts_with('J')))
            .unwrap_or(false)
    })
}

/// Records the kind of every event a store emits.
pub fn record_events(store: &Store) -> Arc<Mutex<Vec<EventKind>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    store.on(move |event| sink.lock().push(event.kind()));
    seen
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// John, Jill and Jake Doe.
    pub fn doe_siblings() -> Vec<Data> {
        vec![
            person("John", "Doe"),
            person("Jill", "Doe"),
            person("Jake", "Doe"),
        ]
    }

    /// Three Does and a Swanson, in that order.
    pub fn mixed_family() -> Vec<Data> {
        vec![
            person("John", "Doe"),
            person("Jane", "Doe"),
            person("Bob", "Doe"),
            person("Jack", "Swanson"),
        ]
    }

    /// `count` people named "First i" / "Last i".
    pub fn numbered_people(count: usize) -> Vec<Data> {
        (0..count)
            .map(|i| person(&format!("First {i}"), &format!("Last {i}")))
            .collect()
    }

    /// Creates a person store holding `records`.
    pub fn populated_store(records: Vec<Data>) -> (Store, Vec<Record>) {
        let store = person_store();
        let added = store.add_many(records).expect("Failed to add records");
        (store, added)
    }
}
