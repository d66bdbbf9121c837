//! Benchmark utilities.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use rand::seq::SliceRandom;
use rand::Rng;
use recstore_core::{Data, FieldType, Model, Store, StoreConfig, Value};

const LASTNAMES: [&str; 8] = [
    "Doe", "Smith", "Swanson", "Nguyen", "Garcia", "Okafor", "Larsen", "Ito",
];

/// Returns the benchmark model: two text fields and an integer `val`.
pub fn bench_model() -> Model {
    Model::builder("person")
        .field("firstname", FieldType::Text)
        .field("lastname", FieldType::Text)
        .field_with_default("val", FieldType::Integer, 15)
        .build()
        .expect("bench model is valid")
}

/// Creates an empty store, indexing the given fields.
pub fn bench_store(indexes: &[&str]) -> Store {
    let config = indexes
        .iter()
        .fold(StoreConfig::new().model(bench_model()), |config, field| {
            config.index(*field)
        });
    Store::new(config).expect("Failed to create store")
}

/// Generates `count` people with random last names and values.
pub fn random_people(count: usize) -> Vec<Data> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|i| {
            let mut data = Data::new();
            data.insert("firstname".into(), Value::from(format!("First {i}")));
            let lastname = LASTNAMES.choose(&mut rng).copied().unwrap_or("Doe");
            data.insert("lastname".into(), Value::from(lastname));
            data.insert("val".into(), Value::from(rng.gen_range(0..1_000i64)));
            data
        })
        .collect()
}
