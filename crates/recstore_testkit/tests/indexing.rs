//! Secondary index maintenance and lookups.

use recstore_core::{
    FieldType, IndexKind, Model, Record, Store, StoreConfig, StoreError, Value,
};
use serde_json::json;
use std::ops::Bound;
use recstore_testkit::prelude::*;

fn indexed_store() -> Store {
    let store = Store::new(
        StoreConfig::new()
            .model(person_model())
            .index("firstname")
            .index("lastname"),
    )
    .unwrap();
    store
        .add_many([
            person_with_val("John", "Doe", 17),
            person_with_val("Jill", "Doe", 13),
            person_with_val("Jake", "Doe", 14),
            person_with_val("John", "Dearborn", 14),
        ])
        .unwrap();
    store
}

#[test]
fn configured_indexes_are_named_in_order() {
    let store = indexed_store();
    assert_eq!(store.indexed_field_names(), ["firstname", "lastname"]);
    assert_eq!(store.index_kind("lastname"), Some(IndexKind::Hash));
}

#[test]
fn lookup_returns_records_in_manifest_order() {
    let store = indexed_store();
    let does = store.get_index_records("lastname", "Doe").unwrap();
    assert_eq!(firstnames(&does), ["John", "Jill", "Jake"]);

    let johns = store.get_index_records("firstname", "John").unwrap();
    assert_eq!(johns.len(), 2);
    assert!(store.get_index_records("lastname", "Nobody").unwrap().is_empty());
}

#[test]
fn remove_index_by_name_and_all() {
    let store = indexed_store();

    assert_eq!(store.remove_index(Some("firstname")), 1);
    assert_eq!(store.indexed_field_names(), ["lastname"]);
    assert_eq!(store.remove_index(Some("firstname")), 0);

    assert_eq!(store.remove_index(None), 1);
    assert!(store.indexed_field_names().is_empty());
    assert_eq!(
        store.get_index_records("lastname", "Doe").unwrap_err(),
        StoreError::NotIndexed {
            field: "lastname".into()
        }
    );
}

#[test]
fn numeric_fields_get_a_btree() {
    let store = indexed_store();
    store.remove_index(None);

    assert_eq!(store.create_index("val").unwrap(), IndexKind::BTree);
    assert_eq!(store.indexed_field_names(), ["val"]);
    assert_eq!(store.index_kind("val"), Some(IndexKind::BTree));
    assert_eq!(store.get_index_records("val", 14).unwrap().len(), 2);
    assert_eq!(store.index_count("val", 13).unwrap(), 1);
    assert_eq!(store.index_count("val", 99).unwrap(), 0);
}

#[test]
fn explicit_btree_on_text_field() {
    let store = indexed_store();
    store.create_index_with("lastname", IndexKind::BTree).unwrap();
    assert_eq!(store.index_kind("lastname"), Some(IndexKind::BTree));

    let range = store
        .get_index_range("lastname", Value::from("Da")..Value::from("Df"))
        .unwrap();
    assert_eq!(firstnames(&range), ["John"]);
    assert_eq!(store.get_index_records("lastname", "Doe").unwrap().len(), 3);
}

#[test]
fn range_queries_order_by_value() {
    let store = indexed_store();
    store.create_index("val").unwrap();

    let range = store
        .get_index_range("val", Value::from(13)..=Value::from(14))
        .unwrap();
    assert_eq!(firstnames(&range), ["Jill", "Jake", "John"]);

    let above = store.get_index_range("val", Value::from(15)..).unwrap();
    assert_eq!(firstnames(&above), ["John"]);

    let err = store
        .get_index_range("lastname", Value::from("A")..)
        .unwrap_err();
    assert!(matches!(err, StoreError::NotOrdered { .. }));
}

#[test]
fn range_bounds_follow_the_field_type() {
    let model = Model::builder("item")
        .field("name", FieldType::Text)
        .field("price", FieldType::Float)
        .build()
        .unwrap();
    let store = Store::new(StoreConfig::new().model(model).index("price")).unwrap();
    store
        .add_many([
            json!({"name": "pen", "price": 10}),
            json!({"name": "lamp", "price": 20.5}),
        ])
        .unwrap();
    let names = |records: Vec<Record>| -> Vec<String> {
        records
            .iter()
            .map(|r| r.get("name").unwrap().to_string())
            .collect()
    };

    assert_eq!(store.index_count("price", 10).unwrap(), 1);
    let upto = store.get_index_range("price", ..=Value::from(10)).unwrap();
    assert_eq!(names(upto), ["pen"]);
    let above = store
        .get_index_range("price", (Bound::Excluded(Value::from(10)), Bound::Unbounded))
        .unwrap();
    assert_eq!(names(above), ["lamp"]);

    // Float bounds on an integer field
    let people = indexed_store();
    people.create_index("val").unwrap();
    let from = people.get_index_range("val", Value::from(14.0)..).unwrap();
    assert_eq!(firstnames(&from), ["Jake", "John", "John"]);
    let below = people.get_index_range("val", ..Value::from(14.0)).unwrap();
    assert_eq!(firstnames(&below), ["Jill"]);
}

#[test]
fn untyped_fields_keep_integers_and_floats_apart() {
    let model = Model::builder("reading")
        .field("raw", FieldType::Any)
        .build()
        .unwrap();
    let store = Store::new(StoreConfig::new().model(model).index("raw")).unwrap();
    store
        .add_many([json!({"raw": 14}), json!({"raw": 14.0}), json!({"raw": 15})])
        .unwrap();

    assert_eq!(store.index_count("raw", 14).unwrap(), 1);
    assert_eq!(store.index_count("raw", 14.0).unwrap(), 1);
    assert_eq!(store.index_stats("raw").unwrap().keys, 3);
}

#[test]
fn index_stats_summarize_keys() {
    let store = indexed_store();
    store.create_index("val").unwrap();

    let stats = store.index_stats("val").unwrap();
    assert_eq!(stats.kind, IndexKind::BTree);
    assert_eq!(stats.keys, 3);
    assert_eq!(stats.entries, 4);
    assert_eq!(stats.min, Some(Value::from(13)));
    assert_eq!(stats.max, Some(Value::from(17)));

    let stats = store.index_stats("lastname").unwrap();
    assert_eq!(stats.keys, 2);
    assert_eq!(stats.min, None);
}

#[test]
fn unknown_fields_create_nothing() {
    let store = indexed_store();
    assert_eq!(
        store.create_index("age").unwrap_err(),
        StoreError::UnknownField { field: "age".into() }
    );
    assert_eq!(store.indexed_field_names(), ["firstname", "lastname"]);
    assert!(store.get_index_records("age", 3).is_err());

    let err = Store::new(StoreConfig::new().model(person_model()).index("age")).unwrap_err();
    assert!(matches!(err, StoreError::UnknownField { .. }));
}

#[test]
fn indexes_ignore_filters() {
    let store = indexed_store();
    store.add_filter(j_names());
    store.add_filter(doe_family());
    store.filter(None).unwrap();
    assert_eq!(store.size(), 3);

    store.remove(1);
    let johns = store.get_index_records("firstname", "John").unwrap();
    assert_eq!(johns.len(), 2);
    assert!(store.get_index_records("firstname", "Jill").unwrap().is_empty());
}

#[test]
fn writes_to_indexed_fields_rekey_eagerly() {
    let store = indexed_store();
    store.create_index("val").unwrap();
    let jill = store.get_record(1).unwrap();

    jill.set("lastname", "Dearborn").unwrap();
    assert_eq!(firstnames(&store.get_index_records("lastname", "Doe").unwrap()), ["John", "Jake"]);
    assert_eq!(
        firstnames(&store.get_index_records("lastname", "Dearborn").unwrap()),
        ["Jill", "John"]
    );

    jill.set("val", 14).unwrap();
    assert_eq!(store.index_count("val", 13).unwrap(), 0);
    assert_eq!(store.index_count("val", 14).unwrap(), 3);

    // Integral floats land on the same key
    jill.set("val", 17.0).unwrap();
    assert_eq!(store.index_count("val", 17).unwrap(), 2);
}

#[test]
fn writes_after_removal_do_not_touch_indexes() {
    let store = indexed_store();
    let jake = store.remove(2).unwrap();

    jake.set("lastname", "Doe").unwrap();
    jake.set("lastname", "Elsewhere").unwrap();
    assert!(store.get_index_records("lastname", "Elsewhere").unwrap().is_empty());
    assert_eq!(store.get_index_records("lastname", "Doe").unwrap().len(), 2);
}

#[test]
fn new_index_covers_existing_records() {
    let store = person_store();
    store.add_many(scenarios::mixed_family()).unwrap();
    store.remove(0);

    store.create_index("lastname").unwrap();
    assert_eq!(firstnames(&store.get_index_records("lastname", "Doe").unwrap()), ["Jane", "Bob"]);
}

#[test]
fn defaults_are_indexed() {
    let store = person_store();
    store.create_index("val").unwrap();
    store.add(person("Ann", "Lee")).unwrap();
    store.load(scenarios::numbered_people(10)).unwrap();

    assert_eq!(store.index_count("val", DEFAULT_VAL).unwrap(), 10);
}
