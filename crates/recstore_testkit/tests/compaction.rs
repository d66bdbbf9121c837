//! Tombstone reclamation and renumbering.

use recstore_core::{CompactionResult, Record};
use recstore_testkit::prelude::*;
use serde_json::json;

#[test]
fn compaction_drops_a_removed_middle_slice() {
    let store = person_store();
    let mut short_lived = Vec::new();
    for x in 0..220 {
        let record = store.add(json!({"firstname": x.to_string()})).unwrap();
        if (40..150).contains(&x) {
            short_lived.push(record);
        }
    }

    let removed = store.remove_many(&short_lived);
    assert!(removed.iter().all(Option::is_some));
    assert_eq!(store.length(), 220);
    assert_eq!(store.size(), 110);

    let result = store.compact();
    assert_eq!(
        result,
        CompactionResult {
            slots_before: 220,
            slots_after: 110,
            tombstones_removed: 110,
        }
    );
    assert_eq!(store.size(), store.length());
    assert_eq!(store.length(), 110);

    store.for_each(|record| {
        let val: i64 = firstname(record).parse().unwrap();
        assert!(!(40..150).contains(&val), "removed record {val} reappeared");
    });
    assert!(short_lived.iter().all(|r| !store.contains(r)));
}

#[test]
fn compaction_renumbers_and_keeps_order() {
    let (store, added) = scenarios::populated_store(scenarios::numbered_people(6));
    store.remove_many([0, 2, 3]);

    store.compact();
    let survivors: Vec<&Record> = [1, 4, 5].iter().map(|&i| &added[i]).collect();
    for (position, record) in survivors.iter().enumerate() {
        assert_eq!(store.index_of(record), Some(position));
        assert_eq!(store.get_record(position).as_ref(), Some(*record));
    }
    assert_eq!(added[1].next(), Some(added[4].clone()));
    assert_eq!(added[5].next_cycle(), Some(added[1].clone()));
}

#[test]
fn index_lookups_survive_compaction() {
    let store = person_store();
    store.create_index("val").unwrap();
    store.create_index("lastname").unwrap();
    let added = store
        .add_many((0..30).map(|i| {
            let parity = if i % 2 == 0 { "Even" } else { "Odd" };
            person_with_val(&format!("P{i}"), parity, i % 5)
        }))
        .unwrap();
    let removed: Vec<&Record> = added.iter().step_by(3).collect();
    store.remove_many(removed.iter().copied());

    let before: Vec<Vec<String>> = (0..5)
        .map(|v| firstnames(&store.get_index_records("val", v).unwrap()))
        .collect();
    let evens_before = firstnames(&store.get_index_records("lastname", "Even").unwrap());

    store.compact();

    let after: Vec<Vec<String>> = (0..5)
        .map(|v| firstnames(&store.get_index_records("val", v).unwrap()))
        .collect();
    assert_eq!(before, after);
    assert_eq!(
        evens_before,
        firstnames(&store.get_index_records("lastname", "Even").unwrap())
    );
    assert_eq!(store.index_stats("val").unwrap().entries, store.length());
}

#[test]
fn compaction_with_filters_keeps_filtered_records() {
    let (store, _) = scenarios::populated_store(scenarios::mixed_family());
    store.add_filter(doe_family());
    store.filter(None).unwrap();
    store.remove(0);

    let result = store.compact();
    assert_eq!(result.tombstones_removed, 1);
    assert_eq!(store.length(), 3);
    assert_eq!(store.size(), 2);
    assert_eq!(firstnames(&store.records()), ["Jane", "Bob"]);

    store.clear_filter();
    assert_eq!(store.size(), 3);
}

#[test]
fn compacting_a_dense_store_is_a_no_op() {
    let (store, added) = scenarios::populated_store(scenarios::doe_siblings());
    let result = store.compact();
    assert_eq!(result.tombstones_removed, 0);
    assert_eq!(store.index_of(&added[2]), Some(2));
}
