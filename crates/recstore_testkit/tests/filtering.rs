//! Filter registration, composition and membership tracking.

use recstore_core::{Filter, FilterStatus, StoreError};
use recstore_testkit::prelude::*;

#[test]
fn filter_lifecycle() {
    let (store, _) = scenarios::populated_store(scenarios::mixed_family());
    store.add_filter(doe_family());
    store.add_filter(j_names());

    assert_eq!(store.filters().len(), 2);
    assert_eq!(store.size(), 4, "filters are not applied on registration");

    store.filter(None).unwrap();
    assert_eq!(store.size(), 2, "all filters reduce the active set");

    store.clear_filter();
    assert_eq!(store.size(), 4, "clearing filters restores every record");

    store.filter(None).unwrap();
    store.disable_filter("j_names").unwrap();
    assert_eq!(store.size(), 3, "disabling a filter restores what it excluded");

    store.clear_filter();
    store.filter(Some("j_names")).unwrap();
    assert_eq!(store.size(), 3, "a single filter applies alone");

    store.filter(Some("j_names")).unwrap();
    assert_eq!(store.size(), 3, "applying a filter twice changes nothing");

    store.filter(Some("doe_family")).unwrap();
    assert_eq!(store.size(), 2, "additional filters intersect");

    assert!(store.remove_filter(Some("j_names")));
    assert_eq!(store.filters().len(), 1);
    assert_eq!(store.size(), 3, "removing a filter restores records");

    assert!(store.remove_filter(None));
    assert!(store.filters().is_empty());
    assert_eq!(store.size(), 4, "removing all filters restores records");
}

#[test]
fn clear_then_filter_matches_fresh_application() {
    let (fresh, _) = scenarios::populated_store(scenarios::mixed_family());
    fresh.add_filter(doe_family());
    fresh.add_filter(j_names());
    fresh.filter(None).unwrap();

    let (reapplied, _) = scenarios::populated_store(scenarios::mixed_family());
    reapplied.add_filter(doe_family());
    reapplied.add_filter(j_names());
    reapplied.filter(Some("j_names")).unwrap();
    reapplied.clear_filter();
    reapplied.filter(None).unwrap();

    assert_eq!(firstnames(&fresh.records()), firstnames(&reapplied.records()));
    assert_eq!(firstnames(&fresh.records()), ["John", "Jane"]);
}

#[test]
fn filters_report_status() {
    let store = person_store();
    store.add_filter(doe_family());
    store.add_filter(j_names());
    store.filter(Some("j_names")).unwrap();

    assert_eq!(
        store.filters(),
        [
            FilterStatus {
                name: "doe_family".into(),
                enabled: false,
            },
            FilterStatus {
                name: "j_names".into(),
                enabled: true,
            },
        ]
    );
}

#[test]
fn unknown_filter_names_are_reported() {
    let store = person_store();
    assert_eq!(
        store.filter(Some("missing")).unwrap_err(),
        StoreError::UnknownFilter {
            name: "missing".into()
        }
    );
    assert!(store.disable_filter("missing").is_err());
    assert!(!store.remove_filter(Some("missing")));
}

#[test]
fn replacing_a_filter_disables_it() {
    let (store, _) = scenarios::populated_store(scenarios::mixed_family());
    store.add_filter(j_names());
    store.filter(None).unwrap();
    assert_eq!(store.size(), 3);

    store.add_filter(Filter::new("j_names", |_| false));
    assert_eq!(store.filters().len(), 1);
    assert_eq!(store.size(), 4);

    store.filter(Some("j_names")).unwrap();
    assert_eq!(store.size(), 0);
}

#[test]
fn added_records_respect_enabled_filters() {
    let (store, _) = scenarios::populated_store(scenarios::mixed_family());
    store.add_filter(doe_family());
    store.filter(None).unwrap();

    let outsider = store.add(person("Jill", "Swanson")).unwrap();
    assert_eq!(store.size(), 3);
    assert_eq!(store.length(), 5);
    assert!(store.contains(&outsider));
    assert!(!store.is_active(&outsider));
    assert_eq!(store.last().map(|r| firstname(&r)), Some("Bob".to_string()));
}

#[test]
fn field_writes_update_filter_membership() {
    let (store, added) = scenarios::populated_store(scenarios::mixed_family());
    store.add_filter(doe_family());
    store.filter(None).unwrap();
    assert_eq!(store.size(), 3);

    let jack = &added[3];
    jack.set("lastname", "Doe").unwrap();
    assert_eq!(store.size(), 4);
    assert!(store.is_active(jack));
    assert_eq!(store.last().unwrap(), *jack);

    added[0].set("lastname", "Smith").unwrap();
    assert_eq!(store.size(), 3);
    assert_eq!(firstname(&store.first().unwrap()), "Jane");
}

#[test]
fn removed_records_leave_the_filtered_view() {
    let (store, added) = scenarios::populated_store(scenarios::mixed_family());
    store.add_filter(j_names());
    store.filter(None).unwrap();

    store.remove(&added[1]);
    assert_eq!(firstnames(&store.records()), ["John", "Jack"]);

    store.clear_filter();
    assert_eq!(firstnames(&store.records()), ["John", "Bob", "Jack"]);
}
