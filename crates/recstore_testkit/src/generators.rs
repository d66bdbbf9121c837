//! Property-based test generators using proptest.
//!
//! Provides strategies for generating person data and store operation
//! sequences.

use crate::fixtures::person_with_val;
use proptest::prelude::*;
use recstore_core::Data;

/// Strategy for first names. Roughly half start with 'J'.
pub fn firstname_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[JB][a-z]{1,6}").expect("Invalid regex")
}

/// Strategy for last names drawn from a small pool, so index keys repeat.
pub fn lastname_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["Doe", "Smith", "Swanson", "Nguyen"]).prop_map(str::to_string)
}

/// Strategy for `val` drawn from a small range, so index keys repeat.
pub fn val_strategy() -> impl Strategy<Value = i64> {
    -5i64..20
}

/// Strategy for one person record.
pub fn person_strategy() -> impl Strategy<Value = Data> {
    (firstname_strategy(), lastname_strategy(), val_strategy())
        .prop_map(|(first, last, val)| person_with_val(&first, &last, val))
}

/// Strategy for a batch of people.
pub fn people_strategy(max: usize) -> impl Strategy<Value = Vec<Data>> {
    prop::collection::vec(person_strategy(), 1..max)
}

/// A single store mutation.
#[derive(Debug, Clone)]
pub enum StoreOp {
    /// Add a person.
    Add(Data),
    /// Remove the record at a position (possibly invalid).
    Remove(usize),
    /// Write `val` on the record at a position.
    SetVal(usize, i64),
    /// Compact the store.
    Compact,
}

/// Strategy for one store operation.
pub fn store_op_strategy() -> impl Strategy<Value = StoreOp> {
    prop_oneof![
        4 => person_strategy().prop_map(StoreOp::Add),
        2 => (0usize..64).prop_map(StoreOp::Remove),
        2 => (0usize..64, val_strategy()).prop_map(|(p, v)| StoreOp::SetVal(p, v)),
        1 => Just(StoreOp::Compact),
    ]
}

/// Strategy for a sequence of store operations.
pub fn store_ops_strategy(max: usize) -> impl Strategy<Value = Vec<StoreOp>> {
    prop::collection::vec(store_op_strategy(), 1..max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::strategy::ValueTree;
    use proptest::test_runner::TestRunner;

    #[test]
    fn generated_people_fit_the_model() {
        let model = crate::fixtures::person_model();
        let mut runner = TestRunner::default();
        for _ in 0..50 {
            let data = person_strategy().new_tree(&mut runner).unwrap().current();
            assert!(model.create(data).is_ok());
        }
    }

    proptest! {
        #[test]
        fn firstnames_are_not_empty(name in firstname_strategy()) {
            prop_assert!(name.len() >= 2);
        }
    }
}
