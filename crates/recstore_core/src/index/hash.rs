//! Hash index implementation.

use crate::index::traits::{
    insert_position, remap_positions, remove_position, Index, IndexKey, IndexKind, IndexSpec,
    Position,
};
use std::collections::HashMap;

/// Hash-based index for O(1) equality lookups.
///
/// `HashIndex` is optimized for exact-match queries. It stores a mapping
/// from key to the ascending list of manifest positions holding that key.
///
/// # Example
///
/// ```rust
/// use recstore_core::index::{HashIndex, Index};
///
/// let mut index: HashIndex<String> = HashIndex::new("lastname");
/// index.insert("Doe".to_string(), 0);
/// index.insert("Doe".to_string(), 2);
///
/// assert_eq!(index.lookup(&"Doe".to_string()), &[0, 2]);
/// ```
pub struct HashIndex<K: IndexKey> {
    /// Index specification.
    spec: IndexSpec,
    /// Key to positions mapping.
    entries: HashMap<K, Vec<Position>>,
    /// Total entry count.
    count: usize,
}

impl<K: IndexKey> HashIndex<K> {
    /// Creates a new hash index on `field`.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            spec: IndexSpec::new(field, IndexKind::Hash),
            entries: HashMap::new(),
            count: 0,
        }
    }

    /// Rebuilds the index from a set of key-position pairs.
    ///
    /// Feeding positions in ascending order keeps every insert an append,
    /// so a rebuild is linear in the number of pairs.
    pub fn rebuild<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, Position)>,
    {
        self.clear();
        for (key, position) in entries {
            self.insert(key, position);
        }
    }
}

impl<K: IndexKey> Index<K> for HashIndex<K> {
    fn spec(&self) -> &IndexSpec {
        &self.spec
    }

    fn insert(&mut self, key: K, position: Position) {
        if insert_position(self.entries.entry(key).or_default(), position) {
            self.count += 1;
        }
    }

    fn remove(&mut self, key: &K, position: Position) -> bool {
        if let Some(positions) = self.entries.get_mut(key) {
            if remove_position(positions, position) {
                self.count -= 1;
                if positions.is_empty() {
                    self.entries.remove(key);
                }
                return true;
            }
        }
        false
    }

    fn lookup(&self, key: &K) -> &[Position] {
        self.entries.get(key).map_or(&[], Vec::as_slice)
    }

    fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    fn key_count(&self) -> usize {
        self.entries.len()
    }

    fn len(&self) -> usize {
        self.count
    }

    fn remap(&mut self, remap: &[Option<Position>]) {
        for positions in self.entries.values_mut() {
            self.count -= remap_positions(positions, remap);
        }
        self.entries.retain(|_, positions| !positions.is_empty());
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_lookup() {
        let mut index = HashIndex::new("firstname");

        index.insert("John".to_string(), 0);

        assert_eq!(index.lookup(&"John".to_string()), &[0]);
        assert_eq!(index.spec().kind, IndexKind::Hash);
    }

    #[test]
    fn lookup_missing() {
        let index: HashIndex<String> = HashIndex::new("firstname");
        assert!(index.lookup(&"missing".to_string()).is_empty());
        assert_eq!(index.count(&"missing".to_string()), 0);
    }

    #[test]
    fn multiple_positions_same_key_in_order() {
        let mut index = HashIndex::new("lastname");

        index.insert("Doe".to_string(), 4);
        index.insert("Doe".to_string(), 1);
        index.insert("Doe".to_string(), 2);

        assert_eq!(index.lookup(&"Doe".to_string()), &[1, 2, 4]);
        assert_eq!(index.count(&"Doe".to_string()), 3);
        assert_eq!(index.key_count(), 1);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn duplicate_insert_counts_once() {
        let mut index = HashIndex::new("lastname");
        index.insert("Doe".to_string(), 1);
        index.insert("Doe".to_string(), 1);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn remove_entry() {
        let mut index = HashIndex::new("lastname");

        index.insert("Doe".to_string(), 0);
        assert!(index.contains(&"Doe".to_string()));

        assert!(index.remove(&"Doe".to_string(), 0));
        assert!(!index.contains(&"Doe".to_string()));
        assert!(!index.remove(&"Doe".to_string(), 0));
        assert!(index.is_empty());
    }

    #[test]
    fn remove_one_of_many() {
        let mut index = HashIndex::new("lastname");

        index.insert("Doe".to_string(), 0);
        index.insert("Doe".to_string(), 1);

        index.remove(&"Doe".to_string(), 0);

        assert_eq!(index.lookup(&"Doe".to_string()), &[1]);
    }

    #[test]
    fn remap_after_compaction() {
        let mut index = HashIndex::new("lastname");
        index.insert("Doe".to_string(), 0);
        index.insert("Doe".to_string(), 3);
        index.insert("Swanson".to_string(), 2);

        // Slot 1 was a tombstone: 0->0, 2->1, 3->2
        index.remap(&[Some(0), None, Some(1), Some(2)]);

        assert_eq!(index.lookup(&"Doe".to_string()), &[0, 2]);
        assert_eq!(index.lookup(&"Swanson".to_string()), &[1]);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn rebuild_index() {
        let mut index = HashIndex::new("firstname");
        index.insert("old".to_string(), 7);

        index.rebuild(vec![
            ("a".to_string(), 0),
            ("b".to_string(), 1),
            ("a".to_string(), 2),
        ]);

        assert_eq!(index.len(), 3);
        assert!(!index.contains(&"old".to_string()));
        assert_eq!(index.lookup(&"a".to_string()), &[0, 2]);
    }

    #[test]
    fn i64_key() {
        let mut index = HashIndex::new("val");
        index.insert(42_i64, 0);
        assert_eq!(index.lookup(&42).len(), 1);
    }
}
