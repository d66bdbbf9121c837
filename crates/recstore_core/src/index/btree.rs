//! BTree index implementation.

use crate::index::traits::{
    insert_position, remap_positions, remove_position, Index, IndexKey, IndexKind, IndexSpec,
    Position,
};
use std::collections::BTreeMap;
use std::ops::RangeBounds;

/// BTree-based index for ordered traversal and range queries.
///
/// `BTreeIndex` supports:
/// - Equality lookups and per-key counts
/// - Range queries over any `RangeBounds`
/// - Minimum and maximum keys
///
/// Keys sharing a value aggregate their positions under one entry.
///
/// # Example
///
/// ```rust
/// use recstore_core::index::{BTreeIndex, Index};
///
/// let mut index: BTreeIndex<i64> = BTreeIndex::new("val");
/// for (position, val) in [17, 13, 14, 14].into_iter().enumerate() {
///     index.insert(val, position);
/// }
///
/// assert_eq!(index.count(&14), 2);
/// assert_eq!(index.min_key(), Some(&13));
/// assert_eq!(index.range(14..), vec![2, 3, 0]);
/// ```
pub struct BTreeIndex<K: IndexKey> {
    /// Index specification.
    spec: IndexSpec,
    /// Ordered key to positions mapping.
    entries: BTreeMap<K, Vec<Position>>,
    /// Total entry count.
    count: usize,
}

impl<K: IndexKey> BTreeIndex<K> {
    /// Creates a new BTree index on `field`.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            spec: IndexSpec::new(field, IndexKind::BTree),
            entries: BTreeMap::new(),
            count: 0,
        }
    }

    /// Returns positions with keys in the given range.
    ///
    /// Positions come back grouped by ascending key; within a key they are
    /// in manifest order.
    pub fn range<R>(&self, range: R) -> Vec<Position>
    where
        R: RangeBounds<K>,
    {
        let mut result = Vec::new();
        for positions in self.entries.range(range).map(|(_, p)| p) {
            result.extend_from_slice(positions);
        }
        result
    }

    /// Returns the minimum key.
    pub fn min_key(&self) -> Option<&K> {
        self.entries.keys().next()
    }

    /// Returns the maximum key.
    pub fn max_key(&self) -> Option<&K> {
        self.entries.keys().next_back()
    }

    /// Rebuilds the index from a set of key-position pairs.
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

impl<K: IndexKey> Index<K> for BTreeIndex<K> {
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
