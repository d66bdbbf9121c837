//! Index traits and key types.

use std::hash::Hash;

/// A manifest position.
pub type Position = usize;

/// A key that can be indexed.
///
/// Index keys must be:
/// - Hashable (for HashIndex)
/// - Orderable (for BTreeIndex)
pub trait IndexKey: Clone + Eq + Hash + Ord + Send + Sync + 'static {}

impl<T> IndexKey for T where T: Clone + Eq + Hash + Ord + Send + Sync + 'static {}

/// Which index structure backs a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    /// Hash map, O(1) exact-match lookups.
    Hash,
    /// Ordered map, O(log n) lookups plus ordered and range scans.
    BTree,
}

/// Specification for an index on a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    /// Indexed field name.
    pub field: String,
    /// Backing structure.
    pub kind: IndexKind,
}

impl IndexSpec {
    /// Creates a new index specification.
    pub fn new(field: impl Into<String>, kind: IndexKind) -> Self {
        Self {
            field: field.into(),
            kind,
        }
    }
}

/// Core index trait.
///
/// An index maps keys to the manifest positions holding them. Positions for
/// a key are kept in ascending order so lookups come back in manifest order.
pub trait Index<K: IndexKey>: Send + Sync {
    /// Returns the index specification.
    fn spec(&self) -> &IndexSpec;

    /// Inserts a key-position mapping.
    fn insert(&mut self, key: K, position: Position);

    /// Removes a key-position mapping.
    ///
    /// Returns false if the mapping did not exist.
    fn remove(&mut self, key: &K, position: Position) -> bool;

    /// Returns the positions holding `key`, ascending.
    fn lookup(&self, key: &K) -> &[Position];

    /// Returns the number of positions holding `key`.
    fn count(&self, key: &K) -> usize {
        self.lookup(key).len()
    }

    /// Checks if the index contains a key.
    fn contains(&self, key: &K) -> bool;

    /// Returns the number of distinct keys.
    fn key_count(&self) -> usize;

    /// Returns the number of key-position entries.
    fn len(&self) -> usize;

    /// Returns true if the index is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rewrites every stored position through `remap`.
    ///
    /// `remap[old]` is the new position. The mapping must preserve order
    /// among the positions still referenced; entries mapped to `None` are
    /// dropped.
    fn remap(&mut self, remap: &[Option<Position>]);

    /// Clears the index.
    fn clear(&mut self);
}

/// Inserts into a sorted position list.
///
/// Appends are the common case (new records land at the end of the
/// manifest) and skip the search.
pub(crate) fn insert_position(positions: &mut Vec<Position>, position: Position) -> bool {
    match positions.last() {
        None => {
            positions.push(position);
            true
        }
        Some(&last) if last < position => {
            positions.push(position);
            true
        }
        _ => match positions.binary_search(&position) {
            Ok(_) => false,
            Err(at) => {
                positions.insert(at, position);
                true
            }
        },
    }
}

/// Removes from a sorted position list.
pub(crate) fn remove_position(positions: &mut Vec<Position>, position: Position) -> bool {
    match positions.binary_search(&position) {
        Ok(at) => {
            positions.remove(at);
            true
        }
        Err(_) => false,
    }
}

/// Rewrites a sorted position list, dropping unmapped entries.
///
/// Returns the number of dropped entries.
pub(crate) fn remap_positions(positions: &mut Vec<Position>, remap: &[Option<Position>]) -> usize {
    let before = positions.len();
    positions.retain_mut(|p| match remap.get(*p).copied().flatten() {
        Some(new) => {
            *p = new;
            true
        }
        None => false,
    });
    before - positions.len()
}
