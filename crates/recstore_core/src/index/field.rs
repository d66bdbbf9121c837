//! Field indexes over record values.

use crate::index::btree::BTreeIndex;
use crate::index::hash::HashIndex;
use crate::index::traits::{Index, IndexKind, Position};
use crate::value::Value;

/// Summary of an index's contents.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexStats {
    /// Indexed field name.
    pub field: String,
    /// Backing structure.
    pub kind: IndexKind,
    /// Number of distinct keys.
    pub keys: usize,
    /// Number of key-position entries.
    pub entries: usize,
    /// Smallest key (BTree indexes only).
    pub min: Option<Value>,
    /// Largest key (BTree indexes only).
    pub max: Option<Value>,
}

/// An index on one record field, backed by either structure.
///
/// Both variants answer the same [`Index`] contract; the BTree variant adds
/// ordered lookups through [`as_btree`](Self::as_btree).
pub enum FieldIndex {
    /// Hash-backed index.
    Hash(HashIndex<Value>),
    /// BTree-backed index.
    BTree(BTreeIndex<Value>),
}

impl FieldIndex {
    /// Creates an empty index of the given kind.
    pub fn new(field: impl Into<String>, kind: IndexKind) -> Self {
        match kind {
            IndexKind::Hash => FieldIndex::Hash(HashIndex::new(field)),
            IndexKind::BTree => FieldIndex::BTree(BTreeIndex::new(field)),
        }
    }

    /// Returns the indexed field name.
    pub fn field(&self) -> &str {
        &self.as_index().spec().field
    }

    /// Returns the backing structure.
    pub fn kind(&self) -> IndexKind {
        self.as_index().spec().kind
    }

    /// Returns the shared index contract.
    pub fn as_index(&self) -> &dyn Index<Value> {
        match self {
            FieldIndex::Hash(index) => index,
            FieldIndex::BTree(index) => index,
        }
    }

    /// Returns the shared index contract, mutably.
    pub fn as_index_mut(&mut self) -> &mut dyn Index<Value> {
        match self {
            FieldIndex::Hash(index) => index,
            FieldIndex::BTree(index) => index,
        }
    }

    /// Returns the BTree variant, if this is one.
    pub fn as_btree(&self) -> Option<&BTreeIndex<Value>> {
        match self {
            FieldIndex::BTree(index) => Some(index),
            FieldIndex::Hash(_) => None,
        }
    }

    /// Replaces the contents with the given key-position pairs.
    pub fn rebuild<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (Value, Position)>,
    {
        match self {
            FieldIndex::Hash(index) => index.rebuild(entries),
            FieldIndex::BTree(index) => index.rebuild(entries),
        }
    }

    /// Summarizes the index.
    pub fn stats(&self) -> IndexStats {
        let index = self.as_index();
        let btree = self.as_btree();
        IndexStats {
            field: index.spec().field.clone(),
            kind: index.spec().kind,
            keys: index.key_count(),
            entries: index.len(),
            min: btree.and_then(|b| b.min_key().cloned()),
            max: btree.and_then(|b| b.max_key().cloned()),
        }
    }
}
