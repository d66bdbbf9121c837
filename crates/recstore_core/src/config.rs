//! Store configuration.

use crate::index::IndexKind;
use crate::model::Model;

/// Name given to stores configured without one.
pub const DEFAULT_STORE_NAME: &str = "Untitled Data Store";

/// Configuration for creating a store.
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// Store name. Defaults to [`DEFAULT_STORE_NAME`].
    pub name: Option<String>,

    /// Model used to build records. Required.
    pub model: Option<Model>,

    /// Fields indexed at construction, in order. `None` picks the kind from
    /// the field type.
    pub indexes: Vec<(String, Option<IndexKind>)>,
}

impl StoreConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the store name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the record model.
    #[must_use]
    pub fn model(mut self, model: Model) -> Self {
        self.model = Some(model);
        self
    }

    /// Indexes a field, choosing the structure from its declared type.
    #[must_use]
    pub fn index(mut self, field: impl Into<String>) -> Self {
        self.indexes.push((field.into(), None));
        self
    }

    /// Indexes a field with a BTree regardless of its type.
    #[must_use]
    pub fn btree_index(mut self, field: impl Into<String>) -> Self {
        self.indexes.push((field.into(), Some(IndexKind::BTree)));
        self
    }

    /// Returns the configured name or the default.
    #[must_use]
    pub fn resolved_name(&self) -> &str {
        self.name.as_deref().unwrap_or(DEFAULT_STORE_NAME)
    }
}
