//! Error types for the record store.
//!
//! Structural problems (a store without a model, an index on a field the
//! model never declared) are reported as errors. Lookup misses are not: a
//! position or record the store does not hold yields `None`.

use crate::model::FieldType;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for model and record operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while building models or writing record fields.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// The field is not declared by the model.
    #[error("unknown field: {field}")]
    UnknownField {
        /// Name of the field.
        field: String,
    },

    /// The same field was declared twice.
    #[error("duplicate field: {field}")]
    DuplicateField {
        /// Name of the field.
        field: String,
    },

    /// A value does not fit the declared field type.
    #[error("type mismatch on field {field}: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Name of the field.
        field: String,
        /// Declared type.
        expected: FieldType,
        /// Type name of the rejected value.
        actual: &'static str,
    },

    /// Input data could not be turned into field values.
    #[error("invalid data: {message}")]
    InvalidData {
        /// Description of the problem.
        message: String,
    },
}

impl ModelError {
    /// Creates an unknown field error.
    pub fn unknown_field(field: impl Into<String>) -> Self {
        Self::UnknownField {
            field: field.into(),
        }
    }

    /// Creates an invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }
}

/// Errors that can occur in store operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// The store configuration is missing or invalid.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the problem.
        message: String,
    },

    /// An index or lookup referenced a field the model does not declare.
    #[error("unknown field: {field}")]
    UnknownField {
        /// Name of the field.
        field: String,
    },

    /// A lookup referenced a declared field that has no index.
    #[error("field is not indexed: {field}")]
    NotIndexed {
        /// Name of the field.
        field: String,
    },

    /// A range lookup was issued against a hash index.
    #[error("index on field {field} does not support ordered lookups")]
    NotOrdered {
        /// Name of the field.
        field: String,
    },

    /// A filter operation named a filter that is not registered.
    #[error("unknown filter: {name}")]
    UnknownFilter {
        /// Name of the filter.
        name: String,
    },

    /// A record built from a different model was handed to the store.
    #[error("record model {actual} does not match store model {expected}")]
    ModelMismatch {
        /// Name of the store's model.
        expected: String,
        /// Name of the record's model.
        actual: String,
    },

    /// Building a record from raw data failed.
    #[error("model error: {0}")]
    Model(#[from] ModelError),
}

impl StoreError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an unknown field error.
    pub fn unknown_field(field: impl Into<String>) -> Self {
        Self::UnknownField {
            field: field.into(),
        }
    }

    /// Creates a not indexed error.
    pub fn not_indexed(field: impl Into<String>) -> Self {
        Self::NotIndexed {
            field: field.into(),
        }
    }

    /// Creates an unknown filter error.
    pub fn unknown_filter(name: impl Into<String>) -> Self {
        Self::UnknownFilter { name: name.into() }
    }
}
