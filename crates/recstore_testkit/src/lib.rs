//! # RecStore Testkit
//!
//! Test utilities for RecStore.
//!
//! This crate provides:
//! - The `person` model and store fixtures
//! - Property-based test generators using proptest
//! - Stress helpers for bulk and concurrent access
//!
//! ## Usage
//!
//! ```rust
//! use recstore_testkit::prelude::*;
//!
//! let (store, added) = scenarios::populated_store(scenarios::doe_siblings());
//! assert_eq!(store.size(), 3);
//! assert_eq!(firstname(&added[0]), "John");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use stress::*;
