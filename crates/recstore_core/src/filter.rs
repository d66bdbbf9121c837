//! Named record filters.
//!
//! A store's active set is the intersection of every enabled filter. The
//! store re-runs predicates over the manifest whenever the enabled set
//! changes; predicate results are never cached, so a filter always sees
//! current field values.

use crate::record::Record;
use std::fmt;
use std::sync::Arc;

type Predicate = dyn Fn(&Record) -> bool + Send + Sync;

/// A named predicate over records.
///
/// Predicates run while the store updates its active set and must not call
/// back into the store. Reading record fields is fine.
///
/// # Example
///
/// ```rust
/// use recstore_core::Filter;
///
/// let doe_family = Filter::new("doe_family", |record| {
///     record.get("lastname").is_some_and(|v| v == "Doe")
/// });
/// assert_eq!(doe_family.name(), "doe_family");
/// ```
#[derive(Clone)]
pub struct Filter {
    name: String,
    predicate: Arc<Predicate>,
}

impl Filter {
    /// Creates a filter.
    pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Record) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// Returns the filter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Evaluates the predicate.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        (self.predicate)(record)
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter").field("name", &self.name).finish()
    }
}

/// Registration state of one filter, as reported by
/// [`Store::filters`](crate::Store::filters).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterStatus {
    /// Filter name.
    pub name: String,
    /// Whether the filter currently constrains the active set.
    pub enabled: bool,
}

#[derive(Debug)]
struct FilterEntry {
    filter: Filter,
    enabled: bool,
}

/// The filters registered on a store, in registration order.
#[derive(Debug, Default)]
pub(crate) struct FilterSet {
    entries: Vec<FilterEntry>,
}

impl FilterSet {
    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.filter.name == name)
    }

    /// Registers a filter, disabled.
    ///
    /// A filter with the same name is replaced. Returns the replaced
    /// filter's enabled flag, if there was one.
    pub(crate) fn register(&mut self, filter: Filter) -> Option<bool> {
        let entry = FilterEntry {
            filter,
            enabled: false,
        };
        match self.position(entry.filter.name()) {
            Some(at) => Some(std::mem::replace(&mut self.entries[at], entry).enabled),
            None => {
                self.entries.push(entry);
                None
            }
        }
    }

    /// Deregisters a filter. Returns its enabled flag, if it existed.
    pub(crate) fn deregister(&mut self, name: &str) -> Option<bool> {
        self.position(name).map(|at| self.entries.remove(at).enabled)
    }

    /// Deregisters every filter. Returns true if any was enabled.
    pub(crate) fn deregister_all(&mut self) -> bool {
        let any_enabled = self.has_enabled();
        self.entries.clear();
        any_enabled
    }

    /// Sets a filter's enabled flag.
    ///
    /// Returns `None` for unknown names, otherwise whether the flag changed.
    pub(crate) fn set_enabled(&mut self, name: &str, enabled: bool) -> Option<bool> {
        let at = self.position(name)?;
        let entry = &mut self.entries[at];
        let changed = entry.enabled != enabled;
        entry.enabled = enabled;
        Some(changed)
    }

    /// Sets every filter's enabled flag. Returns true if any flag changed.
    pub(crate) fn set_all_enabled(&mut self, enabled: bool) -> bool {
        let mut changed = false;
        for entry in &mut self.entries {
            changed |= entry.enabled != enabled;
            entry.enabled = enabled;
        }
        changed
    }

    pub(crate) fn has_enabled(&self) -> bool {
        self.entries.iter().any(|e| e.enabled)
    }

    /// Returns true if the record passes every enabled filter.
    pub(crate) fn accepts(&self, record: &Record) -> bool {
        self.entries
            .iter()
            .filter(|e| e.enabled)
            .all(|e| e.filter.matches(record))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn status(&self) -> Vec<FilterStatus> {
        self.entries
            .iter()
            .map(|e| FilterStatus {
                name: e.filter.name.clone(),
                enabled: e.enabled,
            })
            .collect()
    }
}
