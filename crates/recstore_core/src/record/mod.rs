//! Records and record identity.
//!
//! A [`Record`] is a shared handle: clones point at the same entity, and a
//! store holds the same handle the caller does. Field writes made through
//! any handle are visible through all of them, and the owning store is told
//! about each write so its indexes and filtered view stay current.

mod id;

pub use id::Oid;

use crate::error::{ModelError, ModelResult};
use crate::model::Model;
use crate::store::{Direction, Store, StoreShared};
use crate::value::{data_to_json, Data, Value};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::{Arc, Weak};

struct RecordInner {
    oid: Oid,
    model: Model,
    /// One slot per model field; `None` means unset (default applies).
    values: RwLock<Vec<Option<Value>>>,
    owner: Mutex<Weak<StoreShared>>,
}

/// A validated entity.
///
/// Records are built by a [`Model`] and usually live in a [`Store`]. While
/// a record is held by a store it can navigate the store's active set with
/// [`next`](Self::next) and [`previous`](Self::previous), and
/// [`destroy`](Self::destroy) removes it from the store.
#[derive(Clone)]
pub struct Record {
    inner: Arc<RecordInner>,
}

impl Record {
    pub(crate) fn from_parts(model: Model, values: Vec<Option<Value>>) -> Self {
        Self {
            inner: Arc::new(RecordInner {
                oid: Oid::new(),
                model,
                values: RwLock::new(values),
                owner: Mutex::new(Weak::new()),
            }),
        }
    }

    /// Returns the record's permanent identity.
    #[must_use]
    pub fn oid(&self) -> Oid {
        self.inner.oid
    }

    /// Returns the model that built this record.
    #[must_use]
    pub fn model(&self) -> &Model {
        &self.inner.model
    }

    /// Returns the current value of a field, or its default when unset.
    ///
    /// Returns `None` if the model does not declare `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<Value> {
        self.inner.model.slot(field).map(|slot| self.value_at(slot))
    }

    pub(crate) fn value_at(&self, slot: usize) -> Value {
        match &self.inner.values.read()[slot] {
            Some(value) => value.clone(),
            None => self.inner.model.field_at(slot).default.clone(),
        }
    }

    /// Returns true if the field holds an explicit value.
    #[must_use]
    pub fn is_set(&self, field: &str) -> bool {
        self.inner
            .model
            .slot(field)
            .is_some_and(|slot| self.inner.values.read()[slot].is_some())
    }

    /// Writes a field and returns its previous value.
    ///
    /// If the record is held by a store, the store re-keys any index on the
    /// field and re-evaluates the record against enabled filters before this
    /// call returns.
    ///
    /// # Errors
    ///
    /// Fails if the field is not declared or the value does not fit its type.
    pub fn set(&self, field: &str, value: impl Into<Value>) -> ModelResult<Value> {
        let slot = self
            .inner
            .model
            .slot(field)
            .ok_or_else(|| ModelError::unknown_field(field))?;
        let value = self
            .inner
            .model
            .field_at(slot)
            .field_type
            .coerce(field, value.into())?;

        // Retry if the record moves between stores mid-write
        loop {
            match self.owner() {
                None => return Ok(self.replace_value(slot, value)),
                Some(shared) => {
                    if let Some(previous) = shared.write_field(self, slot, &value) {
                        return Ok(previous);
                    }
                }
            }
        }
    }

    /// Stores a slot value and returns the previous resolved value.
    pub(crate) fn replace_value(&self, slot: usize, value: Value) -> Value {
        let previous = self.inner.values.write()[slot].replace(value);
        previous.unwrap_or_else(|| self.inner.model.field_at(slot).default.clone())
    }

    /// Returns every field with defaults applied.
    #[must_use]
    pub fn data(&self) -> Data {
        let values = self.inner.values.read();
        self.inner
            .model
            .fields()
            .iter()
            .zip(values.iter())
            .map(|(def, value)| {
                let value = value.clone().unwrap_or_else(|| def.default.clone());
                (def.name.clone(), value)
            })
            .collect()
    }

    /// Renders [`data`](Self::data) as a JSON object.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        data_to_json(&self.data())
    }

    /// Returns the store currently holding this record.
    #[must_use]
    pub fn store(&self) -> Option<Store> {
        self.owner().map(Store::from_shared)
    }

    /// Removes the record from the store holding it.
    ///
    /// Returns false if no store holds the record.
    pub fn destroy(&self) -> bool {
        match self.store() {
            Some(store) => store.remove(self).is_some(),
            None => false,
        }
    }

    /// Returns the next record in the store's active set.
    #[must_use]
    pub fn next(&self) -> Option<Record> {
        self.next_by(1, false)
    }

    /// Returns the previous record in the store's active set.
    #[must_use]
    pub fn previous(&self) -> Option<Record> {
        self.previous_by(1, false)
    }

    /// Returns the next record, wrapping from the last to the first.
    #[must_use]
    pub fn next_cycle(&self) -> Option<Record> {
        self.next_by(1, true)
    }

    /// Returns the previous record, wrapping from the first to the last.
    #[must_use]
    pub fn previous_cycle(&self) -> Option<Record> {
        self.previous_by(1, true)
    }

    /// Steps `steps` records forward through the store's active set.
    ///
    /// Without `cycle`, stepping past the last record yields `None`. With
    /// `cycle`, the walk wraps around as many times as needed, so
    /// `next_by(size, true)` returns the record itself.
    #[must_use]
    pub fn next_by(&self, steps: usize, cycle: bool) -> Option<Record> {
        self.owner()?
            .navigate(self, Direction::Forward, steps, cycle)
    }

    /// Steps `steps` records backward through the store's active set.
    ///
    /// See [`next_by`](Self::next_by) for the cycling rules.
    #[must_use]
    pub fn previous_by(&self, steps: usize, cycle: bool) -> Option<Record> {
        self.owner()?
            .navigate(self, Direction::Backward, steps, cycle)
    }

    /// Returns true if both handles refer to the same record.
    #[must_use]
    pub fn ptr_eq(&self, other: &Record) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn owner(&self) -> Option<Arc<StoreShared>> {
        self.inner.owner.lock().upgrade()
    }

    pub(crate) fn is_owned_by(&self, shared: &Arc<StoreShared>) -> bool {
        self.inner.owner.lock().as_ptr() == Arc::as_ptr(shared)
    }

    pub(crate) fn attach(&self, shared: Weak<StoreShared>) {
        *self.inner.owner.lock() = shared;
    }

    pub(crate) fn detach(&self) {
        *self.inner.owner.lock() = Weak::new();
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Record {}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("oid", &self.inner.oid)
            .field("model", &self.inner.model.name())
            .field("data", &self.data())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldType;
    use serde_json::json;

    fn model() -> Model {
        Model::builder("person")
            .field("firstname", FieldType::Text)
            .field_with_default("val", FieldType::Integer, 15)
            .build()
            .unwrap()
    }

    #[test]
    fn clones_share_state() {
        let record = model().create_json(json!({"firstname": "John"})).unwrap();
        let alias = record.clone();

        alias.set("firstname", "Jill").unwrap();

        assert_eq!(record.get("firstname").unwrap(), "Jill");
        assert_eq!(record, alias);
        assert_eq!(record.oid(), alias.oid());
    }

    #[test]
    fn distinct_records_differ() {
        let m = model();
        let a = m.create_empty();
        let b = m.create_empty();
        assert_ne!(a, b);
        assert_ne!(a.oid(), b.oid());
    }

    #[test]
    fn set_returns_previous_resolved_value() {
        let record = model().create_empty();
        assert!(!record.is_set("val"));

        let previous = record.set("val", 20).unwrap();
        assert_eq!(previous, 15);
        assert!(record.is_set("val"));
        assert_eq!(record.get("val").unwrap(), 20);
    }

    #[test]
    fn set_validates() {
        let record = model().create_empty();
        assert_eq!(
            record.set("nickname", "JJ").unwrap_err(),
            ModelError::unknown_field("nickname")
        );
        assert!(record.set("val", "high").is_err());
        assert_eq!(record.get("val").unwrap(), 15);
    }

    #[test]
    fn data_includes_defaults() {
        let record = model().create_json(json!({"firstname": "Jake"})).unwrap();
        assert_eq!(record.to_json(), json!({"firstname": "Jake", "val": 15}));
        assert_eq!(record.get("missing"), None);
    }

    #[test]
    fn detached_record_has_no_neighbours() {
        let record = model().create_empty();
        assert!(record.store().is_none());
        assert!(record.next().is_none());
        assert!(record.previous_cycle().is_none());
        assert!(!record.destroy());
    }
}
