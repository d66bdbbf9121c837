//! Record models.
//!
//! A [`Model`] declares the fields a record may hold, their types and their
//! default values. It is the factory a store uses to turn raw [`Data`] into
//! [`Record`]s.

use crate::error::{ModelError, ModelResult};
use crate::record::Record;
use crate::value::{data_from_json, Data, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Declared type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// Any value.
    Any,
    /// UTF-8 text.
    Text,
    /// Signed integer.
    Integer,
    /// Float. Integer input is widened.
    Float,
    /// Boolean.
    Bool,
}

impl FieldType {
    /// Returns true for types whose values have a numeric order.
    ///
    /// Indexes created on numeric fields default to a BTree.
    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(self, FieldType::Integer | FieldType::Float)
    }

    /// Coerces a value into this type.
    ///
    /// `Null` is accepted by every type. Integers widen to floats and
    /// integral floats narrow to integers.
    pub fn coerce(self, field: &str, value: Value) -> ModelResult<Value> {
        match (self, value) {
            (_, Value::Null) => Ok(Value::Null),
            (FieldType::Any, v) => Ok(v),
            (FieldType::Text, v @ Value::Text(_)) => Ok(v),
            (FieldType::Bool, v @ Value::Bool(_)) => Ok(v),
            (FieldType::Integer, v @ Value::Integer(_)) => Ok(v),
            (FieldType::Integer, Value::Float(f))
                if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 =>
            {
                Ok(Value::Integer(f as i64))
            }
            (FieldType::Float, v @ Value::Float(_)) => Ok(v),
            (FieldType::Float, Value::Integer(n)) => Ok(Value::Float(n as f64)),
            (_, v) => Err(ModelError::TypeMismatch {
                field: field.to_string(),
                expected: self,
                actual: v.type_name(),
            }),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Any => "any",
            FieldType::Text => "text",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Bool => "bool",
        };
        f.write_str(name)
    }
}

/// A single field declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    /// Field name.
    pub name: String,
    /// Declared type.
    pub field_type: FieldType,
    /// Value reported while the field is unset.
    pub default: Value,
}

impl FieldDef {
    /// Creates a field with a `Null` default.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            default: Value::Null,
        }
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = default.into();
        self
    }
}

struct ModelInner {
    name: String,
    fields: Vec<FieldDef>,
    slots: HashMap<String, usize>,
}

/// A record factory.
///
/// Models are cheap to clone; clones share the same declaration and
/// compare equal.
///
/// # Example
///
/// ```rust
/// use recstore_core::{FieldType, Model};
///
/// let model = Model::builder("person")
///     .field("firstname", FieldType::Text)
///     .field("lastname", FieldType::Text)
///     .field_with_default("val", FieldType::Integer, 15)
///     .build()
///     .unwrap();
///
/// let record = model.create_json(serde_json::json!({"firstname": "John"})).unwrap();
/// assert_eq!(record.get("val").unwrap(), 15);
/// ```
#[derive(Clone)]
pub struct Model {
    inner: Arc<ModelInner>,
}

impl Model {
    /// Starts declaring a model.
    pub fn builder(name: impl Into<String>) -> ModelBuilder {
        ModelBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Returns the model name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns all field declarations in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDef] {
        &self.inner.fields
    }

    /// Returns a field declaration by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.slot(name).map(|slot| &self.inner.fields[slot])
    }

    /// Returns true if the model declares `name`.
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.inner.slots.contains_key(name)
    }

    pub(crate) fn slot(&self, name: &str) -> Option<usize> {
        self.inner.slots.get(name).copied()
    }

    pub(crate) fn field_at(&self, slot: usize) -> &FieldDef {
        &self.inner.fields[slot]
    }

    /// Builds a record from field data.
    ///
    /// Fields absent from `data` stay unset and report their default.
    ///
    /// # Errors
    ///
    /// Fails on fields the model does not declare and on values that do not
    /// fit the declared type.
    pub fn create(&self, data: Data) -> ModelResult<Record> {
        let mut values = vec![None; self.inner.fields.len()];
        for (name, value) in data {
            let slot = self
                .slot(&name)
                .ok_or_else(|| ModelError::unknown_field(&name))?;
            values[slot] = Some(self.inner.fields[slot].field_type.coerce(&name, value)?);
        }
        Ok(Record::from_parts(self.clone(), values))
    }

    /// Builds a record from a JSON object.
    ///
    /// # Errors
    ///
    /// Fails if `json` is not a flat object or does not fit the model.
    pub fn create_json(&self, json: serde_json::Value) -> ModelResult<Record> {
        self.create(data_from_json(json)?)
    }

    /// Builds a record with every field unset.
    #[must_use]
    pub fn create_empty(&self) -> Record {
        Record::from_parts(self.clone(), vec![None; self.inner.fields.len()])
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Model {}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.inner.name)
            .field("fields", &self.inner.fields)
            .finish()
    }
}

/// Builder for [`Model`].
#[derive(Debug)]
pub struct ModelBuilder {
    name: String,
    fields: Vec<FieldDef>,
}

impl ModelBuilder {
    /// Declares a field with a `Null` default.
    #[must_use]
    pub fn field(self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.define(FieldDef::new(name, field_type))
    }

    /// Declares a field with a default value.
    #[must_use]
    pub fn field_with_default(
        self,
        name: impl Into<String>,
        field_type: FieldType,
        default: impl Into<Value>,
    ) -> Self {
        self.define(FieldDef::new(name, field_type).with_default(default))
    }

    /// Declares a field from a full definition.
    #[must_use]
    pub fn define(mut self, def: FieldDef) -> Self {
        self.fields.push(def);
        self
    }

    /// Validates the declarations and builds the model.
    ///
    /// # Errors
    ///
    /// Fails on duplicate field names and on defaults that do not fit the
    /// declared type.
    pub fn build(self) -> ModelResult<Model> {
        let mut slots = HashMap::with_capacity(self.fields.len());
        let mut fields = Vec::with_capacity(self.fields.len());
        for (slot, mut def) in self.fields.into_iter().enumerate() {
            if slots.insert(def.name.clone(), slot).is_some() {
                return Err(ModelError::DuplicateField { field: def.name });
            }
            def.default = def
                .field_type
                .coerce(&def.name, std::mem::take(&mut def.default))?;
            fields.push(def);
        }
        Ok(Model {
            inner: Arc::new(ModelInner {
                name: self.name,
                fields,
                slots,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn person() -> Model {
        Model::builder("person")
            .field("firstname", FieldType::Text)
            .field("lastname", FieldType::Text)
            .field_with_default("val", FieldType::Integer, 15)
            .build()
            .unwrap()
    }

    #[test]
    fn builder_declares_fields_in_order() {
        let model = person();
        let names: Vec<_> = model.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["firstname", "lastname", "val"]);
        assert!(model.has_field("val"));
        assert!(!model.has_field("age"));
        assert_eq!(model.field("val").unwrap().default, Value::Integer(15));
    }

    #[test]
    fn duplicate_field_rejected() {
        let result = Model::builder("dup")
            .field("a", FieldType::Any)
            .field("a", FieldType::Text)
            .build();
        assert_eq!(
            result.unwrap_err(),
            ModelError::DuplicateField { field: "a".into() }
        );
    }

    #[test]
    fn default_must_fit_type() {
        let result = Model::builder("bad")
            .field_with_default("n", FieldType::Integer, "ten")
            .build();
        assert!(matches!(result, Err(ModelError::TypeMismatch { .. })));
    }

    #[test]
    fn create_applies_defaults() {
        let record = person().create_json(json!({"firstname": "John"})).unwrap();
        assert_eq!(record.get("firstname").unwrap(), "John");
        assert!(record.get("lastname").unwrap().is_null());
        assert_eq!(record.get("val").unwrap(), 15);
    }

    #[test]
    fn create_rejects_unknown_field() {
        let err = person().create_json(json!({"nickname": "JJ"})).unwrap_err();
        assert_eq!(err, ModelError::unknown_field("nickname"));
    }

    #[test]
    fn coercion_rules() {
        assert_eq!(
            FieldType::Float.coerce("f", Value::Integer(3)).unwrap(),
            Value::Float(3.0)
        );
        assert_eq!(
            FieldType::Integer.coerce("i", Value::Float(4.0)).unwrap(),
            Value::Integer(4)
        );
        assert!(FieldType::Integer.coerce("i", Value::Float(4.5)).is_err());
        assert!(FieldType::Text.coerce("t", Value::Null).unwrap().is_null());
        assert!(FieldType::Bool.coerce("b", Value::from("yes")).is_err());
    }

    #[test]
    fn clones_are_equal() {
        let a = person();
        let b = a.clone();
        assert_eq!(a, b);
        assert_ne!(a, person());
    }
}
