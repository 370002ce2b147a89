//! Bound values
//!
//! The engine's output: a fully-typed tree in which every value matches
//! its declared type. Containers are freshly built, so nothing here aliases
//! the input document.

use serde_json::{Map, Number, Value};

use crate::error::{BindError, PathSegment};
use crate::record::Bindable;

/// A value produced by binding
#[derive(Debug, Clone)]
pub enum BoundValue {
    /// Absent optional value
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Tuple(Vec<BoundValue>),
    List(Vec<BoundValue>),
    /// Unique elements in first-seen order
    Set(Vec<BoundValue>),
    /// Entries in input order
    Map(Vec<(BoundValue, BoundValue)>),
    Record(BoundRecord),
}

impl BoundValue {
    /// Structural copy of an untyped value, without coercion
    ///
    /// Used for bare containers and plain tuples whose elements have no
    /// declared type.
    pub fn from_raw(raw: &Value) -> Self {
        match raw {
            Value::Null => BoundValue::None,
            Value::Bool(b) => BoundValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => BoundValue::Int(i),
                None => BoundValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => BoundValue::Str(s.clone()),
            Value::Array(items) => BoundValue::List(items.iter().map(Self::from_raw).collect()),
            Value::Object(entries) => BoundValue::Map(
                entries
                    .iter()
                    .map(|(k, v)| (BoundValue::Str(k.clone()), Self::from_raw(v)))
                    .collect(),
            ),
        }
    }

    /// Short kind name for messages
    pub fn kind(&self) -> &'static str {
        match self {
            BoundValue::None => "None",
            BoundValue::Bool(_) => "bool",
            BoundValue::Int(_) => "int",
            BoundValue::Float(_) => "float",
            BoundValue::Str(_) => "str",
            BoundValue::Bytes(_) => "bytes",
            BoundValue::Tuple(_) => "tuple",
            BoundValue::List(_) => "list",
            BoundValue::Set(_) => "set",
            BoundValue::Map(_) => "dict",
            BoundValue::Record(_) => "record",
        }
    }

    /// Kind plus a short rendering of scalars, e.g. `int 70000`
    pub fn describe(&self) -> String {
        match self {
            BoundValue::Bool(b) => format!("bool {b}"),
            BoundValue::Int(i) => format!("int {i}"),
            BoundValue::Float(x) => format!("float {x}"),
            BoundValue::Str(s) => format!("str {s:?}"),
            BoundValue::Record(record) => format!("record {}", record.name()),
            other => other.kind().to_string(),
        }
    }

    /// Label used for a mapping key in error paths
    pub(crate) fn key_label(&self) -> String {
        match self {
            BoundValue::Str(s) => s.clone(),
            BoundValue::Int(i) => i.to_string(),
            BoundValue::Float(x) => x.to_string(),
            BoundValue::Bool(b) => b.to_string(),
            other => other.kind().to_string(),
        }
    }

    /// Flatten back into an untyped value
    ///
    /// Bytes become an array of integers, non-string map keys their text
    /// form, and non-finite floats `null`. Binding the result against the
    /// same record type yields an equal value.
    pub fn to_json(&self) -> Value {
        match self {
            BoundValue::None => Value::Null,
            BoundValue::Bool(b) => Value::Bool(*b),
            BoundValue::Int(i) => Value::Number((*i).into()),
            BoundValue::Float(x) => Number::from_f64(*x).map_or(Value::Null, Value::Number),
            BoundValue::Str(s) => Value::String(s.clone()),
            BoundValue::Bytes(bytes) => {
                Value::Array(bytes.iter().map(|b| Value::Number((*b).into())).collect())
            }
            BoundValue::Tuple(items) | BoundValue::List(items) | BoundValue::Set(items) => {
                Value::Array(items.iter().map(Self::to_json).collect())
            }
            BoundValue::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.key_label(), v.to_json()))
                    .collect::<Map<_, _>>(),
            ),
            BoundValue::Record(record) => record.to_json(),
        }
    }
}

/// Sets and maps compare without regard to order
impl PartialEq for BoundValue {
    fn eq(&self, other: &Self) -> bool {
        use BoundValue as B;
        match (self, other) {
            (B::None, B::None) => true,
            (B::Bool(a), B::Bool(b)) => a == b,
            (B::Int(a), B::Int(b)) => a == b,
            // NaN equals itself so that sets and map keys stay deduplicated
            (B::Float(a), B::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (B::Str(a), B::Str(b)) => a == b,
            (B::Bytes(a), B::Bytes(b)) => a == b,
            (B::Tuple(a), B::Tuple(b)) | (B::List(a), B::List(b)) => a == b,
            (B::Set(a), B::Set(b)) => {
                a.iter().all(|x| b.contains(x)) && b.iter().all(|x| a.contains(x))
            }
            (B::Map(a), B::Map(b)) => entries_within(a, b) && entries_within(b, a),
            (B::Record(a), B::Record(b)) => a == b,
            _ => false,
        }
    }
}

fn entries_within(a: &[(BoundValue, BoundValue)], b: &[(BoundValue, BoundValue)]) -> bool {
    a.iter()
        .all(|(k, v)| b.iter().any(|(k2, v2)| k == k2 && v == v2))
}

/// A fully-bound record: every declared field, in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct BoundRecord {
    name: String,
    fields: Vec<(String, BoundValue)>,
}

impl BoundRecord {
    pub fn new(name: impl Into<String>, fields: Vec<(String, BoundValue)>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, field: &str) -> Option<&BoundValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &BoundValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Move a field out as a typed value
    ///
    /// Errors are located at the field. The field is left holding `None`.
    pub fn take<T: Bindable>(&mut self, field: &str) -> Result<T, BindError> {
        let slot = self
            .fields
            .iter_mut()
            .find(|(name, _)| name == field)
            .map(|(_, value)| std::mem::replace(value, BoundValue::None));

        let result = match slot {
            Some(value) => T::from_bound(value),
            None => Err(BindError::mismatch(
                std::any::type_name::<T>(),
                format!("no field in record {}", self.name),
            )),
        };
        result.map_err(|e| e.nest(PathSegment::Field(field)))
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(name, value)| (name.clone(), value.to_json()))
                .collect(),
        )
    }
}
