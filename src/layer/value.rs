use std::fmt;

use ahash::AHashMap;
use serde_json::json;

/// A single attribute value on a feature.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Value {
    #[inline] pub fn is_null(&self) -> bool { matches!(self, Value::Null) }

    /// Numeric view of the value; booleans read as 0/1, text is never numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Null | Value::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Convert to a JSON value (non-finite floats become null).
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => json!(b),
            Value::Integer(i) => json!(i),
            Value::Float(f) => json!(f),
            Value::Text(s) => json!(s),
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
            },
            serde_json::Value::String(s) => Value::Text(s.clone()),
            other => Value::Text(other.to_string()),
        }
    }
}

impl From<f64> for Value { fn from(v: f64) -> Self { Value::Float(v) } }
impl From<i64> for Value { fn from(v: i64) -> Self { Value::Integer(v) } }
impl From<bool> for Value { fn from(v: bool) -> Self { Value::Bool(v) } }
impl From<&str> for Value { fn from(v: &str) -> Self { Value::Text(v.to_string()) } }
impl From<String> for Value { fn from(v: String) -> Self { Value::Text(v) } }

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Declared type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Bool,
    Integer,
    Float,
    Text,
}

impl FieldType {
    #[inline] pub fn is_numeric(&self) -> bool { matches!(self, FieldType::Integer | FieldType::Float) }

    /// Numeric, or a flag that sums as 0/1.
    #[inline] pub fn is_summable(&self) -> bool { self.is_numeric() || matches!(self, FieldType::Bool) }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub ty: FieldType,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self { name: name.into(), ty }
    }
}

/// Ordered field list of a vector layer, with a name index.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<Field>,
    index: AHashMap<String, usize>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        let index = fields.iter().enumerate()
            .map(|(i, field)| (field.name.clone(), i))
            .collect();
        Self { fields, index }
    }

    #[inline] pub fn len(&self) -> usize { self.fields.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.fields.is_empty() }

    #[inline] pub fn fields(&self) -> &[Field] { &self.fields }

    #[inline] pub fn index_of(&self, name: &str) -> Option<usize> { self.index.get(name).copied() }

    #[inline] pub fn field(&self, name: &str) -> Option<&Field> { self.index_of(name).map(|i| &self.fields[i]) }

    #[inline] pub fn contains(&self, name: &str) -> bool { self.index.contains_key(name) }

    /// Append a field, returning its position. Names must be unique.
    pub fn push(&mut self, field: Field) -> usize {
        assert!(!self.contains(&field.name), "duplicate field '{}'", field.name);
        let i = self.fields.len();
        self.index.insert(field.name.clone(), i);
        self.fields.push(field);
        i
    }
}
