//! Cell values and column type tags.
//!
//! Every cell in a backing collection is exposed as a [`Value`]. Each column
//! declares a [`TypeTag`] when it is registered; the tag, not the runtime
//! variant of individual cells, decides which comparator sorts the column.

use std::fmt;

use chrono::{DateTime, Utc};

/// The declared type of a column.
///
/// Used by the [`ComparatorRegistry`](super::ComparatorRegistry) to pick a
/// comparison rule for a sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// Integer or floating point measurements.
    Number,
    /// Free text (names, identifiers, file paths).
    Text,
    /// Boolean flags, including the record selection flag.
    Boolean,
    /// Timestamps.
    Temporal,
    /// Geometric features. Not sortable by default.
    Geometry,
    /// Anything else; sorted by its textual representation.
    Other,
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Missing value.
    #[default]
    Null,
    /// Integer data.
    Int(i64),
    /// Floating point data.
    Float(f64),
    /// Text data.
    Text(String),
    /// Boolean data.
    Bool(bool),
    /// Timestamp data.
    Temporal(DateTime<Utc>),
    /// Values with no dedicated variant, carried as their textual form.
    Other(String),
}

impl Value {
    /// Returns `true` if this is `Value::Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Attempts to get the value as a string slice.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Attempts to get the value as an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to get the value as a float. Integers are widened.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(*n),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Attempts to get the value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to get the value as a timestamp.
    pub fn as_temporal(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::Temporal(t) => Some(t),
            _ => None,
        }
    }

    /// Returns the type tag a column holding only this value would declare.
    ///
    /// Returns `None` for `Value::Null`, which fits any column.
    pub fn natural_type(&self) -> Option<TypeTag> {
        match self {
            Value::Null => None,
            Value::Int(_) | Value::Float(_) => Some(TypeTag::Number),
            Value::Text(_) => Some(TypeTag::Text),
            Value::Bool(_) => Some(TypeTag::Boolean),
            Value::Temporal(_) => Some(TypeTag::Temporal),
            Value::Other(_) => Some(TypeTag::Other),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::Text(s) | Value::Other(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Temporal(t) => write!(f, "{}", t.to_rfc3339()),
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::Temporal(t)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

/// A registered column: its name and declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: String,
    type_tag: TypeTag,
}

impl Column {
    /// Creates a column definition.
    pub fn new(name: impl Into<String>, type_tag: TypeTag) -> Self {
        Self {
            name: name.into(),
            type_tag,
        }
    }

    /// Returns the column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared type of the column.
    pub fn type_tag(&self) -> TypeTag {
        self.type_tag
    }
}
