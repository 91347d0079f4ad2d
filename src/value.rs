//! Column values exchanged with the data source.
//!
//! Literals in expressions become [`Value`]s bound as statement parameters,
//! and every raw result cell comes back as a [`Value`] before projection
//! coerces it with [`FromValue`].

use std::fmt;

/// A single SQL value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    Blob(Vec<u8>),
}

/// Discriminant of a [`Value`], used in schema descriptors and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Int,
    Float,
    Text,
    Bool,
    Blob,
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Text(_) => ValueKind::Text,
            Value::Bool(_) => ValueKind::Bool,
            Value::Blob(_) => ValueKind::Blob,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueKind::Null => "null",
            ValueKind::Int => "integer",
            ValueKind::Float => "real",
            ValueKind::Text => "text",
            ValueKind::Bool => "boolean",
            ValueKind::Blob => "blob",
        })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => {
                let mut buffer = ryu::Buffer::new();
                f.write_str(buffer.format(*x))
            }
            Value::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Blob(bytes) => {
                f.write_str("X'")?;
                for byte in bytes {
                    write!(f, "{byte:02X}")?;
                }
                f.write_str("'")
            }
        }
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_owned())
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Blob(bytes)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

// =============================================================================
// Coercion
// =============================================================================

/// A raw value could not be coerced into the requested Rust type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoerceError {
    pub expected: &'static str,
    pub found: ValueKind,
}

impl fmt::Display for CoerceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot read {} value as {}", self.found, self.expected)
    }
}

impl std::error::Error for CoerceError {}

/// Conversion from a raw column value into a Rust value.
///
/// Widening is implicit (integer to real, 0/1 to bool); anything lossy or
/// cross-family is a [`CoerceError`]. `NULL` only converts into `Option`.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, CoerceError>;
}

fn mismatch<T>(expected: &'static str, value: &Value) -> Result<T, CoerceError> {
    Err(CoerceError {
        expected,
        found: value.kind(),
    })
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, CoerceError> {
        Ok(value)
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self, CoerceError> {
        match value {
            Value::Int(n) => Ok(n),
            Value::Bool(b) => Ok(i64::from(b)),
            Value::Float(x) if x.fract() == 0.0 && x.abs() < i64::MAX as f64 => Ok(x as i64),
            other => mismatch("i64", &other),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> Result<Self, CoerceError> {
        let kind = value.kind();
        let wide = i64::from_value(value).map_err(|e| CoerceError {
            expected: "i32",
            found: e.found,
        })?;
        i32::try_from(wide).map_err(|_| CoerceError {
            expected: "i32",
            found: kind,
        })
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, CoerceError> {
        match value {
            Value::Float(x) => Ok(x),
            Value::Int(n) => Ok(n as f64),
            other => mismatch("f64", &other),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, CoerceError> {
        match value {
            Value::Bool(b) => Ok(b),
            Value::Int(0) => Ok(false),
            Value::Int(1) => Ok(true),
            other => mismatch("bool", &other),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, CoerceError> {
        match value {
            Value::Text(s) => Ok(s),
            other => mismatch("String", &other),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self, CoerceError> {
        match value {
            Value::Blob(bytes) => Ok(bytes),
            other => mismatch("bytes", &other),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, CoerceError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}
