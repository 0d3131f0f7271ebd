//! Cell values returned by the database.
//!
//! Query results are decoded into a small closed set of value kinds. SQL NULL
//! becomes [`Value::Missing`], the numeric missing sentinel that is written as an
//! empty field. A missing count is never coerced to zero: whether "no count"
//! and "zero count" differ in the EPD is left for domain review.

use std::fmt;

/// Declared type of a projected column.
///
/// Catalog queries cast every projected column to one of these so that
/// decoding does not depend on the exact column types of a given dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int,
    Float,
    Text,
}

impl ColumnType {
    /// PostgreSQL type name used in `::type` casts.
    pub fn sql_cast(self) -> &'static str {
        match self {
            ColumnType::Int => "int8",
            ColumnType::Float => "float8",
            ColumnType::Text => "text",
        }
    }
}

/// A single decoded cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
    Missing,
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of the cell; integers widen to floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Parse a delimited-file field back into a value.
    ///
    /// Empty fields are missing; otherwise integer, then float, then text.
    pub fn parse_field(field: &str) -> Self {
        if field.is_empty() {
            return Value::Missing;
        }
        if let Ok(i) = field.parse::<i64>() {
            return Value::Int(i);
        }
        match field.parse::<f64>() {
            Ok(f) if f.is_finite() => Value::Float(f),
            _ => Value::Text(field.to_string()),
        }
    }

    /// Parse a field of a column with a known type.
    ///
    /// Text columns stay text even when they look numeric (`"0123"`). A
    /// numeric field that does not parse falls back to [`Value::parse_field`].
    pub fn parse_typed(field: &str, ty: ColumnType) -> Self {
        if field.is_empty() {
            return Value::Missing;
        }
        match ty {
            ColumnType::Text => Value::Text(field.to_string()),
            ColumnType::Int => field
                .parse::<i64>()
                .map(Value::Int)
                .unwrap_or_else(|_| Value::parse_field(field)),
            ColumnType::Float => match field.parse::<f64>() {
                Ok(f) if f.is_finite() => Value::Float(f),
                _ => Value::parse_field(field),
            },
        }
    }
}

/// Field rendering used by the delimited writer.
///
/// Floats always carry a decimal point (`120.0`) so they read back as floats.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) if x.is_finite() => write!(f, "{:?}", x),
            Value::Float(_) => Ok(()),
            Value::Text(s) => f.write_str(s),
            Value::Missing => Ok(()),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Missing)
    }
}
