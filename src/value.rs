#[cfg(test)]
#[path = "./value_tests.rs"]
mod tests;

use crate::Table;
use crate::time::{LocalDate, LocalDateTime, LocalTime, OffsetDateTime};

/// A decoded TOML value.
///
/// Tables are [`Table`]s, arrays (including arrays of tables) are plain
/// vectors. Equality treats two NaN floats as equal so that decoded trees
/// can be compared as data.
#[derive(Clone, Debug)]
pub enum Value {
    /// A string value.
    String(String),
    /// A 64-bit signed integer.
    Integer(i64),
    /// A float.
    Float(f64),
    /// A float kept as its normalized source text, produced by
    /// [`FloatMode::PreserveText`](crate::FloatMode::PreserveText).
    Decimal(String),
    /// A boolean.
    Boolean(bool),
    OffsetDateTime(OffsetDateTime),
    LocalDateTime(LocalDateTime),
    LocalDate(LocalDate),
    LocalTime(LocalTime),
    /// An array of values.
    Array(Vec<Value>),
    /// A table of key/value pairs.
    Table(Table),
}

impl Value {
    /// Returns the TOML type name (e.g. `"string"`, `"integer"`, `"table"`).
    pub fn type_str(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Integer(_) => "integer",
            Value::Float(_) | Value::Decimal(_) => "float",
            Value::Boolean(_) => "boolean",
            Value::OffsetDateTime(_) => "offset date-time",
            Value::LocalDateTime(_) => "local date-time",
            Value::LocalDate(_) => "local date",
            Value::LocalTime(_) => "local time",
            Value::Array(_) => "array",
            Value::Table(_) => "table",
        }
    }

    /// Returns a borrowed string if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns an `i64` if this is an integer value.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns an `f64` if this is a float value.
    ///
    /// Decimal text is converted on the fly.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Decimal(text) => text.parse().ok(),
            _ => None,
        }
    }

    /// Returns the source text of a float decoded in
    /// [`FloatMode::PreserveText`](crate::FloatMode::PreserveText).
    pub fn as_decimal(&self) -> Option<&str> {
        match self {
            Value::Decimal(text) => Some(text),
            _ => None,
        }
    }

    /// Returns a `bool` if this is a boolean value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_offset_date_time(&self) -> Option<&OffsetDateTime> {
        match self {
            Value::OffsetDateTime(dt) => Some(dt),
            _ => None,
        }
    }

    pub fn as_local_date_time(&self) -> Option<&LocalDateTime> {
        match self {
            Value::LocalDateTime(dt) => Some(dt),
            _ => None,
        }
    }

    pub fn as_local_date(&self) -> Option<&LocalDate> {
        match self {
            Value::LocalDate(date) => Some(date),
            _ => None,
        }
    }

    pub fn as_local_time(&self) -> Option<&LocalTime> {
        match self {
            Value::LocalTime(time) => Some(time),
            _ => None,
        }
    }

    /// Returns a borrowed array if this is an array value.
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Returns a mutable array reference.
    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Returns a borrowed table if this is a table value.
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Returns a mutable table reference.
    pub fn as_table_mut(&mut self) -> Option<&mut Table> {
        match self {
            Value::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Looks up `key` if this is a table.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_table()?.get(key)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::OffsetDateTime(a), Value::OffsetDateTime(b)) => a == b,
            (Value::LocalDateTime(a), Value::LocalDateTime(b)) => a == b,
            (Value::LocalDate(a), Value::LocalDate(b)) => a == b,
            (Value::LocalTime(a), Value::LocalTime(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Table(a), Value::Table(b)) => a == b,
            _ => false,
        }
    }
}

macro_rules! impl_from {
    ($($variant:ident($ty:ty)),* $(,)?) => {$(
        impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Value::$variant(value)
            }
        }
    )*};
}

impl_from!(
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    OffsetDateTime(OffsetDateTime),
    LocalDateTime(LocalDateTime),
    LocalDate(LocalDate),
    LocalTime(LocalTime),
    Array(Vec<Value>),
    Table(Table),
);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Value {
    fn serialize<S>(&self, ser: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Value::String(s) => ser.serialize_str(s),
            Value::Integer(i) => ser.serialize_i64(*i),
            Value::Float(f) => ser.serialize_f64(*f),
            Value::Decimal(text) => ser.serialize_str(text),
            Value::Boolean(b) => ser.serialize_bool(*b),
            Value::OffsetDateTime(dt) => serde::Serialize::serialize(dt, ser),
            Value::LocalDateTime(dt) => serde::Serialize::serialize(dt, ser),
            Value::LocalDate(date) => serde::Serialize::serialize(date, ser),
            Value::LocalTime(time) => serde::Serialize::serialize(time, ser),
            Value::Array(arr) => {
                use serde::ser::SerializeSeq;
                let mut seq = ser.serialize_seq(Some(arr.len()))?;
                for ele in arr {
                    seq.serialize_element(ele)?;
                }
                seq.end()
            }
            Value::Table(tab) => serde::Serialize::serialize(tab, ser),
        }
    }
}
