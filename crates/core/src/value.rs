//! Value type definitions for Rivulet.
//!
//! This module defines the `Value` enum which represents any value carried by a
//! tuple, produced by an expression, or emitted in an output record.

use crate::error::{Error, Result};
use crate::map::Map;
use crate::types::ValueType;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::hash::{Hash, Hasher};

/// A dynamically typed value.
#[derive(Clone, Debug)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Binary data
    Blob(Vec<u8>),
    /// Unix timestamp in microseconds
    Timestamp(i64),
    /// Ordered sequence of values
    Array(Vec<Value>),
    /// Record of named values
    Map(Map),
}

impl Value {
    /// Returns the runtime type of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::String(_) => ValueType::String,
            Value::Blob(_) => ValueType::Blob,
            Value::Timestamp(_) => ValueType::Timestamp,
            Value::Array(_) => ValueType::Array,
            Value::Map(_) => ValueType::Map,
        }
    }

    /// Returns true if this value is Null.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the boolean value if this is a Bool, None otherwise.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the integer value if this is an Int, None otherwise.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the float value if this is a Float, None otherwise.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns a reference to the string if this is a String, None otherwise.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Returns a reference to the bytes if this is a Blob, None otherwise.
    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Value::Blob(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// Returns the timestamp if this is a Timestamp, None otherwise.
    pub fn as_timestamp(&self) -> Option<i64> {
        match self {
            Value::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns a reference to the elements if this is an Array, None otherwise.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// Returns a reference to the record if this is a Map, None otherwise.
    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(v) => Some(v),
            _ => None,
        }
    }

    /// Returns a mutable reference to the record if this is a Map, None otherwise.
    pub fn as_map_mut(&mut self) -> Option<&mut Map> {
        match self {
            Value::Map(v) => Some(v),
            _ => None,
        }
    }

    /// Consumes the value and returns its record, failing for any other type.
    pub fn into_map(self) -> Result<Map> {
        match self {
            Value::Map(v) => Ok(v),
            other => Err(Error::type_mismatch(ValueType::Map, other.value_type())),
        }
    }

    // ========== Coercions ==========

    /// Coerces this value to a boolean.
    ///
    /// Null is false, numbers and timestamps are true when non-zero, containers
    /// and blobs are true when non-empty. Strings must spell a boolean.
    pub fn to_bool(&self) -> Result<bool> {
        match self {
            Value::Null => Ok(false),
            Value::Bool(b) => Ok(*b),
            Value::Int(i) => Ok(*i != 0),
            Value::Float(f) => Ok(*f != 0.0 && !f.is_nan()),
            Value::String(s) => parse_bool(s),
            Value::Blob(b) => Ok(!b.is_empty()),
            Value::Timestamp(t) => Ok(*t != 0),
            Value::Array(a) => Ok(!a.is_empty()),
            Value::Map(m) => Ok(!m.is_empty()),
        }
    }

    /// Coerces this value to an integer. Floats are truncated toward zero.
    pub fn to_int(&self) -> Result<i64> {
        match self {
            Value::Int(i) => Ok(*i),
            Value::Bool(b) => Ok(*b as i64),
            Value::Float(f) => {
                if f.is_finite() && *f >= i64::MIN as f64 && *f < i64::MAX as f64 {
                    Ok(*f as i64)
                } else {
                    Err(Error::conversion(
                        ValueType::Int,
                        alloc::format!("{} is out of range", f),
                    ))
                }
            }
            Value::String(s) => s.trim().parse::<i64>().map_err(|_| {
                Error::conversion(ValueType::Int, alloc::format!("cannot parse {:?}", s))
            }),
            Value::Timestamp(t) => Ok(*t),
            other => Err(Error::type_mismatch(ValueType::Int, other.value_type())),
        }
    }

    /// Coerces this value to a float.
    pub fn to_float(&self) -> Result<f64> {
        match self {
            Value::Float(f) => Ok(*f),
            Value::Int(i) => Ok(*i as f64),
            Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::String(s) => s.trim().parse::<f64>().map_err(|_| {
                Error::conversion(ValueType::Float, alloc::format!("cannot parse {:?}", s))
            }),
            Value::Timestamp(t) => Ok(*t as f64),
            other => Err(Error::type_mismatch(ValueType::Float, other.value_type())),
        }
    }

    /// Coerces a scalar value to its string form.
    pub fn to_string_value(&self) -> Result<String> {
        match self {
            Value::String(s) => Ok(s.clone()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Int(i) => Ok(i.to_string()),
            Value::Float(f) => Ok(f.to_string()),
            Value::Timestamp(t) => Ok(t.to_string()),
            Value::Blob(b) => String::from_utf8(b.clone())
                .map_err(|_| Error::conversion(ValueType::String, "blob is not valid UTF-8")),
            other => Err(Error::type_mismatch(ValueType::String, other.value_type())),
        }
    }

    /// Coerces this value to a timestamp in microseconds.
    pub fn to_timestamp(&self) -> Result<i64> {
        match self {
            Value::Timestamp(t) => Ok(*t),
            Value::Int(_) | Value::Float(_) | Value::String(_) => {
                self.to_int().map_err(|_| {
                    Error::conversion(ValueType::Timestamp, "expected microseconds since epoch")
                })
            }
            other => Err(Error::type_mismatch(ValueType::Timestamp, other.value_type())),
        }
    }

    /// Coerces this value to bytes.
    pub fn to_blob(&self) -> Result<Vec<u8>> {
        match self {
            Value::Blob(b) => Ok(b.clone()),
            Value::String(s) => Ok(s.as_bytes().to_vec()),
            other => Err(Error::type_mismatch(ValueType::Blob, other.value_type())),
        }
    }

    /// Compares two values, returning None when they are not comparable.
    ///
    /// Integers and floats compare numerically with each other. Strings, booleans,
    /// timestamps and blobs compare only with their own type. Null, NaN and
    /// containers are not ordered.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            (Value::Blob(a), Value::Blob(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

fn parse_bool(s: &str) -> Result<bool> {
    const TRUE: [&str; 6] = ["true", "t", "yes", "y", "on", "1"];
    const FALSE: [&str; 6] = ["false", "f", "no", "n", "off", "0"];
    let s = s.trim();
    if s.is_empty() || FALSE.iter().any(|f| s.eq_ignore_ascii_case(f)) {
        Ok(false)
    } else if TRUE.iter().any(|t| s.eq_ignore_ascii_case(t)) {
        Ok(true)
    } else {
        Err(Error::conversion(
            ValueType::Bool,
            alloc::format!("cannot parse {:?}", s),
        ))
    }
}

/// Normalizes a float for equality and hashing: all NaNs are equal and
/// negative zero equals zero.
#[inline]
fn float_bits(f: f64) -> u64 {
    if f.is_nan() {
        f64::NAN.to_bits()
    } else if f == 0.0 {
        0.0f64.to_bits()
    } else {
        f.to_bits()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => float_bits(*a) == float_bits(*b),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Blob(a), Value::Blob(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => float_bits(*f).hash(state),
            Value::String(s) => s.hash(state),
            Value::Blob(b) => b.hash(state),
            Value::Timestamp(t) => t.hash(state),
            Value::Array(a) => a.hash(state),
            Value::Map(m) => m.hash(state),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<Map> for Value {
    fn from(v: Map) -> Self {
        Value::Map(v)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}
