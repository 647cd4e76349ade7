//! Value type tags for the Rivulet value model.

use core::fmt;

/// The runtime type of a [`Value`](crate::Value).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Missing or unknown value
    Null,
    /// Boolean (true/false)
    Bool,
    /// 64-bit signed integer
    Int,
    /// 64-bit floating point number
    Float,
    /// UTF-8 string
    String,
    /// Opaque binary data
    Blob,
    /// Unix timestamp in microseconds
    Timestamp,
    /// Ordered sequence of values
    Array,
    /// Record mapping field names to values
    Map,
}

impl ValueType {
    /// Returns the lowercase name used in error messages and casts.
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::Null => "null",
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::String => "string",
            ValueType::Blob => "blob",
            ValueType::Timestamp => "timestamp",
            ValueType::Array => "array",
            ValueType::Map => "map",
        }
    }

    /// Returns whether this type holds a single non-container value.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, ValueType::Array | ValueType::Map | ValueType::Null)
    }

    /// Returns whether this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueType::Int | ValueType::Float)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
