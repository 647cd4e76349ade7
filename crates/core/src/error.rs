//! Error types for the Rivulet value model.

use crate::types::ValueType;
use alloc::string::String;
use core::fmt;

/// Result type alias for value model operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors raised while converting, reading or writing values.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// A value had a different type than the operation requires.
    TypeMismatch {
        expected: ValueType,
        got: ValueType,
    },
    /// A value could not be converted to the target type.
    Conversion {
        target: ValueType,
        message: String,
    },
    /// A field path could not be parsed.
    InvalidPath {
        path: String,
        message: String,
    },
    /// A path walked into a value that cannot be indexed that way.
    InvalidAccess {
        path: String,
        found: ValueType,
    },
    /// A write through a path crossed a value that is not a container.
    IncompatiblePath {
        path: String,
        found: ValueType,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TypeMismatch { expected, got } => {
                write!(f, "Type mismatch: expected {}, got {}", expected, got)
            }
            Error::Conversion { target, message } => {
                write!(f, "Cannot convert to {}: {}", target, message)
            }
            Error::InvalidPath { path, message } => {
                write!(f, "Invalid path {:?}: {}", path, message)
            }
            Error::InvalidAccess { path, found } => {
                write!(f, "Cannot access {:?} in a {} value", path, found)
            }
            Error::IncompatiblePath { path, found } => {
                write!(f, "Cannot assign {:?} through a {} value", path, found)
            }
        }
    }
}

impl core::error::Error for Error {}

impl Error {
    /// Creates a type mismatch error.
    pub fn type_mismatch(expected: ValueType, got: ValueType) -> Self {
        Error::TypeMismatch { expected, got }
    }

    /// Creates a conversion error.
    pub fn conversion(target: ValueType, message: impl Into<String>) -> Self {
        Error::Conversion {
            target,
            message: message.into(),
        }
    }

    /// Creates an invalid path error.
    pub fn invalid_path(path: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidPath {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid access error.
    pub fn invalid_access(path: impl Into<String>, found: ValueType) -> Self {
        Error::InvalidAccess {
            path: path.into(),
            found,
        }
    }

    /// Creates an incompatible path error.
    pub fn incompatible_path(path: impl Into<String>, found: ValueType) -> Self {
        Error::IncompatiblePath {
            path: path.into(),
            found,
        }
    }
}
