//! Rivulet Core - Value model and tuples for the Rivulet continuous-query engine.
//!
//! This crate provides the foundational types shared by the query compiler and
//! the plan evaluator:
//!
//! - `Value`: Dynamically typed runtime values with explicit coercions
//! - `ValueType`: Runtime type tags
//! - `Map`: Records with sorted keys and path-based access
//! - `Path`: Parsed field paths (`a.b[0]["c"]`)
//! - `Tuple`: A streaming record with its event metadata
//! - `Error`: Errors raised by conversions and path access
//!
//! # Example
//!
//! ```rust
//! use rivulet_core::{Map, Path, Tuple, Value};
//!
//! let mut data = Map::new();
//! data.set_path(&Path::parse("reading.celsius").unwrap(), Value::Float(21.5))
//!     .unwrap();
//!
//! let tuple = Tuple::with_timestamp(data, 1_700_000_000_000_000);
//! let celsius = tuple
//!     .data()
//!     .get_path(&Path::parse("reading.celsius").unwrap())
//!     .unwrap();
//!
//! assert_eq!(celsius, Some(&Value::Float(21.5)));
//! ```

#![no_std]

extern crate alloc;

mod error;
mod map;
mod path;
mod tuple;
mod types;
mod value;

pub use error::{Error, Result};
pub use map::Map;
pub use path::{Path, Segment};
pub use tuple::{next_batch_id, BatchId, Tuple};
pub use types::ValueType;
pub use value::Value;
