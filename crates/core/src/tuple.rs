//! Tuple structure for Rivulet streams.
//!
//! A `Tuple` is one streaming record: a record payload plus the metadata the
//! pipeline attaches to it. Tuples are not modified after they are built.

use crate::map::Map;
use crate::value::Value;
use alloc::string::String;
use core::sync::atomic::{AtomicU64, Ordering};

/// Identifier of the batch a tuple was emitted in.
pub type BatchId = u64;

/// Global batch ID counter for sources that do not assign their own.
static NEXT_BATCH_ID: AtomicU64 = AtomicU64::new(0);

/// Gets the next unique batch ID.
pub fn next_batch_id() -> BatchId {
    NEXT_BATCH_ID.fetch_add(1, Ordering::SeqCst)
}

/// One streaming record with its metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct Tuple {
    /// Record payload.
    data: Map,
    /// Name of the input the tuple arrived on.
    input_name: String,
    /// Event time in microseconds since the Unix epoch.
    timestamp: i64,
    /// Time the tuple entered the pipeline, in microseconds since the Unix epoch.
    proc_timestamp: i64,
    /// Batch the tuple belongs to.
    batch_id: BatchId,
}

impl Tuple {
    /// Creates a tuple with zero timestamps and an empty input name.
    pub fn new(data: Map) -> Self {
        Self {
            data,
            input_name: String::new(),
            timestamp: 0,
            proc_timestamp: 0,
            batch_id: 0,
        }
    }

    /// Creates a tuple with the given event timestamp.
    pub fn with_timestamp(data: Map, timestamp: i64) -> Self {
        Self {
            timestamp,
            proc_timestamp: timestamp,
            ..Self::new(data)
        }
    }

    /// Sets the input name.
    pub fn with_input_name(mut self, input_name: impl Into<String>) -> Self {
        self.input_name = input_name.into();
        self
    }

    /// Sets the processing timestamp.
    pub fn with_proc_timestamp(mut self, proc_timestamp: i64) -> Self {
        self.proc_timestamp = proc_timestamp;
        self
    }

    /// Sets the batch ID.
    pub fn with_batch_id(mut self, batch_id: BatchId) -> Self {
        self.batch_id = batch_id;
        self
    }

    /// Returns the record payload.
    #[inline]
    pub fn data(&self) -> &Map {
        &self.data
    }

    /// Consumes the tuple and returns its payload.
    pub fn into_data(self) -> Map {
        self.data
    }

    /// Gets a top-level field of the payload.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Returns the input name.
    #[inline]
    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    /// Returns the event timestamp.
    #[inline]
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Returns the processing timestamp.
    #[inline]
    pub fn proc_timestamp(&self) -> i64 {
        self.proc_timestamp
    }

    /// Returns the batch ID.
    #[inline]
    pub fn batch_id(&self) -> BatchId {
        self.batch_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tuple_new() {
        let t = Tuple::new(Map::from([("x", Value::Int(1))]));
        assert_eq!(t.get("x"), Some(&Value::Int(1)));
        assert_eq!(t.timestamp(), 0);
        assert_eq!(t.input_name(), "");
    }

    #[test]
    fn test_tuple_with_timestamp() {
        let t = Tuple::with_timestamp(Map::new(), 1_500);
        assert_eq!(t.timestamp(), 1_500);
        assert_eq!(t.proc_timestamp(), 1_500);
    }

    #[test]
    fn test_tuple_builders() {
        let t = Tuple::with_timestamp(Map::new(), 10)
            .with_input_name("sensors")
            .with_proc_timestamp(20)
            .with_batch_id(7);
        assert_eq!(t.input_name(), "sensors");
        assert_eq!(t.timestamp(), 10);
        assert_eq!(t.proc_timestamp(), 20);
        assert_eq!(t.batch_id(), 7);
    }

    #[test]
    fn test_next_batch_id_increases() {
        let a = next_batch_id();
        let b = next_batch_id();
        assert!(b > a);
    }
}
