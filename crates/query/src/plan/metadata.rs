//! Per-alias stream metadata injected into input records.
//!
//! Metadata lives at the top level of the merged record under
//! `<alias>:meta:<NAME>`, so metadata references compile to plain field reads.

use alloc::string::String;
use rivulet_core::{Map, Tuple, Value};

/// Name of the event timestamp metadata.
pub const TIMESTAMP_META: &str = "TS";

const META_SEPARATOR: &str = ":meta:";

/// Returns the record key holding metadata `name` of stream `alias`.
pub fn meta_key(alias: &str, name: &str) -> String {
    let mut key = String::with_capacity(alias.len() + META_SEPARATOR.len() + name.len());
    key.push_str(alias);
    key.push_str(META_SEPARATOR);
    key.push_str(name);
    key
}

/// Returns true if `key` is a metadata key this crate writes.
///
/// Only `<alias>:meta:TS` with a non-empty alias matches, so user fields that
/// merely contain the separator stay visible.
#[inline]
pub fn is_meta_key(key: &str) -> bool {
    key.strip_suffix(TIMESTAMP_META)
        .and_then(|rest| rest.strip_suffix(META_SEPARATOR))
        .is_some_and(|alias| !alias.is_empty())
}

/// Writes the metadata of `tuple` into `record` for stream `alias`.
pub fn set_metadata(record: &mut Map, alias: &str, tuple: &Tuple) {
    record.insert(
        meta_key(alias, TIMESTAMP_META),
        Value::Timestamp(tuple.timestamp()),
    );
}

/// Builds the merged input record for one evaluation.
///
/// Each tuple's payload is nested under its alias and its metadata is written
/// next to it. A repeated alias replaces the earlier entry.
pub fn merge_inputs<'t, I>(inputs: I) -> Map
where
    I: IntoIterator<Item = (&'t str, &'t Tuple)>,
{
    let mut record = Map::new();
    for (alias, tuple) in inputs {
        record.insert(alias, Value::Map(tuple.data().clone()));
        set_metadata(&mut record, alias, tuple);
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_key() {
        assert_eq!(meta_key("s", TIMESTAMP_META), "s:meta:TS");
        assert!(is_meta_key("s:meta:TS"));
        assert!(!is_meta_key("s:TS"));
        assert!(!is_meta_key(":meta:TS"));
        assert!(!is_meta_key("url:meta:x"));
        assert!(!is_meta_key("a:meta:TS:b"));
    }

    #[test]
    fn test_set_metadata() {
        let tuple = Tuple::with_timestamp(Map::from([("x", Value::Int(1))]), 1_234);
        let mut record = Map::from([("y", Value::Int(2))]);
        set_metadata(&mut record, "s", &tuple);

        assert_eq!(record.get("s:meta:TS"), Some(&Value::Timestamp(1_234)));
        assert_eq!(record.get("y"), Some(&Value::Int(2)));
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn test_merge_inputs() {
        let left = Tuple::with_timestamp(Map::from([("id", Value::Int(1))]), 10);
        let right = Tuple::with_timestamp(Map::from([("id", Value::Int(2))]), 20);
        let record = merge_inputs([("l", &left), ("r", &right)]);

        assert_eq!(record.len(), 4);
        assert_eq!(
            record.get("l").and_then(|v| v.as_map()).and_then(|m| m.get("id")),
            Some(&Value::Int(1))
        );
        assert_eq!(record.get("r:meta:TS"), Some(&Value::Timestamp(20)));
    }
}
