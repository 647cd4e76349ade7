//! Record type for Rivulet values.
//!
//! A `Map` keeps its entries sorted by key so lookups are O(log n), iteration
//! order is deterministic, and structural equality and hashing are cheap.

use crate::error::{Error, Result};
use crate::path::{Path, Segment};
use crate::types::ValueType;
use crate::value::Value;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// A record mapping field names to values.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Map {
    /// Entries stored sorted by key for binary search
    entries: Vec<(String, Value)>,
}

impl Map {
    /// Creates a new empty Map.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Creates a Map with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the map is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    fn position(&self, key: &str) -> core::result::Result<usize, usize> {
        self.entries.binary_search_by(|(k, _)| k.as_str().cmp(key))
    }

    /// Gets a value by key using binary search. O(log n)
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.position(key).ok().map(|idx| &self.entries[idx].1)
    }

    /// Gets a mutable value by key using binary search. O(log n)
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        match self.position(key) {
            Ok(idx) => Some(&mut self.entries[idx].1),
            Err(_) => None,
        }
    }

    /// Inserts a key-value pair, maintaining sorted order.
    ///
    /// Returns the previous value stored under the key, if any.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        match self.position(&key) {
            Ok(idx) => Some(core::mem::replace(&mut self.entries[idx].1, value)),
            Err(idx) => {
                self.entries.insert(idx, (key, value));
                None
            }
        }
    }

    /// Removes a key and returns its value if present.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.position(key).ok().map(|idx| self.entries.remove(idx).1)
    }

    /// Returns true if the map contains the given key.
    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_ok()
    }

    /// Returns an iterator over the keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Returns an iterator over the values.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Returns an iterator over key-value pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns a mutable iterator over key-value pairs in key order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Value)> {
        self.entries.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns a new map with only the entries accepted by `keep`.
    pub fn filtered<F>(&self, mut keep: F) -> Map
    where
        F: FnMut(&str) -> bool,
    {
        Map {
            entries: self
                .entries
                .iter()
                .filter(|(k, _)| keep(k))
                .cloned()
                .collect(),
        }
    }

    /// Returns the slot for `key`, inserting Null when it is missing.
    fn slot(&mut self, key: &str) -> &mut Value {
        let idx = match self.position(key) {
            Ok(idx) => idx,
            Err(idx) => {
                self.entries.insert(idx, (key.to_string(), Value::Null));
                idx
            }
        };
        &mut self.entries[idx].1
    }

    /// Reads the value at `path`.
    ///
    /// A missing field, an out-of-range index or a Null intermediate value
    /// yields `Ok(None)`. Looking up a field in a non-map or an index in a
    /// non-array is an [`Error::InvalidAccess`].
    pub fn get_path(&self, path: &Path) -> Result<Option<&Value>> {
        let Some((first, rest)) = path.segments().split_first() else {
            return Ok(None);
        };
        let mut current = match first {
            Segment::Key(key) => match self.get(key) {
                Some(v) => v,
                None => return Ok(None),
            },
            Segment::Index(_) => {
                return Err(Error::invalid_access(path.to_string(), ValueType::Map))
            }
        };
        for segment in rest {
            current = match (segment, current) {
                (_, Value::Null) => return Ok(None),
                (Segment::Key(key), Value::Map(map)) => match map.get(key) {
                    Some(v) => v,
                    None => return Ok(None),
                },
                (Segment::Index(idx), Value::Array(items)) => match items.get(*idx) {
                    Some(v) => v,
                    None => return Ok(None),
                },
                (_, other) => {
                    return Err(Error::invalid_access(path.to_string(), other.value_type()))
                }
            };
        }
        Ok(Some(current))
    }

    /// Writes `value` at `path`, creating intermediate maps and arrays as needed.
    ///
    /// Arrays are padded with Null up to the written index. Writing through an
    /// existing non-container value is an [`Error::IncompatiblePath`].
    pub fn set_path(&mut self, path: &Path, value: Value) -> Result<()> {
        match path.segments().split_first() {
            Some((Segment::Key(key), rest)) => assign(self.slot(key), rest, value, path),
            Some((Segment::Index(_), _)) => {
                Err(Error::incompatible_path(path.to_string(), ValueType::Map))
            }
            None => Err(Error::invalid_path("", "empty path")),
        }
    }
}

fn assign(target: &mut Value, rest: &[Segment], value: Value, path: &Path) -> Result<()> {
    let Some((segment, rest)) = rest.split_first() else {
        *target = value;
        return Ok(());
    };
    if target.is_null() {
        *target = match segment {
            Segment::Key(_) => Value::Map(Map::new()),
            Segment::Index(_) => Value::Array(Vec::new()),
        };
    }
    match (segment, target) {
        (Segment::Key(key), Value::Map(map)) => assign(map.slot(key), rest, value, path),
        (Segment::Index(idx), Value::Array(items)) => {
            if items.len() <= *idx {
                items.resize(*idx + 1, Value::Null);
            }
            assign(&mut items[*idx], rest, value, path)
        }
        (_, other) => Err(Error::incompatible_path(
            path.to_string(),
            other.value_type(),
        )),
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Map {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut map = Map::new();
        map.extend(iter);
        map
    }
}

impl<K: Into<String>> Extend<(K, Value)> for Map {
    fn extend<I: IntoIterator<Item = (K, Value)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K: Into<String>, const N: usize> From<[(K, Value); N]> for Map {
    fn from(entries: [(K, Value); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl IntoIterator for Map {
    type Item = (String, Value);
    type IntoIter = alloc::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn path(s: &str) -> Path {
        Path::parse(s).unwrap()
    }

    #[test]
    fn test_insert_keeps_sorted_order() {
        let mut map = Map::new();
        map.insert("b", Value::Int(2));
        map.insert("a", Value::Int(1));
        map.insert("c", Value::Int(3));
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(map.insert("a", Value::Int(10)), Some(Value::Int(1)));
        assert_eq!(map.get("a"), Some(&Value::Int(10)));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_remove_and_contains() {
        let mut map = Map::from([("x", Value::Int(1)), ("y", Value::Null)]);
        assert!(map.contains_key("y"));
        assert_eq!(map.remove("y"), Some(Value::Null));
        assert!(!map.contains_key("y"));
        assert_eq!(map.remove("y"), None);
    }

    #[test]
    fn test_equality_ignores_insertion_order() {
        let a = Map::from([("x", Value::Int(1)), ("y", Value::Int(2))]);
        let b = Map::from([("y", Value::Int(2)), ("x", Value::Int(1))]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_get_path() {
        let inner = Map::from([("b", Value::Array(vec![Value::Int(7), Value::Int(8)]))]);
        let map = Map::from([("a", Value::Map(inner)), ("s", Value::from("text"))]);

        assert_eq!(map.get_path(&path("a.b[1]")).unwrap(), Some(&Value::Int(8)));
        assert_eq!(map.get_path(&path("a.b[5]")).unwrap(), None);
        assert_eq!(map.get_path(&path("a.missing.deeper")).unwrap(), None);
        assert_eq!(map.get_path(&path("nope")).unwrap(), None);
    }

    #[test]
    fn test_get_path_invalid_access() {
        let map = Map::from([("s", Value::from("text")), ("n", Value::Int(1))]);
        assert!(matches!(
            map.get_path(&path("s.x")),
            Err(Error::InvalidAccess { found: ValueType::String, .. })
        ));
        assert!(matches!(
            map.get_path(&path("n[0]")),
            Err(Error::InvalidAccess { found: ValueType::Int, .. })
        ));
    }

    #[test]
    fn test_null_intermediate_reads_as_missing() {
        let map = Map::from([("a", Value::Null)]);
        assert_eq!(map.get_path(&path("a.b")).unwrap(), None);
    }

    #[test]
    fn test_set_path_creates_containers() {
        let mut map = Map::new();
        map.set_path(&path("a.b"), Value::Int(1)).unwrap();
        map.set_path(&path("a.c[2]"), Value::Int(3)).unwrap();

        assert_eq!(map.get_path(&path("a.b")).unwrap(), Some(&Value::Int(1)));
        assert_eq!(
            map.get_path(&path("a.c")).unwrap(),
            Some(&Value::Array(vec![Value::Null, Value::Null, Value::Int(3)]))
        );
    }

    #[test]
    fn test_set_path_through_scalar_fails() {
        let mut map = Map::from([("a", Value::Int(1))]);
        assert!(matches!(
            map.set_path(&path("a.b"), Value::Int(2)),
            Err(Error::IncompatiblePath { found: ValueType::Int, .. })
        ));
        // overwriting the scalar itself is fine
        map.set_path(&path("a"), Value::Int(2)).unwrap();
        assert_eq!(map.get("a"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_filtered() {
        let map = Map::from([("a", Value::Int(1)), ("b", Value::Int(2))]);
        let only_a = map.filtered(|k| k == "a");
        assert_eq!(only_a, Map::from([("a", Value::Int(1))]));
    }
}
