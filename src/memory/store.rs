//! Insertion-ordered storage behind sets and dicts
//!
//! Both stores keep their items in a `Vec` (iteration order is insertion
//! order) plus an [`FxHashMap`] from the normalized [`HashKey`] to the item's
//! position. Removal rebuilds the position index.

use super::value::{HashKey, Value};
use rustc_hash::FxHashMap;
use thiserror::Error;

/// A set element or dict key was a list, set or dict
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unhashable type: '{type_name}'")]
pub struct UnhashableKey {
    pub type_name: &'static str,
}

fn key_of(value: &Value) -> Result<HashKey, UnhashableKey> {
    value.hash_key().ok_or(UnhashableKey {
        type_name: value.type_name(),
    })
}

/// Insertion-ordered dictionary
#[derive(Debug, Clone, Default)]
pub struct DictStore {
    entries: Vec<(HashKey, Value, Value)>,
    index: FxHashMap<HashKey, usize>,
}

impl DictStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert or overwrite. An existing key keeps its position.
    pub fn insert(&mut self, key: Value, value: Value) -> Result<(), UnhashableKey> {
        let hash = key_of(&key)?;
        match self.index.get(&hash) {
            Some(&pos) => self.entries[pos].2 = value,
            None => {
                self.index.insert(hash.clone(), self.entries.len());
                self.entries.push((hash, key, value));
            }
        }
        Ok(())
    }

    pub fn get(&self, key: &Value) -> Result<Option<&Value>, UnhashableKey> {
        let hash = key_of(key)?;
        Ok(self.get_by_key(&hash))
    }

    pub fn contains(&self, key: &Value) -> Result<bool, UnhashableKey> {
        Ok(self.get(key)?.is_some())
    }

    pub fn remove(&mut self, key: &Value) -> Result<Option<Value>, UnhashableKey> {
        let hash = key_of(key)?;
        let Some(pos) = self.index.get(&hash).copied() else {
            return Ok(None);
        };
        let (_, _, value) = self.entries.remove(pos);
        self.reindex();
        Ok(Some(value))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    pub(crate) fn get_by_key(&self, key: &HashKey) -> Option<&Value> {
        self.index.get(key).map(|&pos| &self.entries[pos].2)
    }

    pub(crate) fn iter_keyed(&self) -> impl Iterator<Item = (&HashKey, &Value)> {
        self.entries.iter().map(|(hash, _, value)| (hash, value))
    }

    /// `(key, value)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(_, key, value)| (key, value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, key, _)| key)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, _, value)| value)
    }

    /// Copy of this store with every value passed through `f`
    pub(crate) fn map_values(&self, mut f: impl FnMut(&Value) -> Value) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .map(|(hash, key, value)| (hash.clone(), key.clone(), f(value)))
                .collect(),
            index: self.index.clone(),
        }
    }

    fn reindex(&mut self) {
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(pos, (hash, _, _))| (hash.clone(), pos))
            .collect();
    }
}

/// Set with insertion-ordered iteration
#[derive(Debug, Clone, Default)]
pub struct SetStore {
    items: Vec<(HashKey, Value)>,
    index: FxHashMap<HashKey, usize>,
}

impl SetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from values, dropping duplicates after the first
    pub fn from_values(
        values: impl IntoIterator<Item = Value>,
    ) -> Result<Self, UnhashableKey> {
        let mut set = Self::new();
        for value in values {
            set.insert(value)?;
        }
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns `true` if the value was not already present
    pub fn insert(&mut self, value: Value) -> Result<bool, UnhashableKey> {
        let hash = key_of(&value)?;
        if self.index.contains_key(&hash) {
            return Ok(false);
        }
        self.index.insert(hash.clone(), self.items.len());
        self.items.push((hash, value));
        Ok(true)
    }

    pub fn contains(&self, value: &Value) -> Result<bool, UnhashableKey> {
        Ok(self.index.contains_key(&key_of(value)?))
    }

    /// Returns `true` if the value was present
    pub fn remove(&mut self, value: &Value) -> Result<bool, UnhashableKey> {
        let hash = key_of(value)?;
        let Some(pos) = self.index.get(&hash).copied() else {
            return Ok(false);
        };
        self.items.remove(pos);
        self.index = self
            .items
            .iter()
            .enumerate()
            .map(|(pos, (hash, _))| (hash.clone(), pos))
            .collect();
        Ok(true)
    }

    pub(crate) fn contains_key(&self, key: &HashKey) -> bool {
        self.index.contains_key(key)
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = &HashKey> {
        self.items.iter().map(|(hash, _)| hash)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.items.iter().map(|(_, value)| value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dict_overwrite_keeps_position() {
        let mut dict = DictStore::new();
        dict.insert(Value::str("a"), Value::Int(1)).unwrap();
        dict.insert(Value::str("b"), Value::Int(2)).unwrap();
        dict.insert(Value::str("a"), Value::Int(3)).unwrap();

        let keys: Vec<String> = dict.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert!(dict.get(&Value::str("a")).unwrap().unwrap().py_eq(&Value::Int(3)));
    }

    #[test]
    fn test_dict_numeric_keys_share_slot() {
        let mut dict = DictStore::new();
        dict.insert(Value::Int(1), Value::str("int")).unwrap();
        dict.insert(Value::Float(1.0), Value::str("float")).unwrap();

        assert_eq!(dict.len(), 1);
        assert!(dict.contains(&Value::Bool(true)).unwrap());
    }

    #[test]
    fn test_remove_reindexes() {
        let mut dict = DictStore::new();
        for (i, name) in ["x", "y", "z"].iter().enumerate() {
            dict.insert(Value::str(*name), Value::Int(i as i64)).unwrap();
        }
        dict.remove(&Value::str("x")).unwrap();

        assert!(dict.get(&Value::str("z")).unwrap().unwrap().py_eq(&Value::Int(2)));
        assert_eq!(dict.len(), 2);
    }

    #[test]
    fn test_set_rejects_unhashable() {
        let mut set = SetStore::new();
        let err = set.insert(Value::list(vec![])).unwrap_err();

        assert_eq!(err.to_string(), "unhashable type: 'list'");
    }

    #[test]
    fn test_set_insertion_order_and_dedup() {
        let set = SetStore::from_values(vec![
            Value::Int(3),
            Value::Int(1),
            Value::Int(3),
        ])
        .unwrap();

        let items: Vec<String> = set.values().map(|v| v.to_string()).collect();
        assert_eq!(items, vec!["3", "1"]);
    }
}
