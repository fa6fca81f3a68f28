//! Module: identity
//! Responsibility: per-pass `(type key, id)` table of already-serialized entities.
//! Does not own: deciding *whether* to serialize (callers check `get` first).
//!
//! Invariants:
//! - A `(type key, id)` pair is stored at most once; the first writer wins.
//! - Type buckets and the entries inside them keep first-discovery order;
//!   `reserve` claims a position before the hash exists.
//! - One map lives for exactly one serialization pass.

use crate::model::id::Id;
use serde_json::{Map, Value};
use std::collections::HashMap;

///
/// TypeBucket
///

#[derive(Debug, Default)]
struct TypeBucket {
    slots: HashMap<Id, usize>,
    // `None` marks a reserved slot whose hash is still being built.
    entries: Vec<Option<Map<String, Value>>>,
}

///
/// IdentityMap
///

#[derive(Debug, Default)]
pub struct IdentityMap {
    order: Vec<String>,
    buckets: HashMap<String, TypeBucket>,
}

impl IdentityMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the serialized hash for one entity. No side effects.
    #[must_use]
    pub fn get(&self, type_key: &str, id: &Id) -> Option<&Map<String, Value>> {
        let bucket = self.buckets.get(type_key)?;
        let slot = *bucket.slots.get(id)?;

        bucket.entries.get(slot)?.as_ref()
    }

    #[must_use]
    pub fn contains(&self, type_key: &str, id: &Id) -> bool {
        self.get(type_key, id).is_some()
    }

    /// Claim a slot for an entity that is about to be serialized.
    /// Returns `false` when the pair is already reserved or stored.
    pub fn reserve(&mut self, type_key: &str, id: Id) -> bool {
        let bucket = self.bucket_mut(type_key);
        if bucket.slots.contains_key(&id) {
            return false;
        }

        bucket.slots.insert(id, bucket.entries.len());
        bucket.entries.push(None);
        true
    }

    /// Store a serialized hash unless one is already recorded.
    /// A reserved slot is filled in place. Returns whether the hash was stored.
    pub fn put(&mut self, type_key: &str, id: Id, hash: Map<String, Value>) -> bool {
        let bucket = self.bucket_mut(type_key);
        match bucket.slots.get(&id) {
            Some(&slot) => match bucket.entries.get_mut(slot) {
                Some(entry) if entry.is_none() => {
                    *entry = Some(hash);
                    true
                }
                _ => false,
            },
            None => {
                bucket.slots.insert(id, bucket.entries.len());
                bucket.entries.push(Some(hash));
                true
            }
        }
    }

    fn bucket_mut(&mut self, type_key: &str) -> &mut TypeBucket {
        if !self.buckets.contains_key(type_key) {
            self.order.push(type_key.to_string());
        }

        self.buckets.entry(type_key.to_string()).or_default()
    }

    /// Total number of stored entities across all type keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets
            .values()
            .map(|b| b.entries.iter().flatten().count())
            .sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Type keys in first-insertion order.
    pub fn type_keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Side-load section: type key -> list of hashes, ids discarded.
    #[must_use]
    pub fn to_flat_mapping(&self) -> Map<String, Value> {
        self.order
            .iter()
            .filter_map(|key| {
                let bucket = self.buckets.get(key)?;
                let hashes = bucket
                    .entries
                    .iter()
                    .flatten()
                    .cloned()
                    .map(Value::Object)
                    .collect();
                Some((key.clone(), Value::Array(hashes)))
            })
            .collect()
    }

    /// Consuming variant of [`Self::to_flat_mapping`].
    #[must_use]
    pub fn into_flat_mapping(mut self) -> Map<String, Value> {
        self.order
            .into_iter()
            .filter_map(|key| {
                let bucket = self.buckets.remove(&key)?;
                let hashes = bucket
                    .entries
                    .into_iter()
                    .flatten()
                    .map(Value::Object)
                    .collect();
                Some((key, Value::Array(hashes)))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hash(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn get_is_absent_until_put() {
        let mut map = IdentityMap::new();
        assert!(map.get("comments", &Id::from(10)).is_none());

        assert!(map.put("comments", Id::from(10), hash(json!({"id": 10}))));
        assert_eq!(
            map.get("comments", &Id::from(10)),
            Some(&hash(json!({"id": 10})))
        );
        assert!(map.get("authors", &Id::from(10)).is_none());
    }

    #[test]
    fn first_writer_wins() {
        let mut map = IdentityMap::new();
        map.put("authors", Id::from(5), hash(json!({"id": 5, "name": "first"})));
        let inserted = map.put("authors", Id::from(5), hash(json!({"id": 5, "name": "second"})));

        assert!(!inserted, "second put for the same key must be a no-op");
        assert_eq!(map.len(), 1);
        assert_eq!(
            map.get("authors", &Id::from(5)).and_then(|h| h.get("name")),
            Some(&json!("first"))
        );
    }

    #[test]
    fn int_and_text_ids_do_not_collide() {
        let mut map = IdentityMap::new();
        map.put("tags", Id::from(1), hash(json!({"id": 1})));
        map.put("tags", Id::from("1"), hash(json!({"id": "1"})));

        assert_eq!(map.len(), 2);
    }

    #[test]
    fn flat_mapping_preserves_insertion_order() {
        let mut map = IdentityMap::new();
        map.put("comments", Id::from(11), hash(json!({"id": 11})));
        map.put("authors", Id::from(5), hash(json!({"id": 5})));
        map.put("comments", Id::from(10), hash(json!({"id": 10})));

        let flat = map.to_flat_mapping();
        assert_eq!(
            Value::Object(flat),
            json!({
                "comments": [{"id": 11}, {"id": 10}],
                "authors": [{"id": 5}],
            })
        );
        assert_eq!(map.type_keys().collect::<Vec<_>>(), ["comments", "authors"]);

        let keys: Vec<String> = map.into_flat_mapping().keys().cloned().collect();
        assert_eq!(keys, ["comments", "authors"]);
    }

    #[test]
    fn reserve_keeps_discovery_position() {
        let mut map = IdentityMap::new();
        assert!(map.reserve("authors", Id::from(5)));
        assert!(!map.reserve("authors", Id::from(5)));
        assert!(!map.contains("authors", &Id::from(5)));

        map.put("posts", Id::from(2), hash(json!({"id": 2})));
        assert!(map.put("authors", Id::from(5), hash(json!({"id": 5}))));
        assert!(!map.put("authors", Id::from(5), hash(json!({"id": 6}))));

        assert_eq!(
            Value::Object(map.to_flat_mapping()),
            json!({"authors": [{"id": 5}], "posts": [{"id": 2}]})
        );
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn unfilled_reservations_are_not_emitted() {
        let mut map = IdentityMap::new();
        map.reserve("comments", Id::from(10));

        assert!(map.is_empty());
        assert_eq!(Value::Object(map.into_flat_mapping()), json!({"comments": []}));
    }

    #[test]
    fn empty_map_flattens_to_empty_object() {
        let map = IdentityMap::new();
        assert!(map.is_empty());
        assert!(map.to_flat_mapping().is_empty());
    }
}
