use crate::{
    error::InternalError,
    identity::IdentityMap,
    model::{entity::Entity, id::Id, serializer::Serializer},
    serialize::{LINKED_KEY, META_KEY},
};
use serde_json::{Map, Value};
use std::collections::HashSet;

///
/// EntityKey
///
/// Pass-wide identity of one entity: its serializer root key plus id.
/// Unlike identity-map buckets this does not depend on the relation name.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub(crate) struct EntityKey {
    root_key: String,
    id: Id,
}

impl EntityKey {
    pub(crate) fn of(serializer: &dyn Serializer, entity: &dyn Entity) -> Self {
        Self {
            root_key: serializer.descriptor().root_key(),
            id: entity.id(),
        }
    }

    pub(crate) fn root_key(&self) -> &str {
        &self.root_key
    }
}

///
/// SerializeContext
///
/// Mutable state for exactly one serialization pass: the result accumulator,
/// the identity map, and the bookkeeping that breaks cycles.
///
/// Several serializers may share one context to compose a single document.
/// Never reuse a finished context for another pass.
///

#[derive(Debug, Default)]
pub struct SerializeContext {
    result: Map<String, Value>,
    identity_map: IdentityMap,
    primaries: HashSet<EntityKey>,
    in_progress: HashSet<EntityKey>,
}

impl SerializeContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the result accumulator with caller-owned keys.
    #[must_use]
    pub fn with_result(mut self, result: Map<String, Value>) -> Self {
        self.result = result;
        self
    }

    /// Start from a caller-supplied identity map.
    #[must_use]
    pub fn with_identity_map(mut self, identity_map: IdentityMap) -> Self {
        self.identity_map = identity_map;
        self
    }

    #[must_use]
    pub const fn result(&self) -> &Map<String, Value> {
        &self.result
    }

    #[must_use]
    pub const fn identity_map(&self) -> &IdentityMap {
        &self.identity_map
    }

    pub(crate) const fn identity_map_mut(&mut self) -> &mut IdentityMap {
        &mut self.identity_map
    }

    /// Number of primary resources recorded so far.
    #[must_use]
    pub fn primary_count(&self) -> usize {
        self.primaries.len()
    }

    pub(crate) fn mark_primary(&mut self, key: EntityKey) {
        self.primaries.insert(key);
    }

    pub(crate) fn is_primary(&self, key: &EntityKey) -> bool {
        self.primaries.contains(key)
    }

    /// Enter an entity's walk; `false` if it is already being walked.
    pub(crate) fn enter(&mut self, key: EntityKey) -> bool {
        self.in_progress.insert(key)
    }

    pub(crate) fn leave(&mut self, key: &EntityKey) {
        self.in_progress.remove(key);
    }

    pub(crate) fn is_in_progress(&self, key: &EntityKey) -> bool {
        self.in_progress.contains(key)
    }

    /// Append primary hashes under `root_key`, keeping earlier entries.
    pub(crate) fn push_primaries(
        &mut self,
        root_key: &str,
        hashes: Vec<Value>,
    ) -> Result<(), InternalError> {
        let slot = self
            .result
            .entry(root_key)
            .or_insert_with(|| Value::Array(Vec::new()));

        match slot {
            Value::Array(list) => {
                list.extend(hashes);
                Ok(())
            }
            other => Err(InternalError::serialize_invariant(format!(
                "result key '{root_key}' holds {other}, expected a list of resources"
            ))),
        }
    }

    /// Assemble the final document: primaries, then `linked`, then `meta`.
    #[must_use]
    pub fn finish(self, meta: Map<String, Value>) -> Map<String, Value> {
        let mut document = self.result;
        document.insert(
            LINKED_KEY.to_string(),
            Value::Object(self.identity_map.into_flat_mapping()),
        );
        document.insert(META_KEY.to_string(), Value::Object(meta));

        document
    }
}
