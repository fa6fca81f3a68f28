use crate::{
    error::InternalError,
    includes::RelationIncludes,
    model::{
        entity::{Entity, EntityHandle, FieldPresence, RelationPresence},
        serializer::{Serializer, SerializerDescriptor},
    },
    naming::pluralize,
    obs::sink::{MetricsEvent, record},
    registry::SerializerRegistry,
    serialize::{
        AccessError, ID_KEY, LINKS_KEY,
        context::{EntityKey, SerializeContext},
    },
};
use serde_json::{Map, Value};

///
/// Walker
///
/// Depth-first traversal for one pass. Builds each entity hash and
/// side-loads requested relations into the context's identity map.
///

pub(super) struct Walker<'a> {
    registry: &'a SerializerRegistry,
    ctx: &'a mut SerializeContext,
}

impl<'a> Walker<'a> {
    pub(super) const fn new(registry: &'a SerializerRegistry, ctx: &'a mut SerializeContext) -> Self {
        Self { registry, ctx }
    }

    /// Serialize one primary resource. Its key must already be marked primary.
    pub(super) fn primary(
        &mut self,
        serializer: &dyn Serializer,
        entity: &dyn Entity,
        includes: &RelationIncludes,
    ) -> Result<Map<String, Value>, InternalError> {
        let key = EntityKey::of(serializer, entity);
        let hash = self.entity_hash(serializer, entity, includes)?;
        record(MetricsEvent::EntitySerialized {
            type_key: key.root_key(),
        });

        Ok(hash)
    }

    // `{id, attributes..., links: {...}}`, then side-loads for `includes`.
    fn entity_hash(
        &mut self,
        serializer: &dyn Serializer,
        entity: &dyn Entity,
        includes: &RelationIncludes,
    ) -> Result<Map<String, Value>, InternalError> {
        let descriptor = *serializer.descriptor();

        let mut hash = Map::new();
        hash.insert(ID_KEY.to_string(), entity.id().to_value());
        for &name in descriptor.attributes {
            hash.insert(name.to_string(), attribute_value(serializer, entity, name)?);
        }

        let mut links = Map::new();
        for &name in descriptor.has_ones {
            links.insert(name.to_string(), has_one_link(entity, name)?);
        }

        // Materialize each has-many once; the ids and the side-load share it.
        let mut collections = Vec::with_capacity(descriptor.has_manys.len());
        for &name in descriptor.has_manys {
            let related = related_many(entity, name)?;
            let ids = related.iter().map(|item| item.id().to_value()).collect();
            links.insert(name.to_string(), Value::Array(ids));
            collections.push((name, related));
        }
        hash.insert(LINKS_KEY.to_string(), Value::Object(links));

        self.sideload_relations(&descriptor, entity, includes, collections)?;

        Ok(hash)
    }

    // Side-load pass for an entity whose hash is stored (or being built)
    // elsewhere. Only the requested relations are materialized.
    fn revisit(
        &mut self,
        serializer: &dyn Serializer,
        entity: &dyn Entity,
        includes: &RelationIncludes,
    ) -> Result<(), InternalError> {
        if includes.is_empty() {
            return Ok(());
        }

        let descriptor = *serializer.descriptor();
        let mut collections = Vec::new();
        for &name in descriptor.has_manys {
            if includes.includes_relation(name) {
                collections.push((name, related_many(entity, name)?));
            }
        }

        self.sideload_relations(&descriptor, entity, includes, collections)
    }

    fn sideload_relations(
        &mut self,
        descriptor: &SerializerDescriptor,
        entity: &dyn Entity,
        includes: &RelationIncludes,
        collections: Vec<(&'static str, Vec<EntityHandle>)>,
    ) -> Result<(), InternalError> {
        for &name in descriptor.has_ones {
            if !includes.includes_relation(name) {
                continue;
            }
            if let Some(related) = related_one(entity, name)? {
                let nested = includes.nested_includes_for(name).unwrap_or_default();
                self.sideload(&pluralize(name), related.as_ref(), &nested)?;
            }
        }

        for (name, related) in collections {
            if !includes.includes_relation(name) {
                continue;
            }
            let nested = includes.nested_includes_for(name).unwrap_or_default();
            for item in &related {
                self.sideload(name, item.as_ref(), &nested)?;
            }
        }

        Ok(())
    }

    // Serialize a related entity into `bucket` unless this pass has already
    // seen it as a primary, as an ancestor on the current path, or in the map.
    // A seen entity is never hashed again, but deeper requested paths below
    // it are still walked. Each revisit consumes one include level, so the
    // walk terminates on any cyclic graph.
    fn sideload(
        &mut self,
        bucket: &str,
        entity: &dyn Entity,
        includes: &RelationIncludes,
    ) -> Result<(), InternalError> {
        let registry = self.registry;
        let serializer = registry.resolve(entity)?;
        let key = EntityKey::of(serializer, entity);
        if self.ctx.is_primary(&key) || self.ctx.is_in_progress(&key) {
            return self.revisit(serializer, entity, includes);
        }

        let id = entity.id();
        if self.ctx.identity_map().contains(bucket, &id) {
            record(MetricsEvent::IdentityHit { type_key: bucket });
            return self.revisit(serializer, entity, includes);
        }
        if !self.ctx.identity_map_mut().reserve(bucket, id.clone()) {
            return self.revisit(serializer, entity, includes);
        }

        self.ctx.enter(key.clone());
        let hash = self.entity_hash(serializer, entity, includes);
        self.ctx.leave(&key);

        self.ctx.identity_map_mut().put(bucket, id, hash?);
        record(MetricsEvent::EntitySerialized { type_key: bucket });

        Ok(())
    }
}

// Serializer override first, then the entity's own field.
fn attribute_value(
    serializer: &dyn Serializer,
    entity: &dyn Entity,
    name: &str,
) -> Result<Value, InternalError> {
    if let Some(value) = serializer.attribute(entity, name) {
        return Ok(value);
    }

    match entity.field(name) {
        FieldPresence::Present(value) => Ok(value),
        FieldPresence::Missing => Err(AccessError::MissingAttribute {
            type_name: entity.type_name().to_string(),
            name: name.to_string(),
        }
        .into()),
    }
}

// Prefer the `<relation>_id` field so the related entity need not be loaded.
fn has_one_link(entity: &dyn Entity, name: &str) -> Result<Value, InternalError> {
    if let FieldPresence::Present(id) = entity.field(&format!("{name}_id")) {
        return Ok(id);
    }

    Ok(related_one(entity, name)?.map_or(Value::Null, |related| related.id().to_value()))
}

fn related_one(entity: &dyn Entity, name: &str) -> Result<Option<EntityHandle>, InternalError> {
    match entity.related_one(name) {
        RelationPresence::Present(related) => Ok(related),
        RelationPresence::Missing => Err(missing_relation(entity, name)),
    }
}

fn related_many(entity: &dyn Entity, name: &str) -> Result<Vec<EntityHandle>, InternalError> {
    match entity.related_many(name) {
        RelationPresence::Present(related) => Ok(related),
        RelationPresence::Missing => Err(missing_relation(entity, name)),
    }
}

fn missing_relation(entity: &dyn Entity, name: &str) -> InternalError {
    AccessError::MissingRelation {
        type_name: entity.type_name().to_string(),
        name: name.to_string(),
    }
    .into()
}
