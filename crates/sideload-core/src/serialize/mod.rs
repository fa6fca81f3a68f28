//! Module: serialize
//! Responsibility: walk an entity graph and assemble the side-loaded document.
//! Does not own: include parsing (`includes`) or serializer lookup (`registry`).
//!
//! Invariants:
//! - A `(bucket, id)` pair appears at most once in `linked`.
//! - Primary order follows the input; has-many id lists follow the relation.
//! - An entity that is a primary resource of the pass is never side-loaded.
//! - Each entity's hash is built once, yet every requested path is walked to
//!   its leaf: a seen entity is revisited for its deeper paths only.
//! - The first error aborts the pass; no partial document is returned.

mod context;
mod walker;


pub use context::SerializeContext;

use crate::{
    error::{ErrorClass, ErrorOrigin, InternalError},
    includes::{IncludeToken, RelationIncludes},
    model::{
        entity::EntityHandle,
        serializer::{SERIALIZER_SUFFIX, Serializer, SerializerDescriptor},
    },
    obs::sink::{MetricsEvent, record},
    registry::SerializerRegistry,
};
use context::EntityKey;
use derive_more::From;
use serde_json::{Map, Value};
use thiserror::Error as ThisError;
use walker::Walker;

///
/// Constants
///

pub const ID_KEY: &str = "id";
pub const LINKS_KEY: &str = "links";
pub const LINKED_KEY: &str = "linked";
pub const META_KEY: &str = "meta";
pub const META_TYPE_KEY: &str = "type";
pub const META_ROOT_KEY: &str = "root_key";

///
/// AccessError
///
/// A serializer asked for an accessor the entity does not expose.
///

#[derive(Debug, ThisError)]
pub enum AccessError {
    #[error("{type_name} exposes no attribute '{name}'")]
    MissingAttribute { type_name: String, name: String },

    #[error("{type_name} exposes no relation '{name}'")]
    MissingRelation { type_name: String, name: String },
}

impl From<AccessError> for InternalError {
    fn from(err: AccessError) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Entity, err.to_string())
    }
}

///
/// Serializable
///
/// Root input: one entity or an ordered collection.
///

#[derive(Clone, Debug, From)]
pub enum Serializable {
    One(EntityHandle),
    Many(Vec<EntityHandle>),
}

impl Serializable {
    /// Entities in input order; a single entity is a one-element slice.
    #[must_use]
    pub fn entities(&self) -> &[EntityHandle] {
        match self {
            Self::One(entity) => std::slice::from_ref(entity),
            Self::Many(entities) => entities,
        }
    }
}

impl From<Option<EntityHandle>> for Serializable {
    fn from(entity: Option<EntityHandle>) -> Self {
        entity.map_or_else(|| Self::Many(Vec::new()), Self::One)
    }
}

///
/// JsonSerializer
///
/// Entry point for one document. Holds the root input, the requested
/// include paths and any caller metadata; every call to [`Self::as_json`]
/// runs a fresh pass.
///

pub struct JsonSerializer<'a> {
    registry: &'a SerializerRegistry,
    serializer: &'a dyn Serializer,
    serializable: Serializable,
    includes: RelationIncludes,
    meta: Map<String, Value>,
}

impl<'a> JsonSerializer<'a> {
    /// Serialize `serializable` with `serializer` naming the document.
    #[must_use]
    pub fn new(
        registry: &'a SerializerRegistry,
        serializer: &'a dyn Serializer,
        serializable: impl Into<Serializable>,
    ) -> Self {
        Self {
            registry,
            serializer,
            serializable: serializable.into(),
            includes: RelationIncludes::default(),
            meta: Map::new(),
        }
    }

    /// Look up the document serializer by entity type name (`Post`).
    pub fn for_type(
        registry: &'a SerializerRegistry,
        type_name: &str,
        serializable: impl Into<Serializable>,
    ) -> Result<Self, InternalError> {
        let serializer = registry.try_get(&format!("{type_name}{SERIALIZER_SUFFIX}"))?;

        Ok(Self::new(registry, serializer, serializable))
    }

    /// Replace the requested include paths.
    #[must_use]
    pub fn with_includes(mut self, includes: impl Into<RelationIncludes>) -> Self {
        self.includes = includes.into();
        self
    }

    /// Add relations beyond what the caller requested.
    pub fn includes<I, T>(&mut self, tokens: I) -> &mut Self
    where
        I: IntoIterator<Item = T>,
        T: Into<IncludeToken>,
    {
        self.includes.include(tokens);
        self
    }

    /// Merge extra fields into `meta`; later keys win.
    pub fn meta(&mut self, data: Map<String, Value>) -> &mut Self {
        self.meta.extend(data);
        self
    }

    #[must_use]
    pub const fn relation_includes(&self) -> &RelationIncludes {
        &self.includes
    }

    /// Descriptor of the serializer that names the document.
    #[must_use]
    pub fn descriptor(&self) -> &SerializerDescriptor {
        self.serializer.descriptor()
    }

    #[must_use]
    pub fn root_key(&self) -> String {
        self.serializer.descriptor().root_key()
    }

    #[must_use]
    pub fn type_key(&self) -> String {
        self.serializer.descriptor().type_key()
    }

    /// Run the pass into a shared context without assembling the document.
    ///
    /// Every primary is resolved and marked before any hash is built, so a
    /// cyclic include path never side-loads a primary resource.
    pub fn serialize_into(&self, ctx: &mut SerializeContext) -> Result<(), InternalError> {
        let root_key = self.root_key();
        record(MetricsEvent::PassStart {
            root_key: &root_key,
        });

        let entities = self.serializable.entities();
        let mut resolved = Vec::with_capacity(entities.len());
        for entity in entities {
            let serializer = self.registry.resolve(entity.as_ref())?;
            ctx.mark_primary(EntityKey::of(serializer, entity.as_ref()));
            resolved.push((serializer, entity));
        }

        let mut hashes = Vec::with_capacity(resolved.len());
        {
            let mut walker = Walker::new(self.registry, ctx);
            for (serializer, entity) in resolved {
                let hash = walker.primary(serializer, entity.as_ref(), &self.includes)?;
                hashes.push(Value::Object(hash));
            }
        }

        let primaries = hashes.len() as u64;
        ctx.push_primaries(&root_key, hashes)?;
        record(MetricsEvent::PassFinish {
            root_key: &root_key,
            primaries,
            linked: ctx.identity_map().len() as u64,
        });

        Ok(())
    }

    /// Produce the document in a fresh context.
    pub fn as_json(&self) -> Result<Map<String, Value>, InternalError> {
        self.as_json_with(SerializeContext::new())
    }

    /// Produce the document on top of a caller-supplied context.
    pub fn as_json_with(
        &self,
        mut ctx: SerializeContext,
    ) -> Result<Map<String, Value>, InternalError> {
        self.serialize_into(&mut ctx)?;

        Ok(ctx.finish(self.meta_block()))
    }

    /// Produce the document as compact JSON text.
    pub fn to_json(&self) -> Result<String, InternalError> {
        let document = Value::Object(self.as_json()?);

        Ok(serde_json::to_string(&document)?)
    }

    // `{type, root_key}` seeded from the document serializer, then caller fields.
    fn meta_block(&self) -> Map<String, Value> {
        let mut meta = Map::new();
        meta.insert(META_TYPE_KEY.to_string(), Value::from(self.type_key()));
        meta.insert(META_ROOT_KEY.to_string(), Value::from(self.root_key()));
        for (key, value) in &self.meta {
            meta.insert(key.clone(), value.clone());
        }

        meta
    }
}
