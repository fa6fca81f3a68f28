//! Core runtime for sideload: relation include paths, the per-pass identity
//! map, serializer dispatch, and the engine that assembles side-loaded JSON
//! documents. Ergonomics are exported via the `prelude`.

// public exports are one module level down
pub mod config;
pub mod error;
pub mod identity;
pub mod includes;
pub mod model;
pub mod naming;
pub mod obs;
pub mod registry;
pub mod serialize;

// test
#[cfg(test)]
pub(crate) mod test_fixtures;

///
/// CONSTANTS
///

/// Request parameter that carries include paths unless configured otherwise.
pub const DEFAULT_INCLUDE_PARAM: &str = "include";

///
/// Prelude
///
/// Prelude contains the vocabulary needed to describe and serialize entities.
/// Errors, contexts and observability stay behind their modules.
///

pub mod prelude {
    pub use crate::{
        includes::{IncludeToken, RelationIncludes},
        model::{
            entity::{Entity, EntityHandle, FieldPresence, RelationPresence},
            id::Id,
            serializer::{Serializer, SerializerDescriptor},
        },
        registry::SerializerRegistry,
        serialize::{JsonSerializer, Serializable},
    };
}
