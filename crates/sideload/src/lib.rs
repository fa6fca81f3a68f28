//! ## Crate layout
//! - `core`: include paths, identity map, registry, and the serialization engine.
//! - `error`: stable public error type for callers.
//!
//! The `prelude` module mirrors what request handlers need to turn an
//! entity graph plus an include parameter into a side-loaded document.

pub use sideload_core as core;

pub mod error;

pub use error::{Error, ErrorKind, ErrorOrigin};

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

use crate::core::{
    config::SideloadConfig,
    registry::SerializerRegistry,
    serialize::{JsonSerializer, Serializable},
};
use serde_json::{Map, Value};
use std::{collections::HashMap, hash::BuildHasher};

/// Serialize a request's root entities using the configured include
/// parameter and per-serializer policy.
///
/// `type_name` names the document serializer (`Post` -> `PostSerializer`).
pub fn render_request<S: BuildHasher>(
    registry: &SerializerRegistry,
    config: &SideloadConfig,
    type_name: &str,
    serializable: impl Into<Serializable>,
    params: &HashMap<String, String, S>,
) -> Result<Map<String, Value>, Error> {
    let serializer = JsonSerializer::for_type(registry, type_name, serializable)?;
    let includes = config
        .includes_from_params(params)
        .for_query(serializer.descriptor(), config);

    Ok(serializer.with_includes(includes).as_json()?)
}

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        Error,
        core::{config::SideloadConfig, prelude::*},
        render_request,
    };
    pub use serde_json::{Map, Value, json};
}
