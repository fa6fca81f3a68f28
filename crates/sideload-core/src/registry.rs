use crate::{
    error::{ErrorClass, ErrorOrigin, InternalError},
    model::{
        entity::Entity,
        serializer::{SERIALIZER_SUFFIX, Serializer},
    },
};
use std::collections::HashMap;
use thiserror::Error as ThisError;

///
/// RegistryError
///

#[derive(Debug, ThisError)]
pub enum RegistryError {
    #[error("serializer '{0}' not found")]
    SerializerNotFound(String),

    #[error("serializer '{0}' already registered")]
    SerializerAlreadyRegistered(String),
}

impl RegistryError {
    pub(crate) const fn class(&self) -> ErrorClass {
        match self {
            Self::SerializerNotFound(_) => ErrorClass::NotFound,
            Self::SerializerAlreadyRegistered(_) => ErrorClass::Conflict,
        }
    }
}

impl From<RegistryError> for InternalError {
    fn from(err: RegistryError) -> Self {
        Self::new(err.class(), ErrorOrigin::Registry, err.to_string())
    }
}

///
/// SerializerRegistry
///
/// Maps `<TypeName>Serializer` names to serializer implementations.
/// Populate once at startup; resolution is a pure lookup.
///

#[derive(Default)]
pub struct SerializerRegistry {
    serializers: HashMap<String, Box<dyn Serializer>>,
}

impl SerializerRegistry {
    /// Create an empty serializer registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a serializer under its conventional name.
    pub fn register(&mut self, serializer: impl Serializer + 'static) -> Result<(), InternalError> {
        let name = serializer.descriptor().serializer_name();
        if self.serializers.contains_key(&name) {
            return Err(RegistryError::SerializerAlreadyRegistered(name).into());
        }

        self.serializers.insert(name, Box::new(serializer));
        Ok(())
    }

    /// Builder-style [`Self::register`].
    pub fn with(mut self, serializer: impl Serializer + 'static) -> Result<Self, InternalError> {
        self.register(serializer)?;
        Ok(self)
    }

    /// Look up a serializer by its full name (`PostSerializer`).
    pub fn try_get(&self, serializer_name: &str) -> Result<&dyn Serializer, InternalError> {
        self.serializers
            .get(serializer_name)
            .map(Box::as_ref)
            .ok_or_else(|| RegistryError::SerializerNotFound(serializer_name.to_string()).into())
    }

    /// Resolve the serializer responsible for an entity's runtime type.
    pub fn resolve(&self, entity: &dyn Entity) -> Result<&dyn Serializer, InternalError> {
        self.try_get(&format!("{}{SERIALIZER_SUFFIX}", entity.type_name()))
    }

    /// Iterate registered serializer names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.serializers.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.serializers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.serializers.is_empty()
    }
}
