//! Module: config
//! Responsibility: TOML-backed include policy per serializer.
//! Does not own: include parsing (delegates to `RelationIncludes`).

use crate::{
    DEFAULT_INCLUDE_PARAM,
    error::{ErrorClass, ErrorOrigin, InternalError},
    includes::{IncludeExpansion, IncludeToken, RelationIncludes},
    model::serializer::SerializerDescriptor,
};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashMap},
    hash::BuildHasher,
    path::{Path, PathBuf},
};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub(crate) const fn class(&self) -> ErrorClass {
        match self {
            Self::Io { .. } => ErrorClass::NotFound,
            Self::Parse(_) | Self::Invalid(_) => ErrorClass::Unsupported,
        }
    }
}

impl From<ConfigError> for InternalError {
    fn from(err: ConfigError) -> Self {
        Self::new(err.class(), ErrorOrigin::Config, err.to_string())
    }
}

///
/// SerializerPolicy
///
/// Include policy for one serializer, keyed by serializer name.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SerializerPolicy {
    /// Top-level relations that may be requested; `None` allows any.
    pub query_includes: Option<Vec<String>>,
    /// Relations always side-loaded for this serializer.
    pub default_includes: RelationIncludes,
}

impl SerializerPolicy {
    #[must_use]
    pub fn allows(&self, relation: &str) -> bool {
        self.query_includes
            .as_ref()
            .is_none_or(|allowed| allowed.iter().any(|name| name == relation))
    }
}

///
/// SideloadConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SideloadConfig {
    pub include_param: String,
    pub serializers: BTreeMap<String, SerializerPolicy>,
}

impl Default for SideloadConfig {
    fn default() -> Self {
        Self {
            include_param: DEFAULT_INCLUDE_PARAM.to_string(),
            serializers: BTreeMap::new(),
        }
    }
}

impl SideloadConfig {
    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(input: &str) -> Result<Self, InternalError> {
        let config: Self = toml::from_str(input).map_err(ConfigError::from)?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, InternalError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&content)
    }

    /// Policy registered for a serializer name (`PostSerializer`).
    #[must_use]
    pub fn policy(&self, serializer_name: &str) -> Option<&SerializerPolicy> {
        self.serializers.get(serializer_name)
    }

    /// Read include paths from the configured request parameter.
    #[must_use]
    pub fn includes_from_params<S: BuildHasher>(
        &self,
        params: &HashMap<String, String, S>,
    ) -> RelationIncludes {
        RelationIncludes::from_param(params, &self.include_param)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.include_param.trim().is_empty() {
            return Err(ConfigError::Invalid("include_param cannot be blank".to_string()));
        }

        for (name, policy) in &self.serializers {
            if let Some(token) = policy
                .default_includes
                .iter()
                .find(|token| !policy.allows(token.name()))
            {
                return Err(ConfigError::Invalid(format!(
                    "{name}: default include '{}' is not in query_includes",
                    token.name()
                )));
            }
        }

        Ok(())
    }
}

// Whitelist top-level tokens, then merge the serializer's defaults.
impl IncludeExpansion for SideloadConfig {
    fn expand(
        &self,
        includes: &RelationIncludes,
        serializer: &SerializerDescriptor,
    ) -> Vec<IncludeToken> {
        let Some(policy) = self.policy(&serializer.serializer_name()) else {
            return includes.to_vec();
        };

        includes
            .iter()
            .filter(|token| policy.allows(token.name()))
            .chain(policy.default_includes.iter())
            .cloned()
            .collect()
    }
}
