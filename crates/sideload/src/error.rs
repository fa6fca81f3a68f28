use derive_more::Display;
use serde::{Deserialize, Serialize};
use sideload_core::error::{ErrorClass, ErrorOrigin as CoreErrorOrigin, InternalError};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(Debug, Deserialize, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }
}

impl From<InternalError> for Error {
    fn from(err: InternalError) -> Self {
        Self::new(err.class.into(), err.origin.into(), err.message)
    }
}

///
/// ErrorKind
/// Public error taxonomy for callers.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    /// Registration clashed with an existing entry.
    Conflict,

    /// No serializer (or file) exists for the request.
    NotFound,

    /// An entity, config or include request cannot be served as asked.
    Unsupported,

    /// The caller cannot remediate this.
    Internal,
}

impl From<ErrorClass> for ErrorKind {
    fn from(class: ErrorClass) -> Self {
        match class {
            ErrorClass::Conflict => Self::Conflict,
            ErrorClass::NotFound => Self::NotFound,
            ErrorClass::Unsupported => Self::Unsupported,
            ErrorClass::Internal | ErrorClass::InvariantViolation => Self::Internal,
        }
    }
}

///
/// ErrorOrigin
/// Public origin taxonomy for callers.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorOrigin {
    Config,
    Entity,
    Registry,
    Serialize,
}

impl From<CoreErrorOrigin> for ErrorOrigin {
    fn from(origin: CoreErrorOrigin) -> Self {
        match origin {
            CoreErrorOrigin::Config => Self::Config,
            CoreErrorOrigin::Entity => Self::Entity,
            CoreErrorOrigin::Registry => Self::Registry,
            CoreErrorOrigin::Serialize => Self::Serialize,
        }
    }
}
