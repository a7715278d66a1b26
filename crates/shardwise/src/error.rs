use derive_more::Display;
use serde::Serialize;
use shardwise_core::error::{ErrorClass, ErrorOrigin as CoreErrorOrigin, InternalError};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(Debug, Serialize, ThisError)]
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

    /// Whether the deployed rule set or engine configuration is at fault.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self.kind, ErrorKind::Configuration)
    }
}

impl From<InternalError> for Error {
    fn from(err: InternalError) -> Self {
        Self::new(err.class.into(), err.origin.into(), err.message)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::new(ErrorKind::Configuration, ErrorOrigin::Config, err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::new(ErrorKind::Io, ErrorOrigin::Config, err.to_string())
    }
}

///
/// ErrorKind
/// Public error taxonomy for callers.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    /// Rule set or engine configuration is inconsistent. Never retried.
    Configuration,

    /// The statement needs a feature the engine does not provide.
    Unsupported,

    /// A referenced column or parameter does not exist.
    NotFound,

    /// Configuration could not be read.
    Io,

    /// The caller cannot remediate this.
    Internal,
}

impl From<ErrorClass> for ErrorKind {
    fn from(class: ErrorClass) -> Self {
        match class {
            ErrorClass::Configuration => Self::Configuration,
            ErrorClass::Unsupported => Self::Unsupported,
            ErrorClass::NotFound => Self::NotFound,
            ErrorClass::Internal | ErrorClass::InvariantViolation => Self::Internal,
        }
    }
}

///
/// ErrorOrigin
/// Public origin taxonomy for callers.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Serialize)]
pub enum ErrorOrigin {
    Rule,
    Algorithm,
    Condition,
    Route,
    Cache,
    Merge,
    Config,
}

impl From<CoreErrorOrigin> for ErrorOrigin {
    fn from(origin: CoreErrorOrigin) -> Self {
        match origin {
            CoreErrorOrigin::Rule => Self::Rule,
            CoreErrorOrigin::Algorithm => Self::Algorithm,
            CoreErrorOrigin::Condition => Self::Condition,
            CoreErrorOrigin::Route => Self::Route,
            CoreErrorOrigin::Cache => Self::Cache,
            CoreErrorOrigin::Merge => Self::Merge,
            CoreErrorOrigin::Config => Self::Config,
        }
    }
}
