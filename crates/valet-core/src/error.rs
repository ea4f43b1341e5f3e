use thiserror::Error;

/// Top-level error type for the Valet system.
///
/// Each variant wraps a subsystem-specific error. Subsystem crates define their
/// own error types and implement `From<SubsystemError> for ValetError` so
/// that the `?` operator works seamlessly across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ValetError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Event bus error: {0}")]
    Bus(String),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Approval error: {0}")]
    Approval(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for ValetError {
    fn from(err: toml::de::Error) -> Self {
        ValetError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ValetError {
    fn from(err: toml::ser::Error) -> Self {
        ValetError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for ValetError {
    fn from(err: serde_json::Error) -> Self {
        ValetError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Valet operations.
pub type Result<T> = std::result::Result<T, ValetError>;
