use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the notifier
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Event record has no identifier")]
    #[diagnostic(
        code(campus_notifier::missing_identifier),
        help("supply the storage key as an id hint or discard the record")
    )]
    MissingIdentifier,

    #[error("Validation error: {0}")]
    #[diagnostic(code(campus_notifier::validation))]
    Validation(String),

    #[error("Draft generation failed: {0}")]
    #[diagnostic(code(campus_notifier::generation_failed))]
    GenerationFailed(String),

    #[error("Storage error: {0}")]
    #[diagnostic(code(campus_notifier::storage))]
    Storage(String),

    #[error("Cannot {action} while the draft is {state}")]
    #[diagnostic(code(campus_notifier::invalid_transition))]
    InvalidTransition { action: &'static str, state: String },

    #[error("A draft generation is already in flight")]
    #[diagnostic(code(campus_notifier::busy))]
    Busy,

    #[error("Draft was abandoned before generation finished")]
    #[diagnostic(code(campus_notifier::draft_abandoned))]
    DraftAbandoned,

    #[error("Environment error: {0}")]
    #[diagnostic(code(campus_notifier::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(campus_notifier::config))]
    Config(String),

    #[error(transparent)]
    #[diagnostic(code(campus_notifier::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(campus_notifier::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(campus_notifier::other))]
    Other(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type NotifierResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Invalid environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create validation errors
pub fn validation_error(message: &str) -> Error {
    Error::Validation(message.to_string())
}

/// Helper to create storage errors
pub fn storage_error(message: &str) -> Error {
    Error::Storage(message.to_string())
}

/// Helper to create generation errors
pub fn generation_error(message: &str) -> Error {
    Error::GenerationFailed(message.to_string())
}

/// Helper to create other errors
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}
