use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Authentication error: {0}")]
    #[diagnostic(code(jobscout::auth))]
    Auth(String),

    #[error("Mail fetch error: {0}")]
    #[diagnostic(code(jobscout::fetch))]
    Fetch(String),

    #[error("Calendar scheduling error: {0}")]
    #[diagnostic(code(jobscout::schedule))]
    Schedule(String),

    #[error("Language model error: {0}")]
    #[diagnostic(code(jobscout::language_model))]
    LanguageModel(String),

    #[error("Environment error: {0}")]
    #[diagnostic(code(jobscout::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(jobscout::config))]
    Config(String),

    #[error(transparent)]
    #[diagnostic(code(jobscout::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(jobscout::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(jobscout::other))]
    Other(String),
}

// Implement From for TOML deserialization errors
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
pub type ScoutResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create authentication errors
pub fn auth_error(message: &str) -> Error {
    Error::Auth(message.to_string())
}

/// Helper to create mail fetch errors
pub fn fetch_error(message: &str) -> Error {
    Error::Fetch(message.to_string())
}

/// Helper to create calendar scheduling errors
pub fn schedule_error(message: &str) -> Error {
    Error::Schedule(message.to_string())
}

/// Helper to create configuration errors
#[allow(dead_code)]
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}
