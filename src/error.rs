use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Speech capture error: {0}")]
    #[diagnostic(code(puheapu::capture))]
    Capture(String),

    #[error("Calendar authorization error: {0}")]
    #[diagnostic(code(puheapu::auth))]
    Auth(String),

    #[error("Provider error: {0}")]
    #[diagnostic(code(puheapu::provider))]
    Provider(String),

    #[error("Speech output error: {0}")]
    #[diagnostic(code(puheapu::speech))]
    Speech(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(puheapu::config))]
    Config(String),

    #[error(transparent)]
    #[diagnostic(code(puheapu::io))]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    #[diagnostic(code(puheapu::http))]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(puheapu::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(puheapu::other))]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

// Implement From for TOML deserialization errors
impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type AssistantResult<T> = Result<T, Error>;

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create authorization errors
pub fn auth_error(message: &str) -> Error {
    Error::Auth(message.to_string())
}

/// Helper to create provider errors
pub fn provider_error(message: &str) -> Error {
    Error::Provider(message.to_string())
}

/// Helper to create capture errors
pub fn capture_error(message: &str) -> Error {
    Error::Capture(message.to_string())
}

/// Helper to create speech output errors
pub fn speech_error(message: &str) -> Error {
    Error::Speech(message.to_string())
}
