//! Error types for LUCA

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("input domain error: {0}")]
    InputDomain(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("conversation not found: {0}")]
    ConversationNotFound(String),

    #[error("config error: {0}")]
    ConfigError(String),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn input_domain(message: impl Into<String>) -> Self {
        Self::InputDomain(message.into())
    }

    pub fn storage_unavailable(message: impl Into<String>) -> Self {
        Self::StorageUnavailable(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Whether the caller supplied a value outside the accepted domain.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::InputDomain(_))
    }
}
