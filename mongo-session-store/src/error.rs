//! Error types for store operations.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Store-specific errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Required connection settings are missing or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// The database client could not be constructed
    #[error("Connection error: {0}")]
    Connection(String),

    /// Error raised by the MongoDB driver, passed through unchanged
    #[cfg(feature = "mongodb")]
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    /// A value could not be encoded into a payload
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A stored payload could not be decoded
    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl StoreError {
    /// Check if this error was caused by missing or invalid configuration.
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Check if this error came from connecting to or talking to the database.
    pub fn is_connection_error(&self) -> bool {
        match self {
            Self::Connection(_) => true,
            #[cfg(feature = "mongodb")]
            Self::Mongo(_) => true,
            _ => false,
        }
    }
}
