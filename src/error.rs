//! Error types for the key share vault

use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Master key missing or malformed, or unreadable configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Empty or malformed caller-supplied argument.
    #[error("Invalid argument: {0}")]
    Validation(String),

    /// Envelope could not be decoded or decrypted under the master key.
    #[error("Decryption failed: {0}")]
    Decryption(String),

    /// Durable store read or write failed.
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// Lazy store setup failed. Every caller waiting on the same attempt
    /// receives the same underlying error.
    #[error("Store initialization failed: {0}")]
    Initialization(#[source] Arc<sqlx::Error>),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Reject empty string arguments with a `Validation` error naming the field.
pub(crate) fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::Validation(format!(
            "{} must be a non-empty string",
            field
        )));
    }
    Ok(())
}
