use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the account, questionnaire and session stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error while reading or replacing a store file.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The store file exists but is not a JSON object of the expected shape.
    #[error("store file {} is corrupt: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    /// Insert of a key that is already present.
    #[error("'{key}' already exists")]
    Conflict { key: String },
}
