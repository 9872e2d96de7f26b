// WebAuthn Vault — Store error types

use thiserror::Error;

use crate::codec::CodecError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("username already taken: {0}")]
    UsernameTaken(String),

    #[error("SessionType needs to be 'reg' or 'att', got '{0}'")]
    InvalidSessionType(String),

    #[error("Session {0} has expired")]
    SessionExpired(i64),

    #[error("Entropy source failed: {0}")]
    Entropy(String),

    #[error("Public key error: {0}")]
    Codec(#[from] CodecError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid database key — database may be corrupted or key is wrong")]
    InvalidKey,

    #[error("Database connection lock poisoned")]
    LockPoisoned,

    #[error("{0}")]
    Unsupported(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
