// WebAuthn Vault — Top-level error types
//
// Aggregates errors from the codec and store modules into a single error enum
// for the application boundary.

use thiserror::Error;

/// Top-level error type for all WebAuthn Vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Store error: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("Public key error: {0}")]
    Codec(#[from] crate::codec::CodecError),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Seeding failed; the server must not start serving.
    #[error("Initialization failed: {0}")]
    FatalInit(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, VaultError>;
