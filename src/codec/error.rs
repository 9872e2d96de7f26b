// WebAuthn Vault — Codec error types

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("Coordinates are not 32 bytes long (x = {x}, y = {y})")]
    CoordinateLength { x: usize, y: usize },

    #[error("Encoded point is not on the P-256 curve")]
    InvalidPoint,
}
