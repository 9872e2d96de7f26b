// WebAuthn Vault — Uncompressed EC point assembly
//
// Layout: 0x04 || X (32 bytes) || Y (32 bytes). Lengths are checked before
// anything is handed to the curve decoder.

use p256::PublicKey as P256PublicKey;

use super::CodecError;
use crate::store::PublicKey;

/// Width of a P-256 field element in bytes.
pub const COORDINATE_LEN: usize = 32;

/// Length of the SEC1 uncompressed encoding of a P-256 point.
pub const UNCOMPRESSED_POINT_LEN: usize = 1 + 2 * COORDINATE_LEN;

const UNCOMPRESSED_TAG: u8 = 0x04;

/// Build the 65-byte uncompressed encoding from raw coordinates.
pub fn assemble_uncompressed_point(
    x: &[u8],
    y: &[u8],
) -> Result<[u8; UNCOMPRESSED_POINT_LEN], CodecError> {
    if x.len() != COORDINATE_LEN || y.len() != COORDINATE_LEN {
        return Err(CodecError::CoordinateLength {
            x: x.len(),
            y: y.len(),
        });
    }

    let mut point = [0u8; UNCOMPRESSED_POINT_LEN];
    point[0] = UNCOMPRESSED_TAG;
    point[1..=COORDINATE_LEN].copy_from_slice(x);
    point[COORDINATE_LEN + 1..].copy_from_slice(y);
    Ok(point)
}

/// Decode a stored public key into a P-256 point suitable for ECDSA verification.
///
/// Fails with [`CodecError::CoordinateLength`] before any decoding when either
/// coordinate is not exactly 32 bytes, and with [`CodecError::InvalidPoint`]
/// when the coordinates do not describe a point on the curve.
pub fn format_public_key(pk: &PublicKey) -> Result<P256PublicKey, CodecError> {
    let bytes = assemble_uncompressed_point(&pk.x, &pk.y)?;
    P256PublicKey::from_sec1_bytes(&bytes).map_err(|_| CodecError::InvalidPoint)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
