// WebAuthn Vault — Public Key Codec
//
// Turns the raw COSE coordinate bytes stored with a credential back into a
// usable P-256 verifying point. Pure functions only; nothing here touches the
// database.

mod error;
mod point;

pub use error::CodecError;
pub use point::{assemble_uncompressed_point, format_public_key, COORDINATE_LEN, UNCOMPRESSED_POINT_LEN};
