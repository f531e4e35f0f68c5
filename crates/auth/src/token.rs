// ============================
// crates/auth/src/token.rs
// ============================
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
/** Secure token generation for remember-me credentials.
This uses OS-provided entropy; uniqueness across live tokens relies on
the token width (24 bytes = 192 bits) being effectively collision-free
rather than any in-core lock. */
use rand::{rngs::OsRng, RngCore};

/// Raw token size in bytes before encoding
const TOKEN_BYTES: usize = 24;

/// Generate a cryptographically secure remember-me token string.
///
/// Returns a base64 URL-safe encoded string without padding.
pub fn generate_token() -> String {
    generate_token_with_size(TOKEN_BYTES)
}

/// Generate a secure random token of `bytes` raw bytes.
pub fn generate_token_with_size(bytes: usize) -> String {
    let mut buffer = vec![0u8; bytes];
    OsRng.fill_bytes(&mut buffer);
    URL_SAFE_NO_PAD.encode(buffer)
}
