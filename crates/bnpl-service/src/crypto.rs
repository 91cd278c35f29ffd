//! Cryptographic utilities for webhook verification.
//!
//! Merchants sign the raw webhook body with a shared secret; the service
//! recomputes the signature and compares it in constant time.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute HMAC-SHA256 and return hex-encoded result.
///
/// Returns `None` only if the HMAC implementation rejects the key, which
/// HMAC-SHA256 never does for any key length.
#[must_use]
pub fn hmac_sha256_hex(secret: &str, message: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(message);
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Check a hex signature of `body`, with or without a `sha256=` prefix.
#[must_use]
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let signature = signature.trim();
    let signature = signature.strip_prefix("sha256=").unwrap_or(signature);
    hmac_sha256_hex(secret, body)
        .is_some_and(|expected| constant_time_eq(&expected, &signature.to_ascii_lowercase()))
}

/// Constant-time string comparison to prevent timing attacks.
#[must_use]
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
