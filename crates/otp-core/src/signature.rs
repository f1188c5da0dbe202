//! Webhook signature verification
//!
//! The identity provider signs the raw request body with HMAC-SHA-256 and a
//! shared secret, hex-encoded. Verification runs over the exact bytes that
//! arrived on the wire — re-serializing the parsed body first would change
//! the bytes and break authentic signatures, so handlers must call
//! [`verify_signature`] before any JSON parsing.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Compute the hex-encoded HMAC-SHA-256 signature for a payload.
///
/// This is what the identity provider's action runtime computes on its
/// side; the service itself uses it only in tests and tooling.
pub fn sign(body: &[u8], secret: &[u8]) -> String {
    let mut mac =
        <HmacSha256 as Mac>::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a hex-encoded HMAC-SHA-256 signature over the raw payload bytes.
///
/// Returns `false` (never errors) for a missing, malformed, or mismatching
/// signature. The comparison is constant-time.
pub fn verify_signature(body: &[u8], provided: &str, secret: &[u8]) -> bool {
    let provided = provided.trim();
    if provided.is_empty() {
        return false;
    }
    let Ok(provided_bytes) = hex::decode(provided) else {
        return false;
    };

    let mut mac =
        <HmacSha256 as Mac>::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(body);
    let expected = mac.finalize().into_bytes();

    provided_bytes.ct_eq(expected.as_slice()).into()
}
