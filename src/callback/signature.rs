//! Callback signature scheme
//!
//! The signature is `hex(sha256(canonical))`, where `canonical` is every field
//! except `Signature`, ordered by key bytes, written as `key=value&` pairs
//! with every trailing `&` trimmed, immediately followed by the merchant
//! secret. The trim also eats `&` characters that end the last value.

use super::{fields, CallbackPayload};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

pub fn canonical_string(payload: &CallbackPayload, secret: &str) -> String {
    let pairs: String = payload
        .iter()
        .filter(|(key, _)| *key != fields::SIGNATURE)
        .map(|(key, value)| format!("{}={}&", key, value))
        .collect();

    let mut canonical = pairs.trim_end_matches('&').to_string();
    canonical.push_str(secret);
    canonical
}

/// Lowercase hex SHA-256 signature of `payload` under `secret`.
pub fn sign(payload: &CallbackPayload, secret: &str) -> String {
    let digest = Sha256::digest(canonical_string(payload, secret).as_bytes());
    hex::encode(digest)
}

/// Check `provided` against the expected signature in constant time.
pub fn verify(payload: &CallbackPayload, provided: &str, secret: &str) -> bool {
    let expected = sign(payload, secret);
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}
