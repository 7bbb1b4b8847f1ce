//! Client identity derivation for the anti-duplication guard.

use sha2::{Digest, Sha256};

/// Hashes a client IP address with the configured salt.
///
/// The raw address is never stored; only this salted SHA-256 digest is
/// persisted and compared for duplicate-location detection.
#[must_use]
pub fn hash_ip(ip: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(ip.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}
