//! Content-addressed keys for stored requests and bodies.

use sha2::{Digest, Sha256};

/// Compute the storage key for a request URL.
pub fn compute_request_key(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"GET\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

/// SHA-256 digest of a response body, hex encoded.
pub fn compute_body_digest(body: &[u8]) -> String {
    hex::encode(Sha256::digest(body))
}
