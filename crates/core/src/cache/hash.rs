//! Content-addressed cache key generation.

use sha2::{Digest, Sha256};

/// Compute the key of a stored response inside a named cache.
pub fn compute_cache_key(cache_name: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(cache_name.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}
