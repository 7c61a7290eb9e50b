use sha2::{Digest, Sha256};

/// SHA-256 of raw captured text, lowercase hex. Two captures with equal
/// hash are occurrences of the same error.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Short display form of a content hash.
pub fn short_hash(hash: &str) -> &str {
    &hash[..hash.len().min(8)]
}
