//! Deterministic verification digests binding an inference to its output.

use sha2::{Digest, Sha256};

/// Compute the audit digest for one served inference.
///
/// The preimage is `"{inference_id}:{input}:{output}"`. Fields are joined
/// with colons in that order and embedded colons are not escaped, so the
/// digest commits to the triple only up to that framing. Returns the
/// lowercase hex SHA-256 of the UTF-8 bytes.
pub fn digest(inference_id: i64, input: &str, output: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}:{}:{}", inference_id, input, output).as_bytes());
    hex::encode(hasher.finalize())
}
