//! Error signatures and their stable fingerprints.

use crate::types::Fingerprint;

/// First `tokens` (at least one) whitespace-delimited words of a message,
/// lower-cased.
pub fn signature(message: &str, tokens: usize) -> String {
  message
    .to_lowercase()
    .split_whitespace()
    .take(tokens.max(1))
    .collect::<Vec<_>>()
    .join(" ")
}

/// Compute a stable fingerprint for a signature.
///
/// Uses blake3 for a fast, deterministic hash.
pub fn compute(signature: &str) -> Fingerprint {
  let hash = blake3::hash(signature.as_bytes());
  // First 8 bytes (16 hex chars) is plenty for per-file grouping.
  let hex = hash.to_hex();
  Fingerprint(hex[..16].to_string())
}
