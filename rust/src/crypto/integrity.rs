//! Fixed-time comparison of hash strings. Both sides are reduced to SHA-256
//! digests first, so the work done depends only on the input lengths and never
//! on where the two values first differ.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Produces a raw SHA-256 digest of the provided bytes.
pub fn sha256_digest(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compares two byte strings without branching on their contents.
pub fn fixed_time_eq(left: &[u8], right: &[u8]) -> bool {
    let left_digest = sha256_digest(left);
    let right_digest = sha256_digest(right);
    left_digest[..].ct_eq(&right_digest[..]).into()
}
