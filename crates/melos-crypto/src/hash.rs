//! SHA3-256 hashing

use sha3::{Digest, Sha3_256};

/// Compute the SHA3-256 digest of the input data
pub fn sha3_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    hasher.update(data);
    hasher.finalize().into()
}
