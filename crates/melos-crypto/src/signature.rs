//! ECDSA signature operations using NIST P-256

use p256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use p256::ecdsa::{Signature as P256Signature, SigningKey, VerifyingKey};
use zeroize::Zeroize;

use crate::CryptoError;

/// ECDSA signature as fixed-width big-endian `r` and `s` scalars
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    /// r component (32 bytes)
    pub r: [u8; 32],
    /// s component (32 bytes)
    pub s: [u8; 32],
}

/// Public key
pub type PublicKey = VerifyingKey;

/// Private key (32 bytes)
pub type PrivateKey = SigningKey;

impl Signature {
    /// Create signature from r, s components
    pub fn new(r: [u8; 32], s: [u8; 32]) -> Self {
        Signature { r, s }
    }

    /// Convert to 64-byte representation (r || s)
    pub fn to_bytes(&self) -> [u8; 64] {
        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(&self.r);
        bytes[32..].copy_from_slice(&self.s);
        bytes
    }

    /// Parse from 64-byte representation
    pub fn from_bytes(bytes: &[u8; 64]) -> Self {
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);
        Signature { r, s }
    }

    /// Hex encoding of r || s (128 lowercase digits, no prefix)
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }
}

/// Sign a 32-byte digest with a private key
pub fn sign(digest: &[u8; 32], private_key: &PrivateKey) -> Result<Signature, CryptoError> {
    let signature: P256Signature = private_key
        .sign_prehash(digest)
        .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;

    let bytes = signature.to_bytes();
    let mut out = [0u8; 64];
    out.copy_from_slice(&bytes);
    Ok(Signature::from_bytes(&out))
}

/// Verify a signature against a digest and public key
pub fn verify(
    digest: &[u8; 32],
    signature: &Signature,
    public_key: &PublicKey,
) -> Result<bool, CryptoError> {
    let p256_sig = P256Signature::from_slice(&signature.to_bytes())
        .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;

    Ok(public_key.verify_prehash(digest, &p256_sig).is_ok())
}

/// Parse a hex-encoded private key (with or without `0x`)
pub fn private_key_from_hex(hex_key: &str) -> Result<PrivateKey, CryptoError> {
    let hex_key = hex_key.strip_prefix("0x").unwrap_or(hex_key);
    let mut bytes = hex::decode(hex_key).map_err(|_| CryptoError::InvalidPrivateKey)?;
    if bytes.len() != 32 {
        bytes.zeroize();
        return Err(CryptoError::InvalidPrivateKey);
    }
    let key = SigningKey::from_slice(&bytes).map_err(|_| CryptoError::InvalidPrivateKey);
    bytes.zeroize();
    key
}

/// Encode a public key the way accounts register it: uncompressed `x || y`
/// as 128 hex digits, without the SEC1 `0x04` tag.
pub fn public_key_hex(public_key: &PublicKey) -> String {
    let encoded = public_key.to_encoded_point(false);
    hex::encode(&encoded.as_bytes()[1..])
}
