//! # melos-crypto
//!
//! Cryptographic primitives for the Melos marketplace SDK.
//!
//! - SHA3-256 hashing
//! - ECDSA signing/verification (NIST P-256)
//! - Public key encoding as registered on chain accounts

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod hash;
mod signature;

pub use error::CryptoError;
pub use hash::sha3_256;
pub use signature::{
    private_key_from_hex, public_key_hex, sign, verify, PrivateKey, PublicKey, Signature,
};
