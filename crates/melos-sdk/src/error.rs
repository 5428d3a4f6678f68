//! SDK error types

use melos_cadence::CadenceError;
use thiserror::Error;

/// Outcome of an interaction: exactly one of value or error
pub type InteractionResult<T> = Result<T, SdkError>;

/// SDK error type
#[derive(Debug, Error)]
pub enum SdkError {
    /// Template or argument resolution failed, or a response did not decode
    #[error(transparent)]
    Cadence(#[from] CadenceError),

    /// Transport/network error
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-success response from the access node
    #[error("RPC error: {code} - {message}")]
    Rpc {
        /// HTTP status code
        code: u16,
        /// Error message
        message: String,
    },

    /// Invalid address format
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Invalid private key
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// Signing failed
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    /// Account or account key lookup failed
    #[error("Account error: {0}")]
    Account(String),

    /// Invalid hex string
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Missing required field
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Configuration could not be read, parsed or written
    #[error("Config error: {0}")]
    Config(String),
}

impl From<hex::FromHexError> for SdkError {
    fn from(e: hex::FromHexError) -> Self {
        SdkError::InvalidHex(e.to_string())
    }
}

impl From<base64::DecodeError> for SdkError {
    fn from(e: base64::DecodeError) -> Self {
        SdkError::Serialization(format!("base64: {}", e))
    }
}

impl From<serde_json::Error> for SdkError {
    fn from(e: serde_json::Error) -> Self {
        SdkError::Serialization(e.to_string())
    }
}

impl From<melos_crypto::CryptoError> for SdkError {
    fn from(e: melos_crypto::CryptoError) -> Self {
        match e {
            melos_crypto::CryptoError::InvalidPrivateKey => {
                SdkError::InvalidPrivateKey(e.to_string())
            }
            other => SdkError::SigningFailed(other.to_string()),
        }
    }
}

impl From<melos_primitives::PrimitiveError> for SdkError {
    fn from(e: melos_primitives::PrimitiveError) -> Self {
        SdkError::InvalidAddress(e.to_string())
    }
}

impl From<melos_primitives::AddressError> for SdkError {
    fn from(e: melos_primitives::AddressError) -> Self {
        SdkError::InvalidAddress(e.to_string())
    }
}
