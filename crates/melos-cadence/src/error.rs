//! Cadence error types

use thiserror::Error;

/// Errors raised while classifying, resolving or decoding Cadence values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CadenceError {
    /// Unparseable type descriptor or a value of the wrong kind for its type
    #[error("type error: {0}")]
    Type(String),

    /// Fewer raw values than declared parameters
    #[error("arity error: expected {expected} arguments, got {got}")]
    Arity {
        /// Declared parameter count
        expected: usize,
        /// Supplied value count
        got: usize,
    },

    /// Malformed account address
    #[error("address format error: {0}")]
    AddressFormat(String),

    /// Malformed storage/public/private path
    #[error("path format error: {0}")]
    PathFormat(String),

    /// Type has no resolution rule
    #[error("resolution error: {0}")]
    Resolution(String),

    /// Response value could not be decoded
    #[error("decode error: {0}")]
    Decode(String),
}
