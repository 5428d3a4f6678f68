//! Common error types for primitives

use thiserror::Error;
use crate::address::AddressError;
use crate::identifier::IdentifierError;

/// Primitive operation error
#[derive(Debug, Error)]
pub enum PrimitiveError {
    /// Address error
    #[error("address error: {0}")]
    Address(#[from] AddressError),

    /// Identifier error
    #[error("identifier error: {0}")]
    Identifier(#[from] IdentifierError),
}
