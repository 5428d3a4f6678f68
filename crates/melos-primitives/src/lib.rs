//! # melos-primitives
//!
//! Primitive types shared by the Melos marketplace SDK crates.
//!
//! - [`Address`]: 8-byte chain account address
//! - [`Identifier`]: 32-byte transaction / block identifier

#![warn(missing_docs)]
#![warn(clippy::all)]

mod address;
mod error;
mod identifier;

pub use address::{Address, AddressError};
pub use error::PrimitiveError;
pub use identifier::{Identifier, IdentifierError};

/// Account key index
pub type KeyIndex = u32;

/// Proposal key sequence number
pub type SequenceNumber = u64;

/// Compute limit attached to scripts and transactions
pub type ComputeLimit = u64;
