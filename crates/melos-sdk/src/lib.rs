//! # melos-sdk
//!
//! Rust SDK for the Melos NFT marketplace.
//!
//! ## Features
//!
//! - **MelosClient**: access node client running the send/await/decode protocol
//! - **BaseSdk**: placeholder templating over the client
//! - **Interaction**: fluent builder for scripts and transactions
//! - **KeySigner**: P-256 account key signing
//! - **NetworkConfig**: per-network contract addresses and defaults
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use melos_sdk::{BaseSdk, Interaction, KeySigner, MelosClient, NetworkConfig, Network};
//! use melos_primitives::Address;
//! use serde_json::json;
//! use std::collections::HashMap;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = NetworkConfig::for_network(Network::Emulator);
//!     let sdk = BaseSdk::new(MelosClient::connect(config));
//!     let none = HashMap::<String, String>::new();
//!
//!     // Read a balance
//!     let balance = sdk
//!         .execute_script(
//!             "import FungibleToken from 0xFUNGIBLETOKEN\n\
//!              pub fun main(owner: Address): UFix64 { return 0.0 }",
//!             &none,
//!             vec![json!("0xf8d6e0586b0a20c7")],
//!         )
//!         .await?;
//!     println!("Balance: {}", balance);
//!
//!     // List an NFT, waiting until the transaction is executed
//!     let seller = Address::from_hex("0xf8d6e0586b0a20c7")?;
//!     let signer = KeySigner::from_hex(seller, "<private key hex>", 0)?;
//!     let result = sdk
//!         .send_transaction(
//!             Interaction::new(
//!                 "import %NFT_NAME% from %NFT_ADDRESS%\n\
//!                  transaction(nftId: UInt64, price: UFix64) { prepare(seller: AuthAccount) {} }",
//!             )
//!             .args(vec![json!(1), json!(12.5)])
//!             .payer(signer)
//!             .wait_for("executed"),
//!             &none,
//!         )
//!         .await?;
//!     println!("Status: {}", result.status);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod client;
pub mod config;
pub mod encode;
mod error;
mod interaction;
mod sdk;
mod signer;
mod transport;
pub mod types;

// Re-export main types
pub use client::{MelosClient, Response};
pub use config::{Network, NetworkConfig};
pub use error::{InteractionResult, SdkError};
pub use interaction::{Args, Envelope, Interaction, TxRoles};
pub use sdk::BaseSdk;
pub use signer::{AccountCredentials, CompositeSignature, KeySigner, Role, Signer};
pub use transport::{Method, MockTransport, RecordedRequest, MOCK_SEALED_BLOCK_ID};

/// Re-export Transport trait for custom implementations
pub use transport::Transport;
pub use types::{Event, TxResult, TxStatus, TxWait};

#[cfg(feature = "http")]
pub use transport::HttpTransport;

// Re-export primitives for convenience
pub use melos_cadence::{Argument, ArgumentPlugin, ArgumentResolver, CadenceError, CadenceValue};
pub use melos_primitives::{Address, Identifier};
