//! # melos-cadence
//!
//! Everything the SDK does to Cadence source text and values before a
//! request leaves the process, and after a response comes back.
//!
//! - **Type classification**: [`TypeDescriptor::classify`]
//! - **Template introspection**: [`introspect`]
//! - **Argument resolution**: [`ArgumentResolver`], with an ordered
//!   [`ArgumentPlugin`] chain
//! - **Templating**: [`apply_placeholders`], [`rewrite_imports`]
//! - **Value codec**: [`CadenceValue`] (JSON-Cadence encoding) and [`decode`]
//!
//! ## Example
//!
//! ```rust
//! use melos_cadence::{introspect, ArgumentResolver, TemplateKind};
//! use serde_json::json;
//!
//! let code = r#"
//!     transaction(listingId: UInt64, price: UFix64) {
//!         prepare(seller: AuthAccount) {}
//!     }
//! "#;
//!
//! let info = introspect(code);
//! assert_eq!(info.kind, TemplateKind::Transaction);
//! assert_eq!(info.signer_count, 1);
//!
//! let args = ArgumentResolver::new()
//!     .resolve_all(&info.declared_args, &[json!(7), json!(12.5)])
//!     .unwrap();
//! assert_eq!(args[1].to_json(), json!({"type": "UFix64", "value": "12.50000000"}));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod decode;
mod error;
mod introspect;
mod resolve;
mod template;
mod types;
mod value;

pub use decode::{decode, decode_str};
pub use error::CadenceError;
pub use introspect::{introspect, split_top_level, DeclaredArg, TemplateInfo, TemplateKind};
pub use resolve::{ArgumentPlugin, ArgumentResolver};
pub use template::{apply_placeholders, rewrite_imports, tokens, Layered, Lookup};
pub use types::{TypeDescriptor, TypeKind};
pub use value::{Argument, CadenceValue, PathDomain};
