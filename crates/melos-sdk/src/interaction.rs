//! Interaction builder
//!
//! An [`Interaction`] collects template text, raw or pre-resolved
//! arguments, a compute limit and transaction roles. [`Interaction::build`]
//! turns it into an [`Envelope`]: imports rewritten, arguments resolved
//! against the template's declared parameters, limit and roles defaulted.

use std::collections::BTreeMap;
use std::sync::Arc;

use melos_cadence::{
    introspect, rewrite_imports, Argument, ArgumentResolver, CadenceError, Layered, Lookup,
    TemplateKind,
};
use melos_primitives::ComputeLimit;
use serde_json::Value;

use crate::signer::{Role, Signer};
use crate::types::TxWait;
use crate::SdkError;

/// Arguments for an interaction
#[derive(Debug, Clone)]
pub enum Args {
    /// Plain values, resolved against the template's declared parameters
    Raw(Vec<Value>),
    /// Already resolved; sent as given
    Typed(Vec<Argument>),
}

impl Default for Args {
    fn default() -> Self {
        Args::Raw(Vec::new())
    }
}

impl From<Vec<Value>> for Args {
    fn from(values: Vec<Value>) -> Self {
        Args::Raw(values)
    }
}

impl From<Vec<Argument>> for Args {
    fn from(arguments: Vec<Argument>) -> Self {
        Args::Typed(arguments)
    }
}

/// Script or transaction request before resolution
#[derive(Debug, Clone, Default)]
pub struct Interaction {
    code: String,
    args: Args,
    addresses: BTreeMap<String, String>,
    limit: Option<ComputeLimit>,
    payer: Option<Role>,
    proposer: Option<Role>,
    authorizers: Option<Vec<Role>>,
    wait: TxWait,
}

impl Interaction {
    /// Start from template text
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Default::default()
        }
    }

    /// Template text
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Replace the template text, e.g. after placeholder substitution
    pub fn map_code(mut self, f: impl FnOnce(&str) -> String) -> Self {
        self.code = f(&self.code);
        self
    }

    /// Set arguments
    pub fn args(mut self, args: impl Into<Args>) -> Self {
        self.args = args.into();
        self
    }

    /// Import address for this call only, checked before the configured
    /// contract addresses
    pub fn address(mut self, name: impl Into<String>, address: impl Into<String>) -> Self {
        self.addresses.insert(name.into(), address.into());
        self
    }

    /// Several call-level import addresses, see [`address`](Self::address)
    pub fn addresses<K, V>(mut self, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.addresses
            .extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Set the compute limit
    pub fn limit(mut self, limit: ComputeLimit) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the fee payer (required for transactions)
    pub fn payer(mut self, role: impl Into<Role>) -> Self {
        self.payer = Some(role.into());
        self
    }

    /// Set the proposer (defaults to the payer)
    pub fn proposer(mut self, role: impl Into<Role>) -> Self {
        self.proposer = Some(role.into());
        self
    }

    /// Add an authorizer
    pub fn authorizer(mut self, role: impl Into<Role>) -> Self {
        self.authorizers.get_or_insert_with(Vec::new).push(role.into());
        self
    }

    /// Set all authorizers; an empty list means none
    pub fn authorizers(mut self, roles: Vec<Role>) -> Self {
        self.authorizers = Some(roles);
        self
    }

    /// Status to wait for after submission
    pub fn wait(mut self, wait: TxWait) -> Self {
        self.wait = wait;
        self
    }

    /// Status to wait for, chosen from a free-form word
    pub fn wait_for(self, word: &str) -> Self {
        self.wait(TxWait::from_word(word))
    }

    /// Resolve into an envelope.
    ///
    /// Imports are rewritten with the call-level addresses layered over
    /// `addresses` before introspection. Raw
    /// arguments are resolved against the rewritten template; typed
    /// arguments pass through. When authorizers are not set they default
    /// to the payer, or to none if the template's `prepare` block takes
    /// no accounts.
    pub fn build(
        self,
        addresses: &impl Lookup,
        resolver: &ArgumentResolver,
        default_limit: ComputeLimit,
    ) -> Result<Envelope, SdkError> {
        let code = rewrite_imports(&self.code, &Layered::new(&self.addresses, addresses));
        let info = introspect(&code);

        let arguments = match self.args {
            Args::Raw(values) => resolver.resolve_all(&info.declared_args, &values)?,
            Args::Typed(arguments) => arguments,
        };
        let limit = self.limit.unwrap_or(default_limit);

        let roles = match info.kind {
            TemplateKind::Script => None,
            TemplateKind::Transaction => {
                let payer = self
                    .payer
                    .ok_or_else(|| SdkError::MissingField("payer".to_string()))?;
                let proposer = self.proposer.unwrap_or_else(|| payer.clone());
                let authorizers = match self.authorizers {
                    Some(roles) => roles,
                    None if info.signer_count == 0 => Vec::new(),
                    None => vec![payer.clone()],
                };
                if authorizers.len() != info.signer_count {
                    tracing::warn!(
                        expected = info.signer_count,
                        got = authorizers.len(),
                        "authorizer count does not match prepare parameters"
                    );
                }

                Some(TxRoles {
                    proposer: proposer.into_signer()?,
                    payer: payer.into_signer()?,
                    authorizers: authorizers
                        .into_iter()
                        .map(Role::into_signer)
                        .collect::<Result<_, _>>()?,
                })
            }
            other => {
                return Err(CadenceError::Resolution(format!(
                    "{:?} template cannot be sent as a script or transaction",
                    other
                ))
                .into())
            }
        };

        Ok(Envelope {
            code,
            arguments,
            limit,
            roles,
            wait: self.wait,
        })
    }
}

/// Resolved signing roles of a transaction
#[derive(Clone)]
pub struct TxRoles {
    /// Proposer
    pub proposer: Arc<dyn Signer>,
    /// Fee payer
    pub payer: Arc<dyn Signer>,
    /// Authorizers, in `prepare` parameter order
    pub authorizers: Vec<Arc<dyn Signer>>,
}

impl std::fmt::Debug for TxRoles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TxRoles")
            .field("proposer", &self.proposer.address())
            .field("payer", &self.payer.address())
            .field(
                "authorizers",
                &self.authorizers.iter().map(|a| a.address()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// A resolved request ready to send
#[derive(Debug, Clone)]
pub struct Envelope {
    /// Code with imports rewritten
    pub code: String,
    /// Wire arguments
    pub arguments: Vec<Argument>,
    /// Compute limit
    pub limit: ComputeLimit,
    /// Signing roles; `None` for scripts
    pub roles: Option<TxRoles>,
    /// Status to wait for after submission
    pub wait: TxWait,
}

impl Envelope {
    /// Whether this is a transaction
    pub fn is_transaction(&self) -> bool {
        self.roles.is_some()
    }

    /// Argument bytes as sent on the wire
    pub fn argument_bytes(&self) -> Vec<Vec<u8>> {
        self.arguments.iter().map(Argument::to_bytes).collect()
    }
}
