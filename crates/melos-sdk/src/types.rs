//! SDK types

use std::fmt;

use melos_primitives::{Address, Identifier, KeyIndex, SequenceNumber};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Transaction status as reported by the access node
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum TxStatus {
    /// Not known to the node
    #[default]
    Unknown,
    /// Received, not yet in a block
    Pending,
    /// Included in a finalized block
    Finalized,
    /// Executed
    Executed,
    /// Sealed
    Sealed,
    /// Reference block expired before inclusion
    Expired,
}

impl TxStatus {
    /// Numeric status code
    pub fn code(&self) -> u8 {
        match self {
            TxStatus::Unknown => 0,
            TxStatus::Pending => 1,
            TxStatus::Finalized => 2,
            TxStatus::Executed => 3,
            TxStatus::Sealed => 4,
            TxStatus::Expired => 5,
        }
    }

    /// Status for a numeric code
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => TxStatus::Pending,
            2 => TxStatus::Finalized,
            3 => TxStatus::Executed,
            4 => TxStatus::Sealed,
            5 => TxStatus::Expired,
            _ => TxStatus::Unknown,
        }
    }

    /// Parse the status name used by the REST API
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "pending" => TxStatus::Pending,
            "finalized" => TxStatus::Finalized,
            "executed" => TxStatus::Executed,
            "sealed" => TxStatus::Sealed,
            "expired" => TxStatus::Expired,
            _ => TxStatus::Unknown,
        }
    }

    /// Whether no further transition can happen
    pub fn is_terminal(&self) -> bool {
        matches!(self, TxStatus::Sealed | TxStatus::Expired)
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TxStatus::Unknown => "Unknown",
            TxStatus::Pending => "Pending",
            TxStatus::Finalized => "Finalized",
            TxStatus::Executed => "Executed",
            TxStatus::Sealed => "Sealed",
            TxStatus::Expired => "Expired",
        };
        f.write_str(name)
    }
}

/// Status a transaction submission waits for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TxWait {
    /// Included in a finalized block
    Finalized,
    /// Executed
    Executed,
    /// Sealed
    #[default]
    Sealed,
}

impl TxWait {
    /// Pick a wait condition from a free-form word.
    ///
    /// Matching is a case-insensitive substring test for `final`, `exec`
    /// or `seal`. Anything else waits for sealing.
    pub fn from_word(word: &str) -> Self {
        let lower = word.to_ascii_lowercase();
        if lower.contains("final") {
            TxWait::Finalized
        } else if lower.contains("exec") {
            TxWait::Executed
        } else if lower.contains("seal") {
            TxWait::Sealed
        } else {
            tracing::warn!(word, "unrecognized wait condition, waiting for sealed");
            TxWait::Sealed
        }
    }

    /// The status that satisfies this condition
    pub fn target(&self) -> TxStatus {
        match self {
            TxWait::Finalized => TxStatus::Finalized,
            TxWait::Executed => TxStatus::Executed,
            TxWait::Sealed => TxStatus::Sealed,
        }
    }

    /// Whether `status` ends the wait
    pub fn is_satisfied_by(&self, status: TxStatus) -> bool {
        status.is_terminal() || status >= self.target()
    }
}

/// Decoded chain event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    /// Fully qualified event type, e.g. `A.0x01.MelosMarketplace.ListingCreated`
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event fields
    pub data: Value,
}

/// Normalized transaction outcome.
///
/// A reverted transaction is still a `TxResult`; inspect `status` and
/// `error_message` to tell it apart from success.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TxResult {
    /// Transaction id
    pub tx_id: Identifier,
    /// Last observed status
    pub status: TxStatus,
    /// Execution status code (0 on success)
    pub status_code: u64,
    /// Execution error, empty on success
    pub error_message: String,
    /// Events in emission order
    pub events: Vec<Event>,
}

impl TxResult {
    /// Whether the transaction executed without error
    pub fn is_success(&self) -> bool {
        self.status_code == 0 && self.error_message.is_empty() && self.status != TxStatus::Expired
    }
}

impl Serialize for TxStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(self.code())
    }
}

/// Account key as returned by the access node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountKey {
    /// Key index on the account
    pub index: KeyIndex,
    /// Current sequence number
    pub sequence_number: SequenceNumber,
    /// Public key hex
    pub public_key: String,
    /// Key weight
    pub weight: u32,
    /// Whether the key was revoked
    pub revoked: bool,
}

/// Proposal key of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProposalKey {
    /// Proposer address
    pub address: Address,
    /// Key index
    pub key_index: KeyIndex,
    /// Sequence number at signing time
    pub sequence_number: SequenceNumber,
}

// ==================== REST wire formats ====================
//
// Numbers travel as decimal strings and binary blobs as base64.

#[derive(Debug, Deserialize)]
pub(crate) struct RestAccount {
    #[serde(default)]
    pub keys: Vec<RestAccountKey>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RestAccountKey {
    pub index: String,
    pub public_key: String,
    pub sequence_number: String,
    #[serde(default)]
    pub weight: Option<String>,
    #[serde(default)]
    pub revoked: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RestBlock {
    pub header: RestBlockHeader,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RestBlockHeader {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct RestScriptRequest {
    pub script: String,
    pub arguments: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RestProposalKey {
    pub address: String,
    pub key_index: String,
    pub sequence_number: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct RestSignature {
    pub address: String,
    pub key_index: String,
    pub signature: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct RestTransaction {
    pub script: String,
    pub arguments: Vec<String>,
    pub reference_block_id: String,
    pub gas_limit: String,
    pub payer: String,
    pub proposal_key: RestProposalKey,
    pub authorizers: Vec<String>,
    pub payload_signatures: Vec<RestSignature>,
    pub envelope_signatures: Vec<RestSignature>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RestSubmitted {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RestTransactionResult {
    pub status: String,
    #[serde(default)]
    pub status_code: u64,
    #[serde(default)]
    pub error_message: String,
    #[serde(default)]
    pub events: Vec<RestEvent>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RestEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub payload: String,
}

impl RestAccountKey {
    pub(crate) fn parse(&self) -> Option<AccountKey> {
        Some(AccountKey {
            index: self.index.parse().ok()?,
            sequence_number: self.sequence_number.parse().ok()?,
            public_key: self.public_key.clone(),
            weight: self
                .weight
                .as_deref()
                .and_then(|w| w.parse().ok())
                .unwrap_or(1000),
            revoked: self.revoked,
        })
    }
}
