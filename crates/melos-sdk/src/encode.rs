//! Transaction payload and envelope encoding
//!
//! Signable messages are RLP lists prefixed with a 32-byte domain tag:
//!
//! ```text
//! payload  = [script, [arg...], reference_block_id, gas_limit,
//!             proposer, proposer_key_index, proposer_sequence_number,
//!             payer, [authorizer...]]
//! envelope = [payload, [[signer_index, key_index, signature]...]]
//! ```

use melos_primitives::{Address, ComputeLimit, Identifier};
use rlp::RlpStream;

use crate::signer::CompositeSignature;
use crate::types::ProposalKey;
use crate::SdkError;

const TRANSACTION_TAG: &[u8] = b"FLOW-V0.0-transaction";

/// Domain tag for transaction messages, right-padded with zeros
pub fn transaction_domain_tag() -> [u8; 32] {
    let mut tag = [0u8; 32];
    tag[..TRANSACTION_TAG.len()].copy_from_slice(TRANSACTION_TAG);
    tag
}

/// The signed part of a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionBody {
    /// Cadence source
    pub script: String,
    /// Encoded arguments (JSON-Cadence bytes)
    pub arguments: Vec<Vec<u8>>,
    /// Reference block
    pub reference_block_id: Identifier,
    /// Compute limit
    pub gas_limit: ComputeLimit,
    /// Proposal key
    pub proposal_key: ProposalKey,
    /// Fee payer
    pub payer: Address,
    /// Authorizing accounts, in `prepare` parameter order
    pub authorizers: Vec<Address>,
}

impl TransactionBody {
    /// Distinct signing accounts: proposer, payer, then authorizers
    pub fn signers(&self) -> Vec<Address> {
        let mut signers = Vec::with_capacity(2 + self.authorizers.len());
        let candidates = [self.proposal_key.address, self.payer]
            .into_iter()
            .chain(self.authorizers.iter().copied());
        for address in candidates {
            if !signers.contains(&address) {
                signers.push(address);
            }
        }
        signers
    }

    /// Position of `address` in [`signers`](Self::signers)
    pub fn signer_index(&self, address: &Address) -> Option<usize> {
        self.signers().iter().position(|a| a == address)
    }

    fn append_payload(&self, s: &mut RlpStream) {
        s.begin_list(9);
        s.append(&self.script.as_bytes().to_vec());
        s.begin_list(self.arguments.len());
        for argument in &self.arguments {
            s.append(argument);
        }
        s.append(&self.reference_block_id);
        s.append(&self.gas_limit);
        s.append(&self.proposal_key.address);
        s.append(&u64::from(self.proposal_key.key_index));
        s.append(&self.proposal_key.sequence_number);
        s.append(&self.payer);
        s.begin_list(self.authorizers.len());
        for authorizer in &self.authorizers {
            s.append(authorizer);
        }
    }

    /// RLP encoding of the payload
    pub fn payload_rlp(&self) -> Vec<u8> {
        let mut s = RlpStream::new();
        self.append_payload(&mut s);
        s.out().to_vec()
    }

    /// Message signed by proposer and authorizers
    pub fn payload_message(&self) -> Vec<u8> {
        with_tag(self.payload_rlp())
    }

    /// RLP encoding of the envelope around the given payload signatures
    pub fn envelope_rlp(&self, payload_signatures: &[CompositeSignature]) -> Result<Vec<u8>, SdkError> {
        let mut entries = Vec::with_capacity(payload_signatures.len());
        for sig in payload_signatures {
            let index = self.signer_index(&sig.address).ok_or_else(|| {
                SdkError::SigningFailed(format!("{} is not a signer of this transaction", sig.address))
            })?;
            entries.push((index, sig.key_index, hex::decode(&sig.signature)?));
        }
        entries.sort_by_key(|(index, key_index, _)| (*index, *key_index));

        let mut s = RlpStream::new();
        s.begin_list(2);
        self.append_payload(&mut s);
        s.begin_list(entries.len());
        for (index, key_index, signature) in &entries {
            s.begin_list(3);
            s.append(&(*index as u64));
            s.append(&u64::from(*key_index));
            s.append(signature);
        }
        Ok(s.out().to_vec())
    }

    /// Message signed by the payer
    pub fn envelope_message(&self, payload_signatures: &[CompositeSignature]) -> Result<Vec<u8>, SdkError> {
        Ok(with_tag(self.envelope_rlp(payload_signatures)?))
    }
}

fn with_tag(encoded: Vec<u8>) -> Vec<u8> {
    let mut message = transaction_domain_tag().to_vec();
    message.extend_from_slice(&encoded);
    message
}
