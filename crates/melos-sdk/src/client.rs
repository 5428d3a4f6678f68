//! MelosClient - access node client and execution protocol

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use melos_cadence::{decode_str, ArgumentResolver};
use melos_primitives::{Address, Identifier, KeyIndex};
use serde_json::Value;

use crate::config::NetworkConfig;
use crate::encode::TransactionBody;
use crate::interaction::{Args, Envelope, Interaction, TxRoles};
use crate::signer::{CompositeSignature, Signer};
use crate::transport::{deserialize_response, MockTransport, Transport};
use crate::types::{
    AccountKey, Event, ProposalKey, RestAccount, RestBlock, RestProposalKey, RestScriptRequest,
    RestSignature, RestSubmitted, RestTransaction, RestTransactionResult, TxResult, TxStatus,
    TxWait,
};
use crate::{InteractionResult, SdkError};

#[cfg(feature = "http")]
use crate::transport::HttpTransport;

/// What a sent envelope produced
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Decoded script value
    Value(Value),
    /// Transaction outcome at the awaited status
    Transaction(TxResult),
}

/// Access node client
pub struct MelosClient {
    transport: Box<dyn Transport>,
    config: NetworkConfig,
    resolver: ArgumentResolver,
}

impl MelosClient {
    /// Create a client talking HTTP to the configured access node
    #[cfg(feature = "http")]
    pub fn connect(config: NetworkConfig) -> Self {
        let transport = HttpTransport::new(&config.access_node);
        Self::with_transport(transport, config)
    }

    /// Create a new client with mock transport (for testing)
    pub fn new_mock() -> Self {
        let config = NetworkConfig {
            poll_interval_ms: 0,
            ..NetworkConfig::default()
        };
        Self::with_transport(MockTransport::new(), config)
    }

    /// Create a client with a custom transport
    pub fn with_transport(transport: impl Transport + 'static, config: NetworkConfig) -> Self {
        Self {
            transport: Box::new(transport),
            config,
            resolver: ArgumentResolver::new(),
        }
    }

    /// Replace the argument resolver (and its plugins)
    pub fn with_resolver(mut self, resolver: ArgumentResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Active configuration
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Mutable configuration, read by each call when it starts
    pub fn config_mut(&mut self) -> &mut NetworkConfig {
        &mut self.config
    }

    /// Argument resolver
    pub fn resolver(&self) -> &ArgumentResolver {
        &self.resolver
    }

    /// Resolve an interaction against this client's configuration
    pub fn build(&self, interaction: Interaction) -> Result<Envelope, SdkError> {
        interaction.build(
            &self.config.contracts,
            &self.resolver,
            self.config.default_limit,
        )
    }

    // ==================== Execution ====================

    /// Run a script and decode its value
    pub async fn execute_script(
        &self,
        code: &str,
        args: impl Into<Args>,
    ) -> InteractionResult<Value> {
        self.query(Interaction::new(code).args(args)).await
    }

    /// Run a script interaction, e.g. one carrying call-level addresses
    pub async fn query(&self, interaction: Interaction) -> InteractionResult<Value> {
        let envelope = self.build(interaction)?;
        if envelope.is_transaction() {
            return Err(melos_cadence::CadenceError::Resolution(
                "transaction template cannot run as a script".to_string(),
            )
            .into());
        }
        self.run_script(&envelope).await
    }

    /// Sign, submit and await a transaction
    pub async fn send_transaction(&self, interaction: Interaction) -> InteractionResult<TxResult> {
        let envelope = self.build(interaction)?;
        match envelope.roles {
            Some(ref roles) => self.run_transaction(&envelope, roles).await,
            None => Err(SdkError::MissingField("transaction roles".to_string())),
        }
    }

    /// Send a resolved envelope
    pub async fn send(&self, envelope: &Envelope) -> InteractionResult<Response> {
        match &envelope.roles {
            None => self.run_script(envelope).await.map(Response::Value),
            Some(roles) => self
                .run_transaction(envelope, roles)
                .await
                .map(Response::Transaction),
        }
    }

    async fn run_script(&self, envelope: &Envelope) -> InteractionResult<Value> {
        let request = RestScriptRequest {
            script: BASE64.encode(envelope.code.as_bytes()),
            arguments: envelope
                .argument_bytes()
                .iter()
                .map(|arg| BASE64.encode(arg))
                .collect(),
        };
        tracing::debug!(arguments = request.arguments.len(), "executing script");

        let response = self
            .transport
            .post("/v1/scripts?block_height=sealed", serde_json::to_value(&request)?)
            .await?;
        let encoded = response
            .as_str()
            .ok_or_else(|| SdkError::Serialization(format!("script result is not a string: {}", response)))?;

        let text = String::from_utf8(BASE64.decode(encoded)?)
            .map_err(|e| SdkError::Serialization(e.to_string()))?;
        Ok(decode_str(&text)?)
    }

    async fn run_transaction(&self, envelope: &Envelope, roles: &TxRoles) -> InteractionResult<TxResult> {
        let tx_id = self.submit(envelope, roles).await?;
        self.wait_for(&tx_id, envelope.wait).await
    }

    /// Sign and submit a transaction, returning its id
    pub async fn submit(&self, envelope: &Envelope, roles: &TxRoles) -> InteractionResult<Identifier> {
        let reference_block_id = self.latest_sealed_block_id().await?;

        // Every distinct key is looked up again so rotated or revoked keys are caught
        let mut keys: HashMap<(Address, KeyIndex), AccountKey> = HashMap::new();
        let all = [&roles.proposer, &roles.payer]
            .into_iter()
            .chain(roles.authorizers.iter());
        for signer in all {
            let id = (signer.address(), signer.key_index());
            if !keys.contains_key(&id) {
                let key = self.get_account_key(&id.0, id.1).await?;
                keys.insert(id, key);
            }
        }

        let proposer_id = (roles.proposer.address(), roles.proposer.key_index());
        let sequence_number = keys
            .get(&proposer_id)
            .map(|k| k.sequence_number)
            .ok_or_else(|| SdkError::Account("proposer key missing".to_string()))?;

        let body = TransactionBody {
            script: envelope.code.clone(),
            arguments: envelope.argument_bytes(),
            reference_block_id,
            gas_limit: envelope.limit,
            proposal_key: ProposalKey {
                address: proposer_id.0,
                key_index: proposer_id.1,
                sequence_number,
            },
            payer: roles.payer.address(),
            authorizers: roles.authorizers.iter().map(|a| a.address()).collect(),
        };

        let payload_signatures = sign_payload(&body, roles).await?;
        let envelope_message = body.envelope_message(&payload_signatures)?;
        let envelope_signature = roles.payer.sign(&envelope_message).await?;

        let request = RestTransaction {
            script: BASE64.encode(body.script.as_bytes()),
            arguments: body.arguments.iter().map(|arg| BASE64.encode(arg)).collect(),
            reference_block_id: body.reference_block_id.to_hex(),
            gas_limit: body.gas_limit.to_string(),
            payer: body.payer.to_hex_bare(),
            proposal_key: RestProposalKey {
                address: body.proposal_key.address.to_hex_bare(),
                key_index: body.proposal_key.key_index.to_string(),
                sequence_number: body.proposal_key.sequence_number.to_string(),
            },
            authorizers: body.authorizers.iter().map(|a| a.to_hex_bare()).collect(),
            payload_signatures: payload_signatures
                .iter()
                .map(rest_signature)
                .collect::<Result<_, _>>()?,
            envelope_signatures: vec![rest_signature(&envelope_signature)?],
        };

        let response = self
            .transport
            .post("/v1/transactions", serde_json::to_value(&request)?)
            .await?;
        let submitted: RestSubmitted = deserialize_response(response)?;
        let tx_id = Identifier::from_hex(&submitted.id)
            .map_err(|e| SdkError::Serialization(format!("transaction id: {}", e)))?;

        tracing::info!(
            tx_id = %tx_id,
            proposer = %body.proposal_key.address,
            sequence_number,
            "transaction submitted"
        );
        Ok(tx_id)
    }

    /// Poll until `wait` is satisfied or the transaction expires
    pub async fn wait_for(&self, tx_id: &Identifier, wait: TxWait) -> InteractionResult<TxResult> {
        let interval = Duration::from_millis(self.config.poll_interval_ms);
        let mut last = None;

        loop {
            let result = self.get_transaction_result(tx_id).await?;
            if last != Some(result.status) {
                tracing::debug!(tx_id = %tx_id, status = %result.status, "transaction status");
                last = Some(result.status);
            }

            if wait.is_satisfied_by(result.status) {
                if !result.is_success() {
                    tracing::warn!(
                        tx_id = %tx_id,
                        status = %result.status,
                        error = %result.error_message,
                        "transaction failed on chain"
                    );
                }
                return Ok(result);
            }
            tokio::time::sleep(interval).await;
        }
    }

    // ==================== Queries ====================

    /// Current result of a transaction
    pub async fn get_transaction_result(&self, tx_id: &Identifier) -> InteractionResult<TxResult> {
        let response = self
            .transport
            .get(&format!("/v1/transaction_results/{}", tx_id.to_hex()))
            .await?;
        let raw: RestTransactionResult = deserialize_response(response)?;

        // The transaction already happened: an event that does not decode
        // is kept raw instead of failing the result
        let events = raw
            .events
            .iter()
            .map(|event| Event {
                event_type: event.event_type.clone(),
                data: decode_event_payload(&event.payload).unwrap_or_else(|(e, original)| {
                    tracing::warn!(
                        tx_id = %tx_id,
                        event_type = %event.event_type,
                        error = %e,
                        "keeping undecoded event payload"
                    );
                    original
                }),
            })
            .collect();

        Ok(TxResult {
            tx_id: *tx_id,
            status: TxStatus::from_name(&raw.status),
            status_code: raw.status_code,
            error_message: raw.error_message,
            events,
        })
    }

    /// Look up one key of an account
    pub async fn get_account_key(&self, address: &Address, key_index: KeyIndex) -> InteractionResult<AccountKey> {
        let response = self
            .transport
            .get(&format!("/v1/accounts/{}?expand=keys", address.to_hex_bare()))
            .await?;
        let account: RestAccount = deserialize_response(response)?;

        let key = account
            .keys
            .iter()
            .filter_map(|k| k.parse())
            .find(|k| k.index == key_index)
            .ok_or_else(|| SdkError::Account(format!("{} has no key {}", address, key_index)))?;
        if key.revoked {
            return Err(SdkError::Account(format!("key {} of {} is revoked", key_index, address)));
        }
        Ok(key)
    }

    /// Id of the latest sealed block
    pub async fn latest_sealed_block_id(&self) -> InteractionResult<Identifier> {
        let response = self.transport.get("/v1/blocks?height=sealed").await?;
        let blocks: Vec<RestBlock> = deserialize_response(response)?;
        let block = blocks
            .first()
            .ok_or_else(|| SdkError::MissingField("sealed block".to_string()))?;
        Identifier::from_hex(&block.header.id)
            .map_err(|e| SdkError::Serialization(format!("block id: {}", e)))
    }
}

/// Payload signatures from every signer except the payer, one per key
async fn sign_payload(
    body: &TransactionBody,
    roles: &TxRoles,
) -> Result<Vec<CompositeSignature>, SdkError> {
    let message = body.payload_message();
    let payer = roles.payer.address();

    let mut seen: Vec<(Address, KeyIndex)> = Vec::new();
    let mut signatures = Vec::new();
    let candidates: Vec<&Arc<dyn Signer>> = std::iter::once(&roles.proposer)
        .chain(roles.authorizers.iter())
        .collect();
    for signer in candidates {
        let id = (signer.address(), signer.key_index());
        if id.0 == payer || seen.contains(&id) {
            continue;
        }
        seen.push(id);
        signatures.push(signer.sign(&message).await?);
    }
    Ok(signatures)
}

/// Decoded event data, or the error with the most raw form of the payload
/// that could be recovered (JSON-Cadence, else the base64 text)
fn decode_event_payload(payload: &str) -> Result<Value, (SdkError, Value)> {
    let bytes = BASE64
        .decode(payload)
        .map_err(|e| (SdkError::from(e), Value::String(payload.to_string())))?;
    let text = String::from_utf8(bytes).map_err(|e| {
        (
            SdkError::Serialization(e.to_string()),
            Value::String(payload.to_string()),
        )
    })?;
    decode_str(&text).map_err(|e| {
        let raw = serde_json::from_str(text.trim()).unwrap_or(Value::String(text));
        (SdkError::from(e), raw)
    })
}

fn rest_signature(sig: &CompositeSignature) -> Result<RestSignature, SdkError> {
    Ok(RestSignature {
        address: sig.address.to_hex_bare(),
        key_index: sig.key_index.to_string(),
        signature: BASE64.encode(hex::decode(&sig.signature)?),
    })
}
