//! BaseSdk - templating facade over [`MelosClient`]

use melos_cadence::{apply_placeholders, Layered, Lookup};
use serde_json::Value;

use crate::client::MelosClient;
use crate::interaction::{Args, Interaction};
use crate::types::TxResult;
use crate::InteractionResult;

/// Entry point for marketplace operations.
///
/// Templates pass through placeholder substitution (call-level overrides
/// first, then the configured defaults) before the client rewrites
/// imports, resolves arguments and sends them. Every error is logged here
/// and handed back in the `Err` slot.
pub struct BaseSdk {
    client: MelosClient,
}

impl BaseSdk {
    /// Wrap a client
    pub fn new(client: MelosClient) -> Self {
        Self { client }
    }

    /// Underlying client
    pub fn client(&self) -> &MelosClient {
        &self.client
    }

    /// Mutable client, e.g. to change default placeholders or contracts
    pub fn client_mut(&mut self) -> &mut MelosClient {
        &mut self.client
    }

    /// Substitute placeholders; `overrides` win over configured defaults
    pub fn code(&self, template: &str, overrides: &impl Lookup) -> String {
        let layered = Layered::new(overrides, &self.client.config().placeholders);
        apply_placeholders(template, &layered)
    }

    /// Template a script, run it and decode the value
    pub async fn execute_script(
        &self,
        template: &str,
        overrides: &impl Lookup,
        args: impl Into<Args>,
    ) -> InteractionResult<Value> {
        self.query(Interaction::new(template).args(args), overrides).await
    }

    /// Template a script interaction, run it and decode the value.
    ///
    /// Use this over [`execute_script`](Self::execute_script) to pass
    /// call-level import addresses with [`Interaction::address`].
    pub async fn query(&self, interaction: Interaction, overrides: &impl Lookup) -> InteractionResult<Value> {
        let interaction = interaction.map_code(|code| self.code(code, overrides));
        let result = self.client.query(interaction).await;
        if let Err(e) = &result {
            tracing::error!(error = %e, "script failed");
        }
        result
    }

    /// Template a transaction, then sign, submit and await it
    pub async fn send_transaction(
        &self,
        interaction: Interaction,
        overrides: &impl Lookup,
    ) -> InteractionResult<TxResult> {
        let interaction = interaction.map_code(|code| self.code(code, overrides));
        let result = self.client.send_transaction(interaction).await;
        match &result {
            Ok(tx) => tracing::info!(tx_id = %tx.tx_id, status = %tx.status, "transaction completed"),
            Err(e) => tracing::error!(error = %e, "transaction failed"),
        }
        result
    }
}
