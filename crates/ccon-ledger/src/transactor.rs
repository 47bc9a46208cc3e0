//! # Transactor
//!
//! Drives one mutating interaction from submission to ledger row:
//! submit → bounded wait for the receipt → read the contract balance and the
//! latest block → append the row to the session.

use std::future::Future;
use std::sync::Arc;

use ccon_core::TransactionReceipt;
use ccon_gateway::{
    wait_for_receipt, CancellationToken, ConfirmationPolicy, ContractGateway, GatewayError,
    PendingTx,
};

use crate::session::LedgerSession;

/// Confirms contract calls and records them in a session.
#[derive(Clone)]
pub struct Transactor {
    gateway: Arc<dyn ContractGateway>,
    confirmation: ConfirmationPolicy,
}

impl std::fmt::Debug for Transactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transactor")
            .field("confirmation", &self.confirmation)
            .finish()
    }
}

impl Transactor {
    pub fn new(gateway: Arc<dyn ContractGateway>, confirmation: ConfirmationPolicy) -> Self {
        Self {
            gateway,
            confirmation,
        }
    }

    /// The gateway calls are submitted through.
    pub fn gateway(&self) -> &Arc<dyn ContractGateway> {
        &self.gateway
    }

    /// Await `submit`, wait for its receipt and append the resulting row to
    /// `session`.
    ///
    /// # Errors
    ///
    /// Any [`GatewayError`] from submission, confirmation or the follow-up
    /// balance and block reads. Nothing is appended on error.
    pub async fn transact<F>(
        &self,
        session: &mut LedgerSession,
        cancel: &CancellationToken,
        submit: F,
    ) -> Result<TransactionReceipt, GatewayError>
    where
        F: Future<Output = Result<PendingTx, GatewayError>> + Send,
    {
        let pending = submit.await?;
        self.record(session, &pending, cancel).await
    }

    /// Wait for an already submitted transaction and append its row.
    pub async fn record(
        &self,
        session: &mut LedgerSession,
        pending: &PendingTx,
        cancel: &CancellationToken,
    ) -> Result<TransactionReceipt, GatewayError> {
        let receipt =
            wait_for_receipt(self.gateway.as_ref(), pending, &self.confirmation, cancel).await?;
        let contract_balance = self.gateway.balance(&receipt.to).await?;
        let block = self.gateway.latest_block().await?;
        let row = session.add_block(&receipt, contract_balance, &block);
        tracing::info!(
            function = %pending.function,
            tx_hash = %row.tx_hash,
            contract_balance = %row.contract_balance,
            "transaction recorded"
        );
        Ok(row)
    }
}
