//! # Bounded Confirmation
//!
//! Mutating calls return a [`PendingTx`]; the interaction then waits for the
//! transaction to be mined before reading balances and block data. The wait
//! is bounded by [`ConfirmationPolicy::timeout`] and can be cancelled through
//! a [`CancellationToken`]. There is no retry: a timeout is reported and the
//! transaction is left to the chain.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::GatewayError;
use crate::traits::ContractGateway;
use crate::types::{ContractReceipt, PendingTx};

/// Bound and polling cadence of a confirmation wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    /// Give up after this long.
    pub timeout: Duration,
    /// Delay between receipt polls.
    pub poll_interval: Duration,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            poll_interval: Duration::from_secs(1),
        }
    }
}

/// Wait until `pending` is mined.
///
/// # Errors
///
/// - [`GatewayError::ConfirmationTimeout`] once `policy.timeout` elapses.
/// - [`GatewayError::Cancelled`] when `cancel` fires first.
/// - [`GatewayError::CallFailed`] when the transaction was mined but reverted.
/// - Any error from polling the receipt.
pub async fn wait_for_receipt(
    gateway: &dyn ContractGateway,
    pending: &PendingTx,
    policy: &ConfirmationPolicy,
    cancel: &CancellationToken,
) -> Result<ContractReceipt, GatewayError> {
    let poll = async {
        loop {
            if let Some(receipt) = gateway.transaction_receipt(&pending.tx_hash).await? {
                return Ok::<_, GatewayError>(receipt);
            }
            tracing::trace!(tx_hash = %pending.tx_hash, "transaction not yet mined");
            tokio::time::sleep(policy.poll_interval).await;
        }
    };

    let receipt = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::warn!(tx_hash = %pending.tx_hash, function = %pending.function, "confirmation wait cancelled");
            return Err(GatewayError::Cancelled { tx_hash: pending.tx_hash.clone() });
        }
        outcome = tokio::time::timeout(policy.timeout, poll) => match outcome {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(
                    tx_hash = %pending.tx_hash,
                    function = %pending.function,
                    timeout = ?policy.timeout,
                    "confirmation timed out"
                );
                return Err(GatewayError::ConfirmationTimeout {
                    tx_hash: pending.tx_hash.clone(),
                    waited_ms: u64::try_from(policy.timeout.as_millis()).unwrap_or(u64::MAX),
                });
            }
        },
    };

    if !receipt.success {
        return Err(GatewayError::CallFailed {
            function: pending.function.clone(),
            message: "transaction reverted".to_string(),
        });
    }

    tracing::debug!(
        tx_hash = %receipt.tx_hash,
        block = receipt.block_number,
        gas = receipt.gas_used,
        "transaction confirmed"
    );
    Ok(receipt)
}
