//! # Ledger Mirror
//!
//! Reconciles the contract's ledger pointer with the snapshots held in the
//! content store.
//!
//! ## Update Sequence
//!
//! 1. Read the pointer from the contract.
//! 2. Fetch and decode the snapshot it references, or start empty when the
//!    pointer is unset.
//! 3. Append the session rows after the fetched rows.
//! 4. Publish the merged snapshot and obtain its address.
//! 5. Overwrite the pointer with the new address as the owner, and wait for
//!    the write to be mined.
//! 6. Return the merged snapshot.
//!
//! Any failure in steps 1–4 returns before step 5. A failure in step 5
//! leaves an unreferenced snapshot in the store; content addressing makes
//! that harmless and a retry republishes to the same address. A write that
//! was submitted but not confirmed in time is reported as
//! [`MirrorError::Unconfirmed`] with the snapshot address, because it may
//! still be mined.
//!
//! ## Concurrency
//!
//! Under [`MirrorPolicy::LastWriterWins`] nothing serializes steps 1–5: two
//! sessions that read the same pointer each publish their own merge and the
//! later pointer write wins, dropping the other session's rows from the
//! live snapshot. [`MirrorPolicy::CompareAndSwap`] re-reads the pointer just
//! before the write and aborts with [`MirrorError::PointerMoved`] if it
//! changed. The re-read and the write are separate contract calls, so the
//! check narrows the window rather than closing it.

use std::sync::Arc;

use ccon_core::{Address, ContentAddress, LedgerTable, TransactionReceipt};
use ccon_gateway::{
    wait_for_receipt, CallOptions, CancellationToken, ConfirmationPolicy, ContractGateway,
    ContractReceipt, GatewayError,
};
use ccon_store::ContentStore;
use serde::{Deserialize, Serialize};

use crate::error::MirrorError;

/// How the pointer write treats concurrent writers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MirrorPolicy {
    /// Write unconditionally; the last writer wins.
    #[default]
    LastWriterWins,
    /// Abort if the pointer moved since it was first read.
    CompareAndSwap,
}

impl std::str::FromStr for MirrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "last-writer-wins" => Ok(Self::LastWriterWins),
            "compare-and-swap" => Ok(Self::CompareAndSwap),
            other => Err(format!(
                "unknown mirror policy {other:?} (expected last-writer-wins or compare-and-swap)"
            )),
        }
    }
}

/// Result of a successful mirror update.
#[derive(Debug, Clone)]
pub struct MirrorOutcome {
    /// Previously persisted rows followed by the session rows.
    pub snapshot: LedgerTable,
    /// Address of the published snapshot, now recorded on the contract.
    pub pointer: ContentAddress,
    /// Pointer read in step 1.
    pub previous_pointer: Option<ContentAddress>,
    /// Receipt of the pointer write. `None` when the merged snapshot was
    /// byte-identical to the previous one and no write was needed.
    pub pointer_receipt: Option<ContractReceipt>,
}

/// The ledger as currently persisted.
#[derive(Debug, Clone, Default)]
pub struct PersistedLedger {
    pub pointer: Option<ContentAddress>,
    pub table: LedgerTable,
}

/// Merges session rows into the persisted ledger.
#[derive(Clone)]
pub struct LedgerMirror {
    gateway: Arc<dyn ContractGateway>,
    store: Arc<dyn ContentStore>,
    confirmation: ConfirmationPolicy,
    policy: MirrorPolicy,
}

impl std::fmt::Debug for LedgerMirror {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerMirror")
            .field("store", &self.store.backend())
            .field("confirmation", &self.confirmation)
            .field("policy", &self.policy)
            .finish()
    }
}

impl LedgerMirror {
    /// A mirror with the default confirmation bound and last-writer-wins.
    pub fn new(gateway: Arc<dyn ContractGateway>, store: Arc<dyn ContentStore>) -> Self {
        Self {
            gateway,
            store,
            confirmation: ConfirmationPolicy::default(),
            policy: MirrorPolicy::default(),
        }
    }

    /// Set the pointer write policy.
    pub fn with_policy(mut self, policy: MirrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the bound on waiting for the pointer write.
    pub fn with_confirmation(mut self, confirmation: ConfirmationPolicy) -> Self {
        self.confirmation = confirmation;
        self
    }

    /// The pointer write policy.
    pub fn policy(&self) -> MirrorPolicy {
        self.policy
    }

    /// Read the pointer and the snapshot it references.
    pub async fn persisted_ledger(&self) -> Result<PersistedLedger, MirrorError> {
        let pointer = self.pointer().await?;
        let table = self.snapshot_at(pointer.as_ref()).await?;
        Ok(PersistedLedger { pointer, table })
    }

    /// Merge `rows` into the persisted ledger and point the contract at the
    /// result, acting as `owner`.
    #[tracing::instrument(skip_all, fields(rows = rows.len(), owner = %owner, policy = ?self.policy))]
    pub async fn update_ledger(
        &self,
        rows: &[TransactionReceipt],
        owner: &Address,
        cancel: &CancellationToken,
    ) -> Result<MirrorOutcome, MirrorError> {
        let result = self.update_inner(rows, owner, cancel).await;
        match &result {
            Ok(outcome) => {
                metrics::counter!("ccon_ledger_mirror_updates_total").increment(1);
                metrics::counter!("ccon_ledger_mirror_rows_total").increment(rows.len() as u64);
                tracing::info!(
                    pointer = %outcome.pointer,
                    previous = ?outcome.previous_pointer,
                    snapshot_rows = outcome.snapshot.len(),
                    "ledger mirrored"
                );
            }
            Err(err) => {
                metrics::counter!("ccon_ledger_mirror_failures_total", "stage" => err.stage())
                    .increment(1);
                tracing::warn!(error = %err, stage = err.stage(), "ledger mirror failed");
            }
        }
        result
    }

    async fn update_inner(
        &self,
        rows: &[TransactionReceipt],
        owner: &Address,
        cancel: &CancellationToken,
    ) -> Result<MirrorOutcome, MirrorError> {
        let previous_pointer = self.pointer().await?;
        let previous = self.snapshot_at(previous_pointer.as_ref()).await?;
        let snapshot = LedgerTable::concat(previous, rows);

        let bytes = snapshot.to_canonical_bytes()?;
        let pointer = self
            .store
            .publish(bytes.as_bytes())
            .await
            .map_err(|source| MirrorError::ContentStore {
                stage: "publish",
                source,
            })?;

        if previous_pointer.as_ref() == Some(&pointer) {
            tracing::debug!(%pointer, "snapshot unchanged; pointer write skipped");
            return Ok(MirrorOutcome {
                snapshot,
                pointer,
                previous_pointer,
                pointer_receipt: None,
            });
        }

        if self.policy == MirrorPolicy::CompareAndSwap {
            let current = self.pointer().await?;
            if current != previous_pointer {
                return Err(MirrorError::PointerMoved {
                    expected: previous_pointer,
                    found: current,
                });
            }
        }

        let write = |source| MirrorError::Gateway {
            stage: "write",
            source,
        };
        let pending = self
            .gateway
            .set_ipfs_hash(&pointer, &CallOptions::sender(owner.clone()))
            .await
            .map_err(write)?;
        let receipt = wait_for_receipt(self.gateway.as_ref(), &pending, &self.confirmation, cancel)
            .await
            .map_err(|source| match source {
                GatewayError::ConfirmationTimeout { .. } | GatewayError::Cancelled { .. } => {
                    MirrorError::Unconfirmed {
                        pointer: pointer.clone(),
                        source,
                    }
                }
                source => write(source),
            })?;

        Ok(MirrorOutcome {
            snapshot,
            pointer,
            previous_pointer,
            pointer_receipt: Some(receipt),
        })
    }

    /// Read the contract's ledger pointer.
    pub async fn pointer(&self) -> Result<Option<ContentAddress>, MirrorError> {
        self.gateway
            .ipfs_hash()
            .await
            .map_err(|source| MirrorError::Gateway {
                stage: "read",
                source,
            })
    }

    /// Fetch and decode the snapshot at `pointer`. An unset pointer is the
    /// empty ledger.
    pub async fn snapshot_at(
        &self,
        pointer: Option<&ContentAddress>,
    ) -> Result<LedgerTable, MirrorError> {
        let Some(pointer) = pointer else {
            return Ok(LedgerTable::new());
        };
        let bytes = self
            .store
            .fetch(pointer)
            .await
            .map_err(|source| MirrorError::ContentStore {
                stage: "fetch",
                source,
            })?;
        Ok(LedgerTable::from_slice(&bytes)?)
    }
}
