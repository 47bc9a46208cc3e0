//! # Ledger Sessions
//!
//! A [`LedgerSession`] owns the receipt ledger of one operator session and
//! is passed explicitly through each interaction. It is created empty and
//! cleared after each confirmed mirror publish.
//!
//! ## Clearing Rule
//!
//! Once a mirror update has published the merged snapshot and the pointer
//! write is confirmed, those rows are part of the persisted ledger. Keeping
//! them would append them a second time on the next update, so
//! [`LedgerSession::mirror`] clears the accumulator on success. On any
//! failure the rows are kept and the next update retries them.
//!
//! A pointer write that timed out or was cancelled may still be mined. The
//! session remembers the snapshot address and how many rows it covered; if
//! the next update finds the contract pointing at that address, those rows
//! are already persisted and are dropped before merging.

use ccon_core::{Address, ContentAddress, LedgerTable, TransactionReceipt, Wei};
use ccon_gateway::{BlockInfo, CancellationToken, ContractReceipt};

use crate::accumulator::ReceiptAccumulator;
use crate::error::MirrorError;
use crate::mirror::{LedgerMirror, MirrorOutcome};

/// The explicitly owned ledger state of one operator session.
#[derive(Debug, Clone, Default)]
pub struct LedgerSession {
    accumulator: ReceiptAccumulator,
    last_pointer: Option<ContentAddress>,
    mirrored_rows: usize,
    unconfirmed: Option<(ContentAddress, usize)>,
}

impl LedgerSession {
    /// A fresh session with an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mined transaction in this session.
    pub fn add_block(
        &mut self,
        receipt: &ContractReceipt,
        contract_balance: Wei,
        block: &BlockInfo,
    ) -> TransactionReceipt {
        self.accumulator
            .add_block(receipt, contract_balance, block)
            .clone()
    }

    /// Rows accumulated since the last confirmed publish.
    pub fn receipts(&self) -> &[TransactionReceipt] {
        self.accumulator.receipts()
    }

    /// Rows accumulated since the last confirmed publish, as a table.
    pub fn pending_table(&self) -> LedgerTable {
        self.accumulator.to_table()
    }

    /// Number of rows not yet mirrored.
    pub fn pending_len(&self) -> usize {
        self.accumulator.len()
    }

    /// Pointer written by this session's last successful mirror.
    pub fn last_pointer(&self) -> Option<&ContentAddress> {
        self.last_pointer.as_ref()
    }

    /// Rows this session has mirrored in total.
    pub fn mirrored_rows(&self) -> usize {
        self.mirrored_rows
    }

    /// Drop every pending row.
    pub fn clear(&mut self) {
        self.accumulator.clear();
    }

    /// Snapshot address of a pointer write that was submitted but never
    /// confirmed, if one is outstanding.
    pub fn unconfirmed_pointer(&self) -> Option<&ContentAddress> {
        self.unconfirmed.as_ref().map(|(pointer, _)| pointer)
    }

    /// Mirror the pending rows, acting as `owner`.
    ///
    /// On success the pending rows are cleared. On failure they are kept.
    pub async fn mirror(
        &mut self,
        mirror: &LedgerMirror,
        owner: &Address,
        cancel: &CancellationToken,
    ) -> Result<MirrorOutcome, MirrorError> {
        if let Some((published, covered)) = self.unconfirmed.clone() {
            if mirror.pointer().await?.as_ref() == Some(&published) {
                tracing::info!(pointer = %published, rows = covered, "unconfirmed pointer write landed");
                self.settle(covered, &published);
            }
            self.unconfirmed = None;
        }

        let rows = self.accumulator.len();
        let result = mirror
            .update_ledger(self.accumulator.receipts(), owner, cancel)
            .await;
        match result {
            Ok(outcome) => {
                self.settle(rows, &outcome.pointer);
                Ok(outcome)
            }
            Err(err) => {
                self.unconfirmed = err.unconfirmed_pointer().map(|p| (p.clone(), rows));
                Err(err)
            }
        }
    }

    fn settle(&mut self, rows: usize, pointer: &ContentAddress) {
        self.accumulator.drain_front(rows);
        self.mirrored_rows += rows;
        self.last_pointer = Some(pointer.clone());
    }
}
