//! # Receipt Accumulator
//!
//! Turns each confirmed transaction into a ledger row and appends it, in
//! submission order. Field shapes were already validated when the gateway
//! decoded the receipt; the accumulator only pairs them up.

use ccon_core::{LedgerTable, TransactionReceipt, Wei};
use ccon_gateway::{BlockInfo, ContractReceipt};

/// Ordered in-memory ledger for one session.
#[derive(Debug, Clone, Default)]
pub struct ReceiptAccumulator {
    rows: Vec<TransactionReceipt>,
}

impl ReceiptAccumulator {
    /// An empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mined transaction.
    ///
    /// Hash, participants and gas come from `receipt`; the timestamp comes
    /// from `block`; `contract_balance` is the contract's balance read after
    /// the transaction was mined.
    pub fn add_block(
        &mut self,
        receipt: &ContractReceipt,
        contract_balance: Wei,
        block: &BlockInfo,
    ) -> &TransactionReceipt {
        let row = TransactionReceipt {
            contract_balance,
            tx_hash: receipt.tx_hash.clone(),
            from: receipt.from.clone(),
            to: receipt.to.clone(),
            gas_used: receipt.gas_used,
            timestamp: block.timestamp,
        };
        metrics::counter!("ccon_ledger_receipts_accumulated_total").increment(1);
        tracing::debug!(tx_hash = %row.tx_hash, rows = self.rows.len() + 1, "receipt accumulated");
        self.rows.push(row);
        &self.rows[self.rows.len() - 1]
    }

    /// Every accumulated row, in append order.
    pub fn receipts(&self) -> &[TransactionReceipt] {
        &self.rows
    }

    /// The accumulated rows as a table.
    pub fn to_table(&self) -> LedgerTable {
        LedgerTable::from(self.rows.clone())
    }

    /// Number of accumulated rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether nothing has been accumulated.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Drop every accumulated row.
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Drop the oldest `count` rows.
    pub fn drain_front(&mut self, count: usize) {
        let count = count.min(self.rows.len());
        self.rows.drain(..count);
    }
}
