//! # Transaction Receipts and the Ledger Table
//!
//! A [`TransactionReceipt`] is one ledger row: the contract balance right
//! after a mutating call, paired with the transaction's hash, participants,
//! gas and block time. A [`LedgerTable`] is an ordered, append-only sequence
//! of rows.
//!
//! ## Persisted Format
//!
//! A serialized table is a JSON array of row objects (records orientation).
//! Every object carries exactly the six [`LEDGER_COLUMNS`]:
//!
//! ```text
//! [{"Contract Balance":"1000","From":"0x…","Gas":21000,"Timestamp":1650000000,"To":"0x…","Tx Hash":"0x…"}]
//! ```
//!
//! `Contract Balance` is a decimal string (see [`Wei`]). Published bytes are
//! canonical (sorted keys), so key order in the blob is alphabetical rather
//! than column order.

use serde::{Deserialize, Serialize};

use crate::amount::Wei;
use crate::canonical::CanonicalBytes;
use crate::error::LedgerFormatError;
use crate::identity::{Address, TxHash};

/// The ledger column set, in display order.
pub const LEDGER_COLUMNS: [&str; 6] = [
    "Contract Balance",
    "Tx Hash",
    "From",
    "To",
    "Gas",
    "Timestamp",
];

/// One immutable ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransactionReceipt {
    /// Contract balance after the transaction was mined.
    #[serde(rename = "Contract Balance")]
    pub contract_balance: Wei,
    /// Hash of the mined transaction.
    #[serde(rename = "Tx Hash")]
    pub tx_hash: TxHash,
    /// Sending account.
    #[serde(rename = "From")]
    pub from: Address,
    /// Receiving account (the contract, for contract calls).
    #[serde(rename = "To")]
    pub to: Address,
    /// Gas consumed by the transaction.
    #[serde(rename = "Gas")]
    pub gas_used: u64,
    /// Block time, seconds since the Unix epoch.
    #[serde(rename = "Timestamp")]
    pub timestamp: u64,
}

impl TransactionReceipt {
    /// Render the row's cells in [`LEDGER_COLUMNS`] order.
    pub fn cells(&self) -> [String; 6] {
        [
            self.contract_balance.to_string(),
            self.tx_hash.to_string(),
            self.from.to_string(),
            self.to.to_string(),
            self.gas_used.to_string(),
            self.timestamp.to_string(),
        ]
    }
}

/// Ordered, append-only sequence of ledger rows.
///
/// Insertion order is chronological submission order. There is deliberately
/// no API to remove or edit a row once appended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedgerTable {
    rows: Vec<TransactionReceipt>,
}

impl LedgerTable {
    /// An empty table (the state before the first publish).
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one row.
    pub fn push(&mut self, receipt: TransactionReceipt) {
        self.rows.push(receipt);
    }

    /// Append rows in iteration order.
    pub fn extend<I: IntoIterator<Item = TransactionReceipt>>(&mut self, rows: I) {
        self.rows.extend(rows);
    }

    /// Merge a previously persisted table with newly accumulated rows.
    ///
    /// Previous rows come first (oldest first), followed by `current` in its
    /// accumulation order. Neither input is reordered or deduplicated.
    pub fn concat(previous: LedgerTable, current: &[TransactionReceipt]) -> LedgerTable {
        let mut merged = previous;
        merged.rows.extend_from_slice(current);
        merged
    }

    /// Rows in order.
    pub fn rows(&self) -> &[TransactionReceipt] {
        &self.rows
    }

    /// Consume into the row vector.
    pub fn into_rows(self) -> Vec<TransactionReceipt> {
        self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The most recent row, if any.
    pub fn last(&self) -> Option<&TransactionReceipt> {
        self.rows.last()
    }

    /// Serialize to the canonical persisted form.
    pub fn to_canonical_bytes(&self) -> Result<CanonicalBytes, LedgerFormatError> {
        Ok(CanonicalBytes::new(self)?)
    }

    /// Decode a persisted snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerFormatError::Malformed`] if the bytes are not a JSON
    /// array of rows carrying exactly the ledger columns.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, LedgerFormatError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl From<Vec<TransactionReceipt>> for LedgerTable {
    fn from(rows: Vec<TransactionReceipt>) -> Self {
        Self { rows }
    }
}

impl IntoIterator for LedgerTable {
    type Item = TransactionReceipt;
    type IntoIter = std::vec::IntoIter<TransactionReceipt>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a LedgerTable {
    type Item = &'a TransactionReceipt;
    type IntoIter = std::slice::Iter<'a, TransactionReceipt>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
