//! Conformance tests for [`ContentStore`] backends.
//!
//! These checks verify that a backend honours the publish/fetch contract.
//! To use them with a custom backend, call [`run`] with a fresh instance.

use ccon_core::{Address, LedgerTable, TransactionReceipt, TxHash, Wei};

use crate::digest;
use crate::error::StoreError;
use crate::traits::ContentStore;

/// Run all conformance checks against a backend.
pub async fn run<S: ContentStore + ?Sized>(store: &S) -> Result<(), StoreError> {
    test_round_trip(store).await?;
    test_same_bytes_same_address(store).await?;
    test_different_bytes_different_address(store).await?;
    test_missing_address(store).await?;
    test_ledger_snapshot_round_trip(store).await?;
    Ok(())
}

/// Build a small ledger for snapshot checks.
pub fn make_test_ledger(rows: u8) -> LedgerTable {
    let mut table = LedgerTable::new();
    for n in 1..=rows {
        table.push(TransactionReceipt {
            contract_balance: Wei::from_ether(u64::from(n)),
            tx_hash: TxHash::from_bytes([n; 32]),
            from: Address::from_bytes([n; 20]),
            to: Address::from_bytes([0xcc; 20]),
            gas_used: 21_000,
            timestamp: 1_650_000_000 + u64::from(n),
        });
    }
    table
}

/// Published bytes come back unchanged.
pub async fn test_round_trip<S: ContentStore + ?Sized>(store: &S) -> Result<(), StoreError> {
    let bytes = b"conformance: round trip".to_vec();
    let address = store.publish(&bytes).await?;
    assert_eq!(store.fetch(&address).await?, bytes);
    Ok(())
}

/// Publishing identical bytes twice yields the same address.
pub async fn test_same_bytes_same_address<S: ContentStore + ?Sized>(
    store: &S,
) -> Result<(), StoreError> {
    let first = store.publish(b"conformance: idempotent").await?;
    let second = store.publish(b"conformance: idempotent").await?;
    assert_eq!(first, second);
    Ok(())
}

/// Publishing different bytes yields a different address.
pub async fn test_different_bytes_different_address<S: ContentStore + ?Sized>(
    store: &S,
) -> Result<(), StoreError> {
    let a = store.publish(b"conformance: a").await?;
    let b = store.publish(b"conformance: b").await?;
    assert_ne!(a, b);
    assert_eq!(store.fetch(&a).await?, b"conformance: a");
    assert_eq!(store.fetch(&b).await?, b"conformance: b");
    Ok(())
}

/// Fetching an address that was never published is `NotFound`.
pub async fn test_missing_address<S: ContentStore + ?Sized>(store: &S) -> Result<(), StoreError> {
    let missing = digest::address_of(b"conformance: never published");
    match store.fetch(&missing).await {
        Err(StoreError::NotFound(address)) => assert_eq!(address, missing),
        other => panic!("expected NotFound for unpublished address, got {other:?}"),
    }
    Ok(())
}

/// A canonical ledger snapshot decodes to the table that was published.
pub async fn test_ledger_snapshot_round_trip<S: ContentStore + ?Sized>(
    store: &S,
) -> Result<(), StoreError> {
    let table = make_test_ledger(3);
    let bytes = table
        .to_canonical_bytes()
        .map_err(|e| StoreError::Config(e.to_string()))?;
    let address = store.publish(bytes.as_bytes()).await?;
    let fetched = store.fetch(&address).await?;
    let decoded =
        LedgerTable::from_slice(&fetched).map_err(|e| StoreError::Config(e.to_string()))?;
    assert_eq!(decoded, table);
    Ok(())
}
