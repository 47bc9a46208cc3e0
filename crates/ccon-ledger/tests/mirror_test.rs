//! Ledger mirror scenarios against the simulated contract and the in-memory
//! content store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ccon_core::{Address, ContentAddress, LedgerTable, TransactionReceipt, TxHash, Wei};
use ccon_gateway::{
    CallOptions, CancellationToken, ConfirmationPolicy, ContractGateway, SimulatedContract,
};
use ccon_ledger::{LedgerMirror, LedgerSession, MirrorError, MirrorPolicy, Transactor};
use ccon_store::{ContentStore, MemContentStore, StoreError};
use tokio::sync::Barrier;

fn row(n: u8) -> TransactionReceipt {
    TransactionReceipt {
        contract_balance: Wei::from(u64::from(n) * 1_000),
        tx_hash: TxHash::from_bytes([n; 32]),
        from: Address::from_bytes([n; 20]),
        to: Address::from_bytes([0xcc; 20]),
        gas_used: 21_000 + u64::from(n),
        timestamp: 1_650_000_000 + u64::from(n),
    }
}

fn owner() -> Address {
    Address::from_bytes([0x33; 20])
}

struct Fixture {
    sim: Arc<SimulatedContract>,
    store: MemContentStore,
    mirror: LedgerMirror,
}

fn fixture() -> Fixture {
    let sim = Arc::new(SimulatedContract::new());
    let store = MemContentStore::new();
    let mirror = LedgerMirror::new(sim.clone(), Arc::new(store.clone()));
    Fixture { sim, store, mirror }
}

/// Publish `rows` as the persisted ledger and point the contract at it.
async fn seed(sim: &SimulatedContract, store: &dyn ContentStore, rows: &[TransactionReceipt]) -> ContentAddress {
    let table = LedgerTable::from(rows.to_vec());
    let bytes = table.to_canonical_bytes().unwrap();
    let pointer = store.publish(bytes.as_bytes()).await.unwrap();
    sim.set_ipfs_hash(&pointer, &CallOptions::sender(owner()))
        .await
        .unwrap();
    pointer
}

async fn snapshot_at(store: &dyn ContentStore, pointer: &ContentAddress) -> LedgerTable {
    LedgerTable::from_slice(&store.fetch(pointer).await.unwrap()).unwrap()
}

#[tokio::test]
async fn first_run_starts_from_empty_table() {
    let f = fixture();
    let rows = vec![row(1), row(2), row(3)];
    let outcome = f
        .mirror
        .update_ledger(&rows, &owner(), &CancellationToken::new())
        .await
        .unwrap();

    assert!(outcome.previous_pointer.is_none());
    assert_eq!(outcome.snapshot.rows(), rows.as_slice());
    assert_eq!(f.sim.pointer(), Some(outcome.pointer.clone()));
    assert_eq!(snapshot_at(&f.store, &outcome.pointer).await, outcome.snapshot);
    let receipt = outcome.pointer_receipt.unwrap();
    assert_eq!(receipt.from, owner());
}

#[tokio::test]
async fn appends_one_row_to_two_row_snapshot() {
    let f = fixture();
    let p1 = seed(&f.sim, &f.store, &[row(1), row(2)]).await;

    let outcome = f
        .mirror
        .update_ledger(&[row(3)], &owner(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.previous_pointer, Some(p1.clone()));
    assert_ne!(outcome.pointer, p1);
    assert_eq!(f.sim.pointer(), Some(outcome.pointer.clone()));
    assert_eq!(outcome.snapshot.rows(), &[row(1), row(2), row(3)]);
    assert_eq!(snapshot_at(&f.store, &outcome.pointer).await.len(), 3);
}

#[tokio::test]
async fn unavailable_store_during_fetch_leaves_pointer_unchanged() {
    let f = fixture();
    let p1 = seed(&f.sim, &f.store, &[row(1), row(2)]).await;
    let writes_before = f.sim.pointer_writes();
    f.store.set_available(false);

    let err = f
        .mirror
        .update_ledger(&[row(3)], &owner(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, MirrorError::ContentStore { stage: "fetch", .. }));
    assert!(!err.reached_pointer_write());
    assert_eq!(f.sim.pointer(), Some(p1));
    assert_eq!(f.sim.pointer_writes(), writes_before);
}

#[tokio::test]
async fn undecodable_snapshot_aborts_before_pointer_write() {
    let f = fixture();
    let junk = f.store.publish(b"{\"not\":\"a ledger\"}").await.unwrap();
    f.sim
        .set_ipfs_hash(&junk, &CallOptions::sender(owner()))
        .await
        .unwrap();

    let err = f
        .mirror
        .update_ledger(&[row(1)], &owner(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, MirrorError::Format(_)));
    assert_eq!(f.sim.pointer(), Some(junk));
}

#[tokio::test]
async fn rejected_pointer_write_leaves_orphan_and_old_pointer() {
    let f = fixture();
    let p1 = seed(&f.sim, &f.store, &[row(1)]).await;
    f.sim.fail_function("setIPFSHash", "caller is not the owner");
    let blobs_before = f.store.len();

    let err = f
        .mirror
        .update_ledger(&[row(2)], &owner(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.reached_pointer_write());
    assert_eq!(f.sim.pointer(), Some(p1));
    assert_eq!(f.store.len(), blobs_before + 1);
}

#[tokio::test]
async fn session_clears_after_confirmed_publish_so_retries_do_not_duplicate() {
    let f = fixture();
    seed(&f.sim, &f.store, &[row(1), row(2)]).await;
    let cancel = CancellationToken::new();

    let mut session = LedgerSession::new();
    let transactor = Transactor::new(f.sim.clone(), Default::default());
    let donor = f.sim.accounts().await.unwrap()[0].clone();
    let amount = Wei(10);
    transactor
        .transact(
            &mut session,
            &cancel,
            f.sim.deposit(amount, &CallOptions::sender(donor).with_value(amount)),
        )
        .await
        .unwrap();
    assert_eq!(session.pending_len(), 1);

    let first = session.mirror(&f.mirror, &owner(), &cancel).await.unwrap();
    assert_eq!(first.snapshot.len(), 3);
    assert_eq!(session.pending_len(), 0);
    assert_eq!(session.mirrored_rows(), 1);

    let writes = f.sim.pointer_writes();
    let second = session.mirror(&f.mirror, &owner(), &cancel).await.unwrap();
    assert_eq!(second.snapshot.len(), 3);
    assert_eq!(second.pointer, first.pointer);
    assert!(second.pointer_receipt.is_none());
    assert_eq!(f.sim.pointer_writes(), writes);
}

#[tokio::test]
async fn failed_mirror_keeps_rows_for_retry() {
    let f = fixture();
    seed(&f.sim, &f.store, &[row(1)]).await;
    let cancel = CancellationToken::new();
    let mut session = LedgerSession::new();
    let transactor = Transactor::new(f.sim.clone(), Default::default());
    let requester = f.sim.accounts().await.unwrap()[5].clone();
    transactor
        .transact(
            &mut session,
            &cancel,
            f.sim.request_cash(Wei(3), &CallOptions::sender(requester)),
        )
        .await
        .unwrap();

    f.store.set_available(false);
    assert!(session.mirror(&f.mirror, &owner(), &cancel).await.is_err());
    assert_eq!(session.pending_len(), 1);

    f.store.set_available(true);
    let outcome = session.mirror(&f.mirror, &owner(), &cancel).await.unwrap();
    assert_eq!(outcome.snapshot.len(), 2);
    assert_eq!(session.pending_len(), 0);
}

fn short_confirmation() -> ConfirmationPolicy {
    ConfirmationPolicy {
        timeout: Duration::from_millis(50),
        poll_interval: Duration::from_millis(5),
    }
}

async fn deposit(
    sim: &Arc<SimulatedContract>,
    session: &mut LedgerSession,
    cancel: &CancellationToken,
) -> TransactionReceipt {
    let transactor = Transactor::new(sim.clone(), Default::default());
    let donor = sim.accounts().await.unwrap()[0].clone();
    let amount = Wei(10);
    transactor
        .transact(
            session,
            cancel,
            sim.deposit(amount, &CallOptions::sender(donor).with_value(amount)),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn retry_after_unconfirmed_pointer_write_does_not_duplicate_rows() {
    let f = fixture();
    let mirror = f.mirror.clone().with_confirmation(short_confirmation());
    let cancel = CancellationToken::new();
    let mut session = LedgerSession::new();
    let first = deposit(&f.sim, &mut session, &cancel).await;

    f.sim.withhold_confirmations(true);
    let err = session.mirror(&mirror, &owner(), &cancel).await.unwrap_err();
    assert!(matches!(err, MirrorError::Unconfirmed { .. }));
    assert!(err.reached_pointer_write());
    assert_eq!(session.pending_len(), 1);
    assert_eq!(session.unconfirmed_pointer(), err.unconfirmed_pointer());

    f.sim.withhold_confirmations(false);
    assert_eq!(f.sim.release_withheld(), 1);

    let writes = f.sim.pointer_writes();
    let outcome = session.mirror(&mirror, &owner(), &cancel).await.unwrap();
    assert_eq!(outcome.snapshot.rows(), &[first]);
    assert!(outcome.pointer_receipt.is_none());
    assert_eq!(f.sim.pointer_writes(), writes);
    assert_eq!(session.pending_len(), 0);
    assert_eq!(session.mirrored_rows(), 1);
    assert!(session.unconfirmed_pointer().is_none());
    assert_eq!(snapshot_at(&f.store, &f.sim.pointer().unwrap()).await.len(), 1);
}

#[tokio::test]
async fn rows_added_after_unconfirmed_write_are_persisted_once() {
    let f = fixture();
    let mirror = f.mirror.clone().with_confirmation(short_confirmation());
    let cancel = CancellationToken::new();
    let mut session = LedgerSession::new();
    let first = deposit(&f.sim, &mut session, &cancel).await;

    f.sim.withhold_confirmations(true);
    assert!(session.mirror(&mirror, &owner(), &cancel).await.is_err());
    f.sim.withhold_confirmations(false);
    f.sim.release_withheld();

    let second = deposit(&f.sim, &mut session, &cancel).await;
    assert_eq!(session.pending_len(), 2);

    let outcome = session.mirror(&mirror, &owner(), &cancel).await.unwrap();
    assert_eq!(outcome.snapshot.rows(), &[first, second]);
    assert!(outcome.pointer_receipt.is_some());
    assert_eq!(session.pending_len(), 0);
    assert_eq!(session.mirrored_rows(), 2);
}

#[tokio::test]
async fn unconfirmed_write_that_never_landed_is_retried_in_full() {
    let f = fixture();
    let p0 = seed(&f.sim, &f.store, &[row(1)]).await;
    let mirror = f.mirror.clone().with_confirmation(short_confirmation());
    let cancel = CancellationToken::new();
    let mut session = LedgerSession::new();
    let first = deposit(&f.sim, &mut session, &cancel).await;

    f.sim.withhold_confirmations(true);
    assert!(session.mirror(&mirror, &owner(), &cancel).await.is_err());
    f.sim.withhold_confirmations(false);
    f.sim.release_withheld();
    // Another writer restores the old pointer before the retry.
    f.sim
        .set_ipfs_hash(&p0, &CallOptions::sender(owner()))
        .await
        .unwrap();

    let outcome = session.mirror(&mirror, &owner(), &cancel).await.unwrap();
    assert_eq!(outcome.snapshot.rows(), &[row(1), first]);
    assert_eq!(session.pending_len(), 0);
}

#[tokio::test]
async fn persisted_ledger_reads_through_pointer() {
    let f = fixture();
    assert!(f.mirror.persisted_ledger().await.unwrap().table.is_empty());

    let p1 = seed(&f.sim, &f.store, &[row(4), row(5)]).await;
    let persisted = f.mirror.persisted_ledger().await.unwrap();
    assert_eq!(persisted.pointer, Some(p1));
    assert_eq!(persisted.table.rows(), &[row(4), row(5)]);
}

/// Content store that holds every publish until `parties` publishes are
/// waiting, so concurrent mirrors all read the pointer before any writes it.
struct GatedStore {
    inner: MemContentStore,
    gate: Barrier,
}

#[async_trait]
impl ContentStore for GatedStore {
    async fn publish(&self, bytes: &[u8]) -> Result<ContentAddress, StoreError> {
        self.gate.wait().await;
        self.inner.publish(bytes).await
    }

    async fn fetch(&self, address: &ContentAddress) -> Result<Vec<u8>, StoreError> {
        self.inner.fetch(address).await
    }

    fn backend(&self) -> &'static str {
        "gated"
    }
}

async fn racing_mirrors(policy: MirrorPolicy) -> (Arc<SimulatedContract>, MemContentStore, [Result<ccon_ledger::MirrorOutcome, MirrorError>; 2]) {
    let sim = Arc::new(SimulatedContract::new());
    let inner = MemContentStore::new();
    seed(&sim, &inner, &[row(1), row(2)]).await;

    let gated = Arc::new(GatedStore {
        inner: inner.clone(),
        gate: Barrier::new(2),
    });
    let mirror = LedgerMirror::new(sim.clone(), gated).with_policy(policy);
    let cancel = CancellationToken::new();
    let (a_rows, b_rows) = ([row(10)], [row(20)]);
    let owner = owner();
    let (a, b) = tokio::join!(
        mirror.update_ledger(&a_rows, &owner, &cancel),
        mirror.update_ledger(&b_rows, &owner, &cancel),
    );
    (sim, inner, [a, b])
}

#[tokio::test]
async fn concurrent_sessions_last_writer_wins_and_one_row_is_lost() {
    let (sim, store, results) = racing_mirrors(MirrorPolicy::LastWriterWins).await;
    assert!(results.iter().all(Result::is_ok));

    let live = snapshot_at(&store, &sim.pointer().unwrap()).await;
    assert_eq!(live.len(), 3);
    let has_a = live.rows().contains(&row(10));
    let has_b = live.rows().contains(&row(20));
    assert!(has_a ^ has_b, "exactly one session's row survives");
}

#[tokio::test]
async fn compare_and_swap_detects_the_race() {
    let (sim, store, results) = racing_mirrors(MirrorPolicy::CompareAndSwap).await;
    let moved = results
        .iter()
        .filter(|r| matches!(r, Err(MirrorError::PointerMoved { .. })))
        .count();
    assert_eq!(moved, 1);
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);

    let live = snapshot_at(&store, &sim.pointer().unwrap()).await;
    assert_eq!(live.len(), 3);
}

#[tokio::test]
async fn transactor_records_contract_balance_after_call() {
    let sim = Arc::new(SimulatedContract::new());
    let transactor = Transactor::new(sim.clone(), Default::default());
    let mut session = LedgerSession::new();
    let donor = sim.accounts().await.unwrap()[0].clone();
    let cancel = CancellationToken::new();

    for ether in [1u64, 2] {
        let amount = Wei::from_ether(ether);
        transactor
            .transact(
                &mut session,
                &cancel,
                sim.deposit(amount, &CallOptions::sender(donor.clone()).with_value(amount)),
            )
            .await
            .unwrap();
    }

    let rows = session.receipts();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].contract_balance, Wei::from_ether(1));
    assert_eq!(rows[1].contract_balance, Wei::from_ether(3));
    assert_eq!(rows[1].from, donor);
    assert_eq!(rows[1].to, sim.contract_address());
    assert!(rows[1].timestamp > rows[0].timestamp);
}

#[tokio::test]
async fn reverted_call_appends_nothing() {
    let sim = Arc::new(SimulatedContract::new());
    sim.fail_function("approveFillOffer", "no offer");
    let transactor = Transactor::new(sim.clone(), Default::default());
    let mut session = LedgerSession::new();
    let nonprofit = sim.accounts().await.unwrap()[3].clone();

    let err = transactor
        .transact(
            &mut session,
            &CancellationToken::new(),
            sim.approve_fill_offer(&CallOptions::sender(nonprofit)),
        )
        .await
        .unwrap_err();
    assert!(err.is_call_failure());
    assert!(session.receipts().is_empty());
}
