//! Conformance tests for the in-crate content store backends.

use ccon_core::ContentAddress;
use ccon_store::{conformance, ContentStore, FsContentStore, MemContentStore, StoreError};

#[tokio::test]
async fn mem_backend_conformance() {
    let store = MemContentStore::new();
    conformance::run(&store).await.unwrap();
}

#[tokio::test]
async fn fs_backend_conformance() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsContentStore::new(dir.path());
    conformance::run(&store).await.unwrap();
}

#[tokio::test]
async fn boxed_backend_conformance() {
    let store = ccon_store::StoreConfig::memory().build().unwrap();
    conformance::run(store.as_ref()).await.unwrap();
}

#[tokio::test]
async fn fs_blob_lives_at_digest_path() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsContentStore::new(dir.path().join("ledger"));
    let address = store.publish(b"[]").await.unwrap();

    let path = store.blob_path(&address);
    assert!(path.exists());
    assert_eq!(std::fs::read(&path).unwrap(), b"[]");
    assert!(!path.with_extension("json.partial").exists());
}

#[tokio::test]
async fn fs_detects_corrupted_blob() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsContentStore::new(dir.path());
    let address = store.publish(b"[{\"a\":1}]").await.unwrap();
    std::fs::write(store.blob_path(&address), b"[]").unwrap();

    assert!(matches!(
        store.fetch(&address).await,
        Err(StoreError::Integrity { .. })
    ));
}

#[tokio::test]
async fn fs_republish_repairs_corrupted_blob() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsContentStore::new(dir.path());
    let bytes = b"[{\"a\":1}]";
    let address = store.publish(bytes).await.unwrap();
    std::fs::write(store.blob_path(&address), b"[]").unwrap();

    assert_eq!(store.publish(bytes).await.unwrap(), address);
    assert_eq!(store.fetch(&address).await.unwrap(), bytes);
}

#[tokio::test]
async fn fs_refuses_path_like_addresses() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsContentStore::new(dir.path());
    let sneaky = ContentAddress::new("../../etc/passwd").unwrap();
    assert!(matches!(
        store.fetch(&sneaky).await,
        Err(StoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn mem_publish_of_existing_blob_keeps_one_copy() {
    let store = MemContentStore::new();
    store.publish(b"same").await.unwrap();
    store.publish(b"same").await.unwrap();
    assert_eq!(store.len(), 1);
    assert_eq!(store.publish_count(), 2);
}
