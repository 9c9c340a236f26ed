//! Behavior every lock store must show, shared by the per-store tests.

use std::time::{Duration, UNIX_EPOCH};

use dlm::{AcquireOutcome, LockRecord, LockStore, ReleaseOutcome};

/// Record with a whole-millisecond expiry, which every store keeps exactly.
fn record(key: &str, owner: &str, ttl: Duration) -> LockRecord {
    let mut record = LockRecord::new(key, owner, ttl);
    let since_epoch = record.expiry.duration_since(UNIX_EPOCH).unwrap();
    record.expiry = UNIX_EPOCH + Duration::from_millis(since_epoch.as_millis() as u64);
    record
}

/// Runs the acquire/release contract against `store` using `key`.
///
/// `key` must not exist in the store beforehand.
#[allow(dead_code)]
pub async fn assert_store_contract<S: LockStore>(store: &S, key: &str) {
    let a = record(key, "owner-a", Duration::from_secs(60));
    let b = record(key, "owner-b", Duration::from_secs(60));

    // Absent key: created.
    assert_eq!(store.acquire(&a).await.unwrap(), AcquireOutcome::Acquired);
    assert_eq!(store.fetch(key).await.unwrap(), Some(a.clone()));

    // Live lease of another owner: conflict, record untouched.
    assert_eq!(store.acquire(&b).await.unwrap(), AcquireOutcome::Conflict);
    assert_eq!(store.fetch(key).await.unwrap(), Some(a.clone()));

    // Same owner: extended in place.
    tokio::time::sleep(Duration::from_millis(10)).await;
    let a_again = record(key, "owner-a", Duration::from_secs(60));
    assert_eq!(store.acquire(&a_again).await.unwrap(), AcquireOutcome::Acquired);
    let stored = store.fetch(key).await.unwrap().unwrap();
    assert_eq!(stored, a_again);
    assert!(stored.expiry > a.expiry);

    // Release is owner-restricted and idempotent.
    assert_eq!(store.release(key, "owner-b").await.unwrap(), ReleaseOutcome::NotHeld);
    assert_eq!(store.release(key, "owner-a").await.unwrap(), ReleaseOutcome::Released);
    assert_eq!(store.release(key, "owner-a").await.unwrap(), ReleaseOutcome::NotHeld);
    assert_eq!(store.fetch(key).await.unwrap(), None);

    // Expired lease of another owner: taken over.
    let short = record(key, "owner-a", Duration::from_millis(50));
    assert_eq!(store.acquire(&short).await.unwrap(), AcquireOutcome::Acquired);
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(store.acquire(&b).await.unwrap(), AcquireOutcome::Acquired);
    assert_eq!(store.fetch(key).await.unwrap().unwrap().owner, "owner-b");

    assert_eq!(store.release(key, "owner-b").await.unwrap(), ReleaseOutcome::Released);
}
