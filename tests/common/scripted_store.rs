//! Lock store with injectable failures and latency for testing.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use dlm::{
    AcquireOutcome, LockError, LockRecord, LockResult, LockStore, MemoryLockStore, ReleaseOutcome,
};

/// Wraps an in-memory store, counting calls and failing or stalling on demand.
#[allow(dead_code)]
#[derive(Default)]
pub struct ScriptedLockStore {
    inner: MemoryLockStore,
    acquire_calls: AtomicUsize,
    release_calls: AtomicUsize,
    fail_acquire: AtomicBool,
    fail_release: AtomicBool,
    unreachable: AtomicBool,
    latency: std::sync::Mutex<Option<Duration>>,
}

#[allow(dead_code)]
impl ScriptedLockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire_calls(&self) -> usize {
        self.acquire_calls.load(Ordering::SeqCst)
    }

    pub fn release_calls(&self) -> usize {
        self.release_calls.load(Ordering::SeqCst)
    }

    pub fn fail_acquire(&self, fail: bool) {
        self.fail_acquire.store(fail, Ordering::SeqCst);
    }

    pub fn fail_release(&self, fail: bool) {
        self.fail_release.store(fail, Ordering::SeqCst);
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock().unwrap() = latency;
    }

    async fn stall(&self) {
        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn injected(operation: &str) -> LockError {
        LockError::backend(operation, std::io::Error::other("injected failure"))
    }
}

impl LockStore for ScriptedLockStore {
    async fn acquire(&self, record: &LockRecord) -> LockResult<AcquireOutcome> {
        self.acquire_calls.fetch_add(1, Ordering::SeqCst);
        self.stall().await;
        if self.fail_acquire.load(Ordering::SeqCst) {
            return Err(Self::injected("upsert lock record"));
        }
        self.inner.acquire(record).await
    }

    async fn release(&self, key: &str, owner: &str) -> LockResult<ReleaseOutcome> {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        self.stall().await;
        if self.fail_release.load(Ordering::SeqCst) {
            return Err(Self::injected("delete lock record"));
        }
        self.inner.release(key, owner).await
    }

    async fn fetch(&self, key: &str) -> LockResult<Option<LockRecord>> {
        self.inner.fetch(key).await
    }

    async fn ping(&self) -> LockResult<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(Self::injected("ping"));
        }
        Ok(())
    }
}
