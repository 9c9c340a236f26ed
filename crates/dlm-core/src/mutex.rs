//! Lease-based distributed mutex.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use tokio::time::{Instant, sleep};
use tracing::{Span, debug, field, instrument};

use crate::error::{LockError, LockResult};
use crate::record::{LockRecord, from_unix_nanos, unix_nanos};
use crate::traits::{AcquireOutcome, LockStore, ReleaseOutcome};
use crate::wait::WaitToken;

/// A named lease bound to one key, one owner and one TTL.
///
/// Unlike an in-process mutex, locking again while already holding the lease
/// succeeds and pushes the expiry out by another TTL. Different `Mutex`
/// values with the same key and owner share the lease and can unlock each
/// other.
///
/// Correctness comes from the store's conditional write alone, so
/// independent values for the same key may be used from any task or process.
/// There is no fencing token: a holder paused past its expiry cannot tell
/// that another owner has since taken the lease.
///
/// # Example
///
/// ```rust,ignore
/// let mutex = dlm.new_mutex("invoices");
/// mutex.lock(&WaitToken::with_timeout(Duration::from_secs(5))).await?;
/// // Critical section - lease held until unlock or expiry
/// mutex.unlock(&WaitToken::background()).await?;
/// ```
pub struct Mutex<S> {
    store: Arc<S>,
    key: String,
    owner: String,
    ttl: Duration,
    /// Wait between attempts while another owner holds the lease.
    interval: Duration,
    /// Unix nanos of the last acquired expiry, 0 if never acquired.
    expiry: AtomicU64,
}

impl<S: LockStore> Mutex<S> {
    pub(crate) fn new(
        store: Arc<S>,
        key: String,
        owner: String,
        ttl: Duration,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            key,
            owner,
            ttl,
            interval,
            expiry: AtomicU64::new(0),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Expiry computed by the last successful acquisition from this value.
    ///
    /// Informational only; the store holds the authoritative record.
    pub fn expiry(&self) -> Option<SystemTime> {
        match self.expiry.load(Ordering::Acquire) {
            0 => None,
            nanos => Some(from_unix_nanos(nanos)),
        }
    }

    /// Acquires the lease, waiting while another owner holds it.
    ///
    /// Retries only on [`LockError::AlreadyAcquired`], sleeping `interval`
    /// between attempts. Any other error ends the wait. If the token fires
    /// while waiting its own error is returned, even when a retry was due at
    /// the same moment.
    #[instrument(
        skip(self, token),
        fields(
            lock.key = %self.key,
            lock.owner = %self.owner,
            attempts = field::Empty,
            elapsed_ms = field::Empty,
        )
    )]
    pub async fn lock(&self, token: &WaitToken) -> LockResult<()> {
        let start = Instant::now();
        let mut attempts: u64 = 0;

        loop {
            attempts += 1;
            match self.try_lock(token).await {
                Err(LockError::AlreadyAcquired) => {}
                result => {
                    Span::current().record("attempts", attempts);
                    Span::current().record("elapsed_ms", start.elapsed().as_millis() as u64);
                    return result;
                }
            }

            debug!(interval = ?self.interval, "lease held by another owner, waiting");

            tokio::select! {
                biased;
                err = token.done() => {
                    Span::current().record("attempts", attempts);
                    return Err(err);
                }
                _ = sleep(self.interval) => {}
            }
        }
    }

    /// Makes one acquisition attempt.
    ///
    /// Returns [`LockError::AlreadyAcquired`] if a different owner holds a
    /// live lease. Store failures are returned as they are, without retry.
    #[instrument(skip(self, token), fields(lock.key = %self.key, lock.owner = %self.owner, acquired = field::Empty))]
    pub async fn try_lock(&self, token: &WaitToken) -> LockResult<()> {
        let mut record = LockRecord::new(self.key.as_str(), self.owner.as_str(), self.ttl);
        // Successive expiries from this value strictly increase.
        if let Some(last) = self.expiry()
            && record.expiry <= last
        {
            record.expiry = last + Duration::from_nanos(1);
        }

        let outcome = token.run(self.store.acquire(&record)).await?;
        Span::current().record("acquired", outcome == AcquireOutcome::Acquired);

        match outcome {
            AcquireOutcome::Acquired => {
                self.expiry
                    .store(unix_nanos(record.expiry), Ordering::Release);
                Ok(())
            }
            AcquireOutcome::Conflict => Err(LockError::AlreadyAcquired),
        }
    }

    /// Releases the lease if this owner holds it.
    ///
    /// Succeeds when there is nothing to release: the lease expired, was
    /// already released, or belongs to another owner.
    #[instrument(skip(self, token), fields(lock.key = %self.key, lock.owner = %self.owner))]
    pub async fn unlock(&self, token: &WaitToken) -> LockResult<()> {
        match token.run(self.store.release(&self.key, &self.owner)).await? {
            ReleaseOutcome::Released => {}
            ReleaseOutcome::NotHeld => debug!("no lease held by this owner, nothing to release"),
        }
        Ok(())
    }
}

impl<S> fmt::Debug for Mutex<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutex")
            .field("key", &self.key)
            .field("owner", &self.owner)
            .field("ttl", &self.ttl)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}
