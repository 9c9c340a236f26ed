//! The lock store contract.

use std::future::Future;

use crate::error::LockResult;
use crate::record::LockRecord;

/// Result of a conditional acquire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// The record was created or overwritten for the candidate owner.
    Acquired,
    /// A different owner holds a live lease on the key.
    Conflict,
}

/// Result of an owner-restricted release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// The owner's record was deleted.
    Released,
    /// No record matched key and owner. Not an error.
    NotHeld,
}

/// Backing store for lock records.
///
/// The store is the only point of atomicity in the protocol. `acquire` must
/// apply its predicate and write in a single atomic step; a separate read
/// followed by a write reintroduces the race it exists to prevent.
///
/// Liveness is judged with the store's clock while expiries are computed
/// with the client's clock. Significant skew between the two shortens or
/// lengthens leases. A store may keep expiries at a coarser precision than
/// [`SystemTime`](std::time::SystemTime); MongoDB keeps milliseconds.
///
/// # Example
///
/// ```rust,ignore
/// let record = LockRecord::new("invoices", "worker-7", Duration::from_secs(30));
/// match store.acquire(&record).await? {
///     AcquireOutcome::Acquired => do_work().await,
///     AcquireOutcome::Conflict => back_off().await,
/// }
/// ```
pub trait LockStore: Send + Sync {
    /// Writes `record` iff the key is absent, held by `record.owner`, or
    /// expired (`expiry <= now`).
    fn acquire(
        &self,
        record: &LockRecord,
    ) -> impl Future<Output = LockResult<AcquireOutcome>> + Send;

    /// Deletes the record for `key` iff it belongs to `owner`.
    fn release(
        &self,
        key: &str,
        owner: &str,
    ) -> impl Future<Output = LockResult<ReleaseOutcome>> + Send;

    /// Reads the stored record for `key`, live or not.
    fn fetch(&self, key: &str) -> impl Future<Output = LockResult<Option<LockRecord>>> + Send;

    /// Deletes every record whose lease has elapsed, returning how many went.
    ///
    /// Cleanup only; never required for correctness.
    fn purge_expired(&self) -> impl Future<Output = LockResult<u64>> + Send {
        async { Ok(0) }
    }

    /// Checks that the store is reachable.
    fn ping(&self) -> impl Future<Output = LockResult<()>> + Send {
        async { Ok(()) }
    }
}
