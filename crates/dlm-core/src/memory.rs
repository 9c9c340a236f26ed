//! In-process lock store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use crate::error::LockResult;
use crate::record::LockRecord;
use crate::traits::{AcquireOutcome, LockStore, ReleaseOutcome};

/// Lock store backed by a map in process memory.
///
/// Gives mutual exclusion between tasks and threads of one process only.
/// Useful for tests and single-instance deployments; share it across
/// [`Dlm`](crate::Dlm) values with an `Arc`.
#[derive(Debug, Default)]
pub struct MemoryLockStore {
    records: Mutex<HashMap<String, LockRecord>>,
}

impl MemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently stored, expired ones included.
    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    fn records(&self) -> MutexGuard<'_, HashMap<String, LockRecord>> {
        // The map is left consistent by every critical section.
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LockStore for MemoryLockStore {
    async fn acquire(&self, record: &LockRecord) -> LockResult<AcquireOutcome> {
        let now = SystemTime::now();
        let mut records = self.records();

        if let Some(existing) = records.get(&record.key)
            && existing.owner != record.owner
            && existing.is_live_at(now)
        {
            return Ok(AcquireOutcome::Conflict);
        }

        records.insert(record.key.clone(), record.clone());
        Ok(AcquireOutcome::Acquired)
    }

    async fn release(&self, key: &str, owner: &str) -> LockResult<ReleaseOutcome> {
        let mut records = self.records();

        match records.get(key) {
            Some(existing) if existing.owner == owner => {
                records.remove(key);
                Ok(ReleaseOutcome::Released)
            }
            _ => Ok(ReleaseOutcome::NotHeld),
        }
    }

    async fn fetch(&self, key: &str) -> LockResult<Option<LockRecord>> {
        Ok(self.records().get(key).cloned())
    }

    async fn purge_expired(&self) -> LockResult<u64> {
        let now = SystemTime::now();
        let mut records = self.records();
        let before = records.len();
        records.retain(|_, record| record.is_live_at(now));
        Ok((before - records.len()) as u64)
    }
}
