//! Convenience prelude for distributed lock types.

pub use crate::dlm::{Dlm, DlmBuilder, DlmConfig, MutexOptions};
pub use crate::error::{LockError, LockResult};
pub use crate::health::{HealthStatus, LivenessStatus, ReadinessStatus};
pub use crate::memory::MemoryLockStore;
pub use crate::mutex::Mutex;
pub use crate::record::LockRecord;
pub use crate::traits::{AcquireOutcome, LockStore, ReleaseOutcome};
pub use crate::wait::{CancelHandle, WaitToken};
