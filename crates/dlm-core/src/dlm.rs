//! Lock manager: process-wide defaults and mutex construction.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use crate::error::{LockError, LockResult};
use crate::health::{HEALTH_IDENTIFIER, HealthStatus};
use crate::mutex::Mutex;
use crate::traits::LockStore;

/// Lease TTL used when neither builder nor config sets one.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

/// Contention poll interval used when neither builder nor config sets one.
pub const DEFAULT_WAITING_INTERVAL: Duration = Duration::from_millis(200);

/// Per-mutex overrides for [`Dlm::new_mutex_with_options`].
///
/// `None`, an empty owner and a zero TTL all fall back to the manager's
/// defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutexOptions {
    pub key: String,
    pub owner: Option<String>,
    pub ttl: Option<Duration>,
}

impl MutexOptions {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

/// Serializable defaults for a [`Dlm`], e.g. a section of a service config file.
///
/// ```toml
/// [locks]
/// default_owner = "k8s-pod-199831uf"
/// default_ttl_ms = 30000
/// waiting_interval_ms = 200
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DlmConfig {
    pub default_owner: Option<String>,
    pub default_ttl_ms: Option<u64>,
    pub waiting_interval_ms: Option<u64>,
}

/// Builder for [`Dlm`] configuration.
pub struct DlmBuilder<S> {
    store: Option<Arc<S>>,
    default_owner: Option<String>,
    default_ttl: Duration,
    waiting_interval: Duration,
}

impl<S: LockStore> DlmBuilder<S> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            store: None,
            default_owner: None,
            default_ttl: DEFAULT_TTL,
            waiting_interval: DEFAULT_WAITING_INTERVAL,
        }
    }

    /// Sets the lock store.
    pub fn store(self, store: S) -> Self {
        self.shared_store(Arc::new(store))
    }

    /// Sets a lock store shared with other managers.
    pub fn shared_store(mut self, store: Arc<S>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the owner identity used when a mutex doesn't name one.
    ///
    /// Usually the machine or pod name.
    pub fn default_owner(mut self, owner: impl Into<String>) -> Self {
        self.default_owner = Some(owner.into());
        self
    }

    /// Sets the lease TTL used when a mutex doesn't name one.
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Sets how long `lock` waits before retrying a held lease.
    pub fn waiting_interval(mut self, interval: Duration) -> Self {
        self.waiting_interval = interval;
        self
    }

    /// Applies every value present in `config`.
    pub fn config(mut self, config: &DlmConfig) -> Self {
        if let Some(owner) = &config.default_owner {
            self.default_owner = Some(owner.clone());
        }
        if let Some(ttl) = config.default_ttl_ms {
            self.default_ttl = Duration::from_millis(ttl);
        }
        if let Some(interval) = config.waiting_interval_ms {
            self.waiting_interval = Duration::from_millis(interval);
        }
        self
    }

    /// Builds the manager.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::InvalidConfig`] if no store was set or if the
    /// TTL or waiting interval is zero.
    pub fn build(self) -> LockResult<Dlm<S>> {
        let store = self
            .store
            .ok_or_else(|| LockError::InvalidConfig("lock store not specified".to_string()))?;

        if self.default_ttl.is_zero() {
            return Err(LockError::InvalidConfig(
                "default TTL must be greater than zero".to_string(),
            ));
        }
        if self.waiting_interval.is_zero() {
            return Err(LockError::InvalidConfig(
                "waiting interval must be greater than zero".to_string(),
            ));
        }

        let owner = match self.default_owner {
            Some(owner) if !owner.is_empty() => owner,
            _ => default_owner_identity(),
        };

        Ok(Dlm {
            inner: Arc::new(DlmInner {
                store,
                owner,
                ttl: self.default_ttl,
                interval: self.waiting_interval,
            }),
        })
    }
}

impl<S: LockStore> Default for DlmBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Distributed lock manager.
///
/// Holds the lock store and the defaults every [`Mutex`] it creates starts
/// from. Cloning is cheap and clones share the store.
///
/// # Example
///
/// ```rust,ignore
/// let dlm = Dlm::builder()
///     .store(MemoryLockStore::new())
///     .default_owner("k8s-pod-199831uf")
///     .default_ttl(Duration::from_secs(60))
///     .build()?;
///
/// let mutex = dlm.new_mutex("invoices");
/// mutex.try_lock(&WaitToken::background()).await?;
/// ```
pub struct Dlm<S> {
    inner: Arc<DlmInner<S>>,
}

struct DlmInner<S> {
    store: Arc<S>,
    owner: String,
    ttl: Duration,
    interval: Duration,
}

impl<S: LockStore> Dlm<S> {
    /// Returns a new builder for configuring the manager.
    pub fn builder() -> DlmBuilder<S> {
        DlmBuilder::new()
    }

    /// Creates a manager over `store` with default settings.
    pub fn new(store: S) -> LockResult<Self> {
        Self::builder().store(store).build()
    }

    pub fn store(&self) -> &Arc<S> {
        &self.inner.store
    }

    pub fn default_owner(&self) -> &str {
        &self.inner.owner
    }

    pub fn default_ttl(&self) -> Duration {
        self.inner.ttl
    }

    pub fn waiting_interval(&self) -> Duration {
        self.inner.interval
    }

    /// Creates a mutex for `key` with the default owner and TTL.
    pub fn new_mutex(&self, key: impl Into<String>) -> Mutex<S> {
        self.new_mutex_with_options(MutexOptions::new(key))
    }

    /// Creates a mutex for `key` with the default owner and the given TTL.
    pub fn new_mutex_with_ttl(&self, key: impl Into<String>, ttl: Duration) -> Mutex<S> {
        self.new_mutex_with_options(MutexOptions::new(key).ttl(ttl))
    }

    /// Creates a mutex, filling unset options from the manager's defaults.
    pub fn new_mutex_with_options(&self, options: MutexOptions) -> Mutex<S> {
        let owner = options
            .owner
            .filter(|owner| !owner.is_empty())
            .unwrap_or_else(|| self.inner.owner.clone());
        let ttl = options
            .ttl
            .filter(|ttl| !ttl.is_zero())
            .unwrap_or(self.inner.ttl);

        Mutex::new(
            Arc::clone(&self.inner.store),
            options.key,
            owner,
            ttl,
            self.inner.interval,
        )
    }

    /// Probes the store and reports the manager's health.
    pub async fn health_status(&self) -> HealthStatus {
        let reachable = match self.inner.store.ping().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "lock store health probe failed");
                false
            }
        };
        HealthStatus::from_probe(HEALTH_IDENTIFIER, reachable)
    }

    /// Deletes expired lock records from the store.
    pub async fn purge_expired(&self) -> LockResult<u64> {
        self.inner.store.purge_expired().await
    }
}

impl<S> Clone for Dlm<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> fmt::Debug for Dlm<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dlm")
            .field("default_owner", &self.inner.owner)
            .field("default_ttl", &self.inner.ttl)
            .field("waiting_interval", &self.inner.interval)
            .finish_non_exhaustive()
    }
}

/// Host name from the environment, or a generated identity if unset.
fn default_owner_identity() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|host| !host.is_empty())
        .unwrap_or_else(|| format!("dlm-{}", Uuid::new_v4()))
}
