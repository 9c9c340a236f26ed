//! Lease-based distributed locks for Rust.
//!
//! Service instances coordinate exclusive access to a named resource through
//! a shared, strongly consistent lock store. A lease is one record per key
//! holding the owner and an expiry; acquiring it is a single conditional write
//! that succeeds only if the key is free, expired, or already held by the
//! same owner.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use dlm::*;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create a store (example: MongoDB backend)
//!     let store = MongoLockStore::builder()
//!         .uri("mongodb://localhost:27017", "app")
//!         .build()
//!         .await?;
//!
//!     let dlm = Dlm::builder()
//!         .store(store)
//!         .default_owner("k8s-pod-199831uf")
//!         .default_ttl(Duration::from_secs(30))
//!         .build()?;
//!
//!     // Create a mutex by key
//!     let mutex = dlm.new_mutex("my-resource");
//!
//!     // Wait up to 5 seconds for the lease
//!     mutex.lock(&WaitToken::with_timeout(Duration::from_secs(5))).await?;
//!
//!     // Critical section - we hold the lease until unlock or expiry
//!     println!("Doing critical work...");
//!
//!     mutex.unlock(&WaitToken::background()).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Semantics
//!
//! - **Re-entrant refresh**: locking a held lease again from the same owner
//!   succeeds and extends its expiry.
//! - **Idempotent unlock**: unlocking a lease that expired, was released, or
//!   belongs to someone else is not an error.
//! - **Crash recovery**: an abandoned lease frees itself once its TTL elapses.
//! - **No fairness**: waiters poll at a fixed interval; any of them may win.
//!
//! # Limitations
//!
//! Expiries are computed with the client clock and judged with the store
//! clock, so clock skew shifts lease boundaries. There are no fencing
//! tokens: a holder that stalls past its expiry cannot detect that another
//! owner took over.
//!
//! # Crate Organization
//!
//! This is a meta-crate that re-exports types from:
//! - `dlm-core`: lock manager, mutex, store contract, in-memory store
//! - `dlm-mongo`: MongoDB store (feature `mongo`, on by default)

// Re-export core types and traits
pub use dlm_core::*;

// Re-export MongoDB backend
#[cfg(feature = "mongo")]
pub use dlm_mongo::*;
