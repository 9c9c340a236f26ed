//! Example: Using MongoDB distributed locks
//!
//! Run with: `cargo run --example mongo_lock`
//!
//! Requires a MongoDB server. Set MONGODB_URI environment variable
//! or modify the URI below.

use dlm::{Dlm, MongoLockStore, WaitToken};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Get MongoDB URI from environment or use default
    let uri = std::env::var("MONGODB_URI")
        .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());

    info!("connecting to MongoDB");
    let store = MongoLockStore::builder()
        .uri(&uri, "example")
        .expire_after(Duration::from_secs(3600))
        .build()
        .await?;

    let dlm = Dlm::builder()
        .store(store)
        .default_ttl(Duration::from_secs(30))
        .build()?;
    info!(owner = dlm.default_owner(), health = ?dlm.health_status().await, "lock manager ready");

    let mutex = dlm.new_mutex("example-resource");
    mutex
        .lock(&WaitToken::with_timeout(Duration::from_secs(5)))
        .await?;
    info!(key = mutex.key(), expiry = ?mutex.expiry(), "lease acquired");

    // Simulate some work
    tokio::time::sleep(Duration::from_secs(1)).await;

    // Locking again extends the lease
    mutex.lock(&WaitToken::background()).await?;
    info!(expiry = ?mutex.expiry(), "lease extended");

    mutex.unlock(&WaitToken::background()).await?;
    info!("lease released");

    let purged = dlm.purge_expired().await?;
    info!(purged, "expired records removed");

    Ok(())
}
