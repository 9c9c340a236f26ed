//! Example: Using the in-memory lock store
//!
//! Run with: `cargo run --example memory_lock`
//!
//! Two "machines" share one store and race for the same key. The second
//! one waits until the first unlocks.

use dlm::{Dlm, MemoryLockStore, WaitToken};
use std::sync::Arc;
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

    let store = Arc::new(MemoryLockStore::new());
    let machine_1 = Dlm::builder()
        .shared_store(Arc::clone(&store))
        .default_owner("machine-1")
        .default_ttl(Duration::from_secs(10))
        .waiting_interval(Duration::from_millis(100))
        .build()?;
    let machine_2 = Dlm::builder()
        .shared_store(store)
        .default_owner("machine-2")
        .waiting_interval(Duration::from_millis(100))
        .build()?;

    let first = machine_1.new_mutex("example-resource");
    first.lock(&WaitToken::background()).await?;
    info!(owner = first.owner(), expiry = ?first.expiry(), "lease acquired");

    let second = machine_2.new_mutex("example-resource");
    match second.try_lock(&WaitToken::background()).await {
        Err(e) if e.is_already_acquired() => info!(owner = second.owner(), "lease busy"),
        other => other?,
    }

    let waiter = tokio::spawn(async move {
        let result = second
            .lock(&WaitToken::with_timeout(Duration::from_secs(5)))
            .await;
        (second, result)
    });

    tokio::time::sleep(Duration::from_millis(500)).await;
    first.unlock(&WaitToken::background()).await?;
    info!(owner = first.owner(), "lease released");

    let (second, result) = waiter.await?;
    result?;
    info!(owner = second.owner(), "lease acquired after wait");
    second.unlock(&WaitToken::background()).await?;

    Ok(())
}
