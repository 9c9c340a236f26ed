//! Example: Using the meta-crate (all stores)
//!
//! Run with: `cargo run --example meta_crate`
//!
//! This example shows how to write lock code once and run it against
//! every store the meta-crate re-exports.

use ::dlm::*;
use std::time::Duration;

async fn guarded_work<S: LockStore>(dlm: &Dlm<S>) -> LockResult<()> {
    let mutex = dlm.new_mutex("example");
    mutex
        .lock(&WaitToken::with_timeout(Duration::from_secs(5)))
        .await?;
    println!("Lease acquired by {}", mutex.owner());
    mutex.unlock(&WaitToken::background()).await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Example: Using dlm meta-crate\n");

    // In-memory store example
    println!("=== Memory Store ===");
    let memory = Dlm::new(MemoryLockStore::new())?;
    guarded_work(&memory).await?;

    // MongoDB store example (if available)
    if let Ok(mongo_uri) = std::env::var("MONGODB_URI") {
        println!("\n=== MongoDB Store ===");
        if let Ok(store) = MongoLockStore::builder()
            .uri(&mongo_uri, "example")
            .build()
            .await
        {
            let mongo = Dlm::new(store)?;
            guarded_work(&mongo).await?;
        }
    }

    println!("\nAll examples completed!");
    Ok(())
}
