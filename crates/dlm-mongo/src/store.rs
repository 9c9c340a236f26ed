//! MongoDB lock store implementation.

use std::time::Duration;

use dlm_core::error::{LockError, LockResult};
use dlm_core::record::LockRecord;
use dlm_core::traits::{AcquireOutcome, LockStore, ReleaseOutcome};
use mongodb::bson::{Document, doc};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};
use tracing::{Span, debug, field, instrument};

use crate::document::MongoLockDocument;

/// Default collection for lock records.
pub const COLLECTION_NAME: &str = "locks";

/// Name of the index on `expiry`.
pub const EXPIRY_INDEX_NAME: &str = "expired_locks";

/// Server error code for a unique index violation.
const DUPLICATE_KEY: i32 = 11000;

/// Builder for MongoDB lock store configuration.
pub struct MongoLockStoreBuilder {
    uri: Option<String>,
    database_name: Option<String>,
    database: Option<Database>,
    collection_name: String,
    expire_after: Option<Duration>,
    create_indexes: bool,
}

impl MongoLockStoreBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            uri: None,
            database_name: None,
            database: None,
            collection_name: COLLECTION_NAME.to_string(),
            expire_after: None,
            create_indexes: true,
        }
    }

    /// Sets the connection string and database name to connect with.
    pub fn uri(mut self, uri: impl Into<String>, database: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self.database_name = Some(database.into());
        self
    }

    /// Uses an existing database handle.
    pub fn database(mut self, database: Database) -> Self {
        self.database = Some(database);
        self
    }

    /// Sets the collection holding lock records.
    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.collection_name = name.into();
        self
    }

    /// Lets the server delete records this long after their expiry.
    ///
    /// Turns the expiry index into a TTL index. Cleanup only: mutex behavior
    /// is the same with or without it.
    pub fn expire_after(mut self, delay: Duration) -> Self {
        self.expire_after = Some(delay);
        self
    }

    /// Sets whether `build` creates the expiry index. Defaults to `true`.
    pub fn create_indexes(mut self, create: bool) -> Self {
        self.create_indexes = create;
        self
    }

    /// Builds the store, connecting and creating indexes as configured.
    pub async fn build(self) -> LockResult<MongoLockStore> {
        let database = match (self.database, self.uri, self.database_name) {
            (Some(database), _, _) => database,
            (None, Some(uri), Some(name)) => {
                let client = Client::with_uri_str(&uri)
                    .await
                    .map_err(|e| LockError::Connection(Box::new(e)))?;
                client.database(&name)
            }
            _ => {
                return Err(LockError::InvalidConfig(
                    "database or connection string not specified".to_string(),
                ));
            }
        };

        let store = MongoLockStore::new(database, &self.collection_name);
        if self.create_indexes {
            store.ensure_indexes(self.expire_after).await?;
        }

        Ok(store)
    }
}

impl Default for MongoLockStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Lock store over a MongoDB collection.
///
/// Each key is one document whose `_id` is the key, so the primary index
/// enforces uniqueness. Acquisition is a single upsert filtered on
/// "same owner or expired"; when a different owner holds a live lease the
/// filter misses, the upsert tries to insert a second document with the same
/// `_id`, and the duplicate-key error is reported as a conflict.
///
/// Expiry checks use the server clock (`$$NOW`).
#[derive(Debug, Clone)]
pub struct MongoLockStore {
    database: Database,
    collection: Collection<MongoLockDocument>,
}

impl MongoLockStore {
    /// Returns a new builder for configuring the store.
    pub fn builder() -> MongoLockStoreBuilder {
        MongoLockStoreBuilder::new()
    }

    /// Creates a store over `collection_name` without touching the server.
    pub fn new(database: Database, collection_name: &str) -> Self {
        let collection = database.collection(collection_name);
        Self {
            database,
            collection,
        }
    }

    pub fn collection(&self) -> &Collection<MongoLockDocument> {
        &self.collection
    }

    /// Creates the ascending `expiry` index used by cleanup.
    ///
    /// With `expire_after` set the index is a TTL index and the server removes
    /// stale records on its own. Changing `expire_after` for an existing index
    /// is rejected by the server.
    #[instrument(skip(self), fields(collection = %self.collection.name(), backend = "mongodb"))]
    pub async fn ensure_indexes(&self, expire_after: Option<Duration>) -> LockResult<()> {
        let options = IndexOptions::builder()
            .name(EXPIRY_INDEX_NAME.to_string())
            .expire_after(expire_after)
            .build();
        let index = IndexModel::builder()
            .keys(doc! { "expiry": 1 })
            .options(options)
            .build();

        self.collection
            .create_index(index)
            .await
            .map_err(|e| LockError::backend("create expiry index", e))?;

        Ok(())
    }
}

impl LockStore for MongoLockStore {
    #[instrument(skip(self, record), fields(lock.key = %record.key, lock.owner = %record.owner, backend = "mongodb", outcome = field::Empty))]
    async fn acquire(&self, record: &LockRecord) -> LockResult<AcquireOutcome> {
        let document = MongoLockDocument::from(record);
        let filter = doc! {
            "_id": document.key.as_str(),
            "$or": [
                { "owner": document.owner.as_str() },
                expired(),
            ],
        };
        let update = doc! {
            "$set": {
                "owner": document.owner.as_str(),
                "expiry": document.expiry,
            }
        };

        let outcome = match self.collection.update_one(filter, update).upsert(true).await {
            Ok(_) => AcquireOutcome::Acquired,
            Err(e) if is_duplicate_key(&e) => AcquireOutcome::Conflict,
            Err(e) => return Err(LockError::backend("upsert lock record", e)),
        };

        Span::current().record("outcome", field::debug(outcome));
        Ok(outcome)
    }

    #[instrument(skip(self), fields(backend = "mongodb"))]
    async fn release(&self, key: &str, owner: &str) -> LockResult<ReleaseOutcome> {
        let result = self
            .collection
            .delete_one(doc! { "_id": key, "owner": owner })
            .await
            .map_err(|e| LockError::backend("delete lock record", e))?;

        if result.deleted_count == 0 {
            return Ok(ReleaseOutcome::NotHeld);
        }
        Ok(ReleaseOutcome::Released)
    }

    #[instrument(skip(self), fields(backend = "mongodb"))]
    async fn fetch(&self, key: &str) -> LockResult<Option<LockRecord>> {
        let document = self
            .collection
            .find_one(doc! { "_id": key })
            .await
            .map_err(|e| LockError::backend("find lock record", e))?;

        Ok(document.map(LockRecord::from))
    }

    #[instrument(skip(self), fields(backend = "mongodb"))]
    async fn purge_expired(&self) -> LockResult<u64> {
        let result = self
            .collection
            .delete_many(expired())
            .await
            .map_err(|e| LockError::backend("delete expired lock records", e))?;

        debug!(deleted = result.deleted_count, "purged expired lock records");
        Ok(result.deleted_count)
    }

    #[instrument(skip(self), fields(backend = "mongodb"))]
    async fn ping(&self) -> LockResult<()> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| LockError::backend("ping", e))?;
        Ok(())
    }
}

/// Filter matching records whose lease has elapsed by the server clock.
fn expired() -> Document {
    doc! { "$expr": { "$lte": ["$expiry", "$$NOW"] } }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}
