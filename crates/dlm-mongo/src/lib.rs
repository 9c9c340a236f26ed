//! MongoDB backend for distributed locks.

pub mod document;
pub mod store;

pub use document::MongoLockDocument;
pub use store::{COLLECTION_NAME, EXPIRY_INDEX_NAME, MongoLockStore, MongoLockStoreBuilder};
