use dlm_core::record::LockRecord;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

/// A lock record as stored in the locks collection.
///
/// BSON dates hold milliseconds, so sub-millisecond expiry precision is
/// dropped on the way in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MongoLockDocument {
    #[serde(rename = "_id")]
    pub key: String,

    pub owner: String,

    pub expiry: DateTime,
}

impl From<&LockRecord> for MongoLockDocument {
    fn from(record: &LockRecord) -> Self {
        Self {
            key: record.key.clone(),
            owner: record.owner.clone(),
            expiry: DateTime::from_system_time(record.expiry),
        }
    }
}

impl From<MongoLockDocument> for LockRecord {
    fn from(document: MongoLockDocument) -> Self {
        Self {
            key: document.key,
            owner: document.owner,
            expiry: document.expiry.to_system_time(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_document_round_trips_record_at_millisecond_precision() {
        let record = LockRecord::new("abc", "lab", Duration::from_secs(60));
        let document = MongoLockDocument::from(&record);

        assert_eq!(document.key, "abc");
        let restored = LockRecord::from(document);
        assert_eq!(restored.owner, record.owner);
        assert!(restored.expiry <= record.expiry);
        assert!(record.expiry < restored.expiry + Duration::from_millis(1));
    }

    #[test]
    fn test_field_names() {
        let record = LockRecord::new("abc", "lab", Duration::from_secs(1));
        let bson = mongodb::bson::to_document(&MongoLockDocument::from(&record)).unwrap();

        assert_eq!(bson.get_str("_id").unwrap(), "abc");
        assert_eq!(bson.get_str("owner").unwrap(), "lab");
        assert!(bson.get_datetime("expiry").is_ok());
    }
}
