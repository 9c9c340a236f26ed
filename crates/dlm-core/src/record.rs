//! The persisted lock record.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// One lease as the lock store holds it.
///
/// A record is live while `expiry > now`. An expired record is inert and any
/// owner may overwrite it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockRecord {
    /// Resource name, unique within the store.
    pub key: String,
    /// Identity of the holder.
    pub owner: String,
    /// Lease deadline.
    pub expiry: SystemTime,
}

impl LockRecord {
    /// Builds a record whose lease runs `ttl` from now.
    pub fn new(key: impl Into<String>, owner: impl Into<String>, ttl: Duration) -> Self {
        Self {
            key: key.into(),
            owner: owner.into(),
            expiry: SystemTime::now() + ttl,
        }
    }

    /// Returns `true` if the lease has not elapsed at `now`.
    pub fn is_live_at(&self, now: SystemTime) -> bool {
        self.expiry > now
    }

    pub fn is_live(&self) -> bool {
        self.is_live_at(SystemTime::now())
    }
}

/// Nanoseconds since the unix epoch, saturating at zero for pre-epoch times.
pub(crate) fn unix_nanos(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

pub(crate) fn from_unix_nanos(nanos: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_nanos(nanos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_expiry() {
        let before = SystemTime::now();
        let record = LockRecord::new("abc", "machine-1", Duration::from_secs(60));
        let after = SystemTime::now();

        assert_eq!(record.key, "abc");
        assert_eq!(record.owner, "machine-1");
        assert!(record.expiry >= before + Duration::from_secs(60));
        assert!(record.expiry <= after + Duration::from_secs(60));
    }

    #[test]
    fn test_liveness_boundary() {
        let record = LockRecord {
            key: "abc".to_string(),
            owner: "lab".to_string(),
            expiry: from_unix_nanos(10_000),
        };

        assert!(record.is_live_at(from_unix_nanos(9_999)));
        // expiry <= now is free
        assert!(!record.is_live_at(from_unix_nanos(10_000)));
        assert!(!record.is_live_at(from_unix_nanos(10_001)));
    }

    #[test]
    fn test_nanos_keep_sub_millisecond_precision() {
        let time = UNIX_EPOCH + Duration::new(1_700_000_000, 123_456_789);
        assert_eq!(from_unix_nanos(unix_nanos(time)), time);
    }

    #[test]
    fn test_zero_ttl_is_not_live() {
        let record = LockRecord::new("abc", "lab", Duration::ZERO);
        assert!(!record.is_live_at(SystemTime::now() + Duration::from_millis(1)));
    }
}
