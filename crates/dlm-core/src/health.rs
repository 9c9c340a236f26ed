//! Health reporting for the lock manager.

use serde::Serialize;

/// Identifier the lock manager reports its health under.
pub const HEALTH_IDENTIFIER: &str = "distributed_locks";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LivenessStatus {
    Alive,
    Dead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReadinessStatus {
    Ready,
    Unready,
}

/// Liveness and readiness of one component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub id: String,
    pub alive: LivenessStatus,
    pub ready: ReadinessStatus,
}

impl HealthStatus {
    /// Status for a component whose probe succeeded or failed.
    pub fn from_probe(id: impl Into<String>, reachable: bool) -> Self {
        let (alive, ready) = if reachable {
            (LivenessStatus::Alive, ReadinessStatus::Ready)
        } else {
            (LivenessStatus::Dead, ReadinessStatus::Unready)
        };

        Self {
            id: id.into(),
            alive,
            ready,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.alive == LivenessStatus::Alive && self.ready == ReadinessStatus::Ready
    }
}
