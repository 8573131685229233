// Snapshot assembly across all registered subsystems

use crate::monitor::cache::ReportCache;
use crate::monitor::models::ClusterHealth;
use chrono::Utc;
use std::sync::Arc;

/// Merges per-subsystem reports into one ClusterHealth snapshot
pub struct Aggregator {
    cache: Arc<ReportCache>,
}

impl Aggregator {
    pub fn new(cache: Arc<ReportCache>) -> Self {
        Self { cache }
    }

    /// Fetch every subsystem concurrently (each poll bounded by its own
    /// deadline) and merge. Always returns a snapshot: a failed subsystem
    /// shows up as a degraded report, never as an error. The snapshot is
    /// healthy only when every single subsystem is; Unknown counts as
    /// unhealthy.
    pub async fn snapshot(&self) -> ClusterHealth {
        let subsystems = self.cache.get_all().await;
        let overall_healthy = subsystems.iter().all(|report| report.status.is_healthy());

        ClusterHealth {
            overall_healthy,
            subsystems,
            computed_at: Utc::now(),
        }
    }
}
