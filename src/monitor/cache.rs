// TTL-bounded report cache over the backend registry

use crate::error::{Result, StackwatchError};
use crate::monitor::backend::Backend;
use crate::monitor::models::{ErrorKind, SubsystemReport};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Per-subsystem freshness windows. Failure reports get a shorter
/// lifetime so an unreachable upstream is re-checked sooner.
#[derive(Debug, Clone, Copy)]
pub struct CacheTtl {
    pub fresh: Duration,
    pub failure: Duration,
}

impl Default for CacheTtl {
    fn default() -> Self {
        Self {
            fresh: Duration::from_secs(15),
            failure: Duration::from_secs(5),
        }
    }
}

/// Cached report plus its expiry instant.
/// Invariant: expires_at == report.observed_at + ttl for its kind.
#[derive(Debug, Clone)]
struct CacheEntry {
    report: SubsystemReport,
    expires_at: DateTime<Utc>,
}

struct Slot {
    backend: Arc<dyn Backend>,
    ttl: CacheTtl,
    entry: Mutex<Option<CacheEntry>>,
}

/// Holds the most recent report per subsystem and refreshes lazily.
/// The only mutable state shared across concurrent requests.
pub struct ReportCache {
    slots: Vec<Slot>,
}

impl ReportCache {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Register a backend. Registration order defines snapshot order.
    pub fn register(&mut self, backend: Arc<dyn Backend>, ttl: CacheTtl) {
        self.slots.push(Slot {
            backend,
            ttl,
            entry: Mutex::new(None),
        });
    }

    /// Subsystem ids in registration order
    pub fn subsystem_ids(&self) -> Vec<String> {
        self.slots
            .iter()
            .map(|slot| slot.backend.id().to_string())
            .collect()
    }

    /// Return the cached report if fresh, otherwise refresh via the
    /// backend. Failure reports are cached too, so an unreachable
    /// upstream is not hammered on every read.
    pub async fn get(&self, subsystem: &str) -> Result<SubsystemReport> {
        let slot = self.slot(subsystem)?;
        Ok(self.fetch(slot).await)
    }

    /// Fetch all subsystems concurrently, in registration order
    pub async fn get_all(&self) -> Vec<SubsystemReport> {
        let fetches = self.slots.iter().map(|slot| self.fetch(slot));
        futures::future::join_all(fetches).await
    }

    /// Forcibly expire a subsystem's entry. Returns false for unknown ids.
    pub async fn invalidate(&self, subsystem: &str) -> bool {
        match self.slot(subsystem) {
            Ok(slot) => {
                slot.entry.lock().await.take();
                tracing::debug!("invalidated cache entry for '{}'", subsystem);
                true
            }
            Err(_) => false,
        }
    }

    /// The slot mutex is held across the refresh, so concurrent callers
    /// for the same stale subsystem collapse into a single upstream poll;
    /// the rest wait on the in-flight one and read its result.
    async fn fetch(&self, slot: &Slot) -> SubsystemReport {
        let mut entry = slot.entry.lock().await;

        if let Some(cached) = entry.as_ref() {
            if Utc::now() < cached.expires_at {
                tracing::debug!("serving cached report for '{}'", slot.backend.id());
                return cached.report.clone();
            }
        }

        let report = poll_with_deadline(slot.backend.as_ref()).await;
        let ttl = if report.error.is_some() {
            slot.ttl.failure
        } else {
            slot.ttl.fresh
        };
        let expires_at = report.observed_at
            + ChronoDuration::from_std(ttl).unwrap_or_else(|_| ChronoDuration::zero());

        *entry = Some(CacheEntry {
            report: report.clone(),
            expires_at,
        });

        report
    }

    fn slot(&self, subsystem: &str) -> Result<&Slot> {
        self.slots
            .iter()
            .find(|slot| slot.backend.id() == subsystem)
            .ok_or_else(|| StackwatchError::UnknownSubsystem(subsystem.to_string()).into())
    }
}

impl Default for ReportCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Run one poll under the backend's deadline. On expiry the call is
/// abandoned from our side; no cancellation reaches the upstream.
async fn poll_with_deadline(backend: &dyn Backend) -> SubsystemReport {
    match tokio::time::timeout(backend.poll_timeout(), backend.poll()).await {
        Ok(report) => report,
        Err(_) => {
            tracing::warn!(
                "poll for '{}' exceeded its {:?} deadline",
                backend.id(),
                backend.poll_timeout()
            );
            SubsystemReport::failure(backend.id(), ErrorKind::Timeout, "poll deadline exceeded")
        }
    }
}
