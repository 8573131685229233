// Backend capability implemented by every subsystem adapter

use crate::monitor::models::{MutateCommand, MutateOutcome, SubsystemReport};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use std::time::Duration;

/// One monitored upstream, normalized behind a poll/mutate capability.
/// Concrete backends are registered into the cache in a fixed order;
/// that order defines the subsystem order in every snapshot.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Backend: Send + Sync {
    /// Stable subsystem identifier, unique within a registry
    fn id(&self) -> &str;

    /// Upper bound for a single poll; exceeding it is a Timeout failure
    fn poll_timeout(&self) -> Duration;

    /// Fetch and classify the current upstream state. Never fails
    /// outright: transport errors, timeouts, auth failures and malformed
    /// responses all come back as a failure report with `error` set.
    async fn poll(&self) -> SubsystemReport;

    /// Apply a control command to the upstream, synchronously and without
    /// internal retries. Backends without a control surface reject.
    async fn mutate(&self, _cmd: MutateCommand) -> MutateOutcome {
        MutateOutcome::Failed {
            reason: format!("subsystem '{}' does not accept mutations", self.id()),
        }
    }
}
