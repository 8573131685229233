// Mutation paths onto the supervised processes

use crate::monitor::backend::Backend;
use crate::monitor::cache::ReportCache;
use crate::monitor::models::{MutateCommand, MutateOutcome};
use crate::monitor::retry::RetryPolicy;
use std::sync::Arc;

/// Issues start/stop/restart commands and keeps the read model honest by
/// invalidating the affected cache entry after any effective mutation.
/// Concurrent mutations against the same target are not serialized here;
/// they race at the upstream's discretion.
pub struct ProcessController {
    cache: Arc<ReportCache>,
    supervisor: Arc<dyn Backend>,
    process_table: Arc<dyn Backend>,
    retry: RetryPolicy,
}

impl ProcessController {
    pub fn new(
        cache: Arc<ReportCache>,
        supervisor: Arc<dyn Backend>,
        process_table: Arc<dyn Backend>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            cache,
            supervisor,
            process_table,
            retry,
        }
    }

    /// Terminate-and-relaunch an OS process by pid
    pub async fn restart_os_process(&self, pid: u32) -> MutateOutcome {
        self.apply(&self.process_table, MutateCommand::RestartPid { pid })
            .await
    }

    pub async fn start_managed(&self, name: &str) -> MutateOutcome {
        self.apply(
            &self.supervisor,
            MutateCommand::Start {
                name: name.to_string(),
            },
        )
        .await
    }

    pub async fn stop_managed(&self, name: &str) -> MutateOutcome {
        self.apply(
            &self.supervisor,
            MutateCommand::Stop {
                name: name.to_string(),
            },
        )
        .await
    }

    pub async fn restart_managed(&self, name: &str) -> MutateOutcome {
        self.apply(
            &self.supervisor,
            MutateCommand::Restart {
                name: name.to_string(),
            },
        )
        .await
    }

    /// Run the mutation under the retry policy, then invalidate the
    /// backend's cache entry so the next read reflects the change.
    /// NotFound means nothing happened upstream, so the cached report is
    /// still accurate and stays put.
    async fn apply(&self, backend: &Arc<dyn Backend>, cmd: MutateCommand) -> MutateOutcome {
        let outcome = self
            .retry
            .run(backend.id(), outcome_is_final, || backend.mutate(cmd.clone()))
            .await;

        tracing::info!(
            "mutation {:?} on '{}' finished: {:?}",
            cmd,
            backend.id(),
            outcome
        );

        if !outcome.is_not_found() {
            self.cache.invalidate(backend.id()).await;
        }

        outcome
    }
}

/// Accepted and NotFound are final; only Failed is worth another attempt
fn outcome_is_final(outcome: &MutateOutcome) -> bool {
    !matches!(outcome, MutateOutcome::Failed { .. })
}
