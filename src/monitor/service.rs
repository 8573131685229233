// Monitor facade exposing the logical operations to a transport layer

use crate::backends::{
    ClusterBackend, DeliveryBackend, ProcessTableBackend, SourceHostBackend, SupervisorBackend,
};
use crate::config::Config;
use crate::error::Result;
use crate::monitor::aggregator::Aggregator;
use crate::monitor::alerts::AlertEvaluator;
use crate::monitor::cache::ReportCache;
use crate::monitor::controller::ProcessController;
use crate::monitor::models::{
    Alert, ClusterHealth, MonitorHealth, MutateOutcome, ProcessDescriptor, SystemResources,
};
use crate::monitor::retry::{Backoff, RetryPolicy};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Aggregation engine plus control surface, wired from configuration.
/// Entirely in-memory: a restart clears cache and alert state.
pub struct Monitor {
    aggregator: Aggregator,
    controller: ProcessController,
    evaluator: AlertEvaluator,
    supervisor: Arc<SupervisorBackend>,
    process_table: Arc<ProcessTableBackend>,
    started_at: DateTime<Utc>,
}

impl Monitor {
    /// Wire every backend from configuration. Registration order defines
    /// the subsystem order in every snapshot.
    pub fn new(config: &Config) -> Result<Self> {
        let cluster = Arc::new(ClusterBackend::new(&config.cluster)?);
        let delivery = Arc::new(DeliveryBackend::new(&config.delivery)?);
        let source_host = Arc::new(SourceHostBackend::new(&config.source_host)?);
        let supervisor = Arc::new(SupervisorBackend::new(&config.supervisor)?);
        let process_table = Arc::new(ProcessTableBackend::new(&config.process_table));

        let mut cache = ReportCache::new();
        cache.register(cluster, config.cluster.poll.cache_ttl());
        cache.register(delivery, config.delivery.poll.cache_ttl());
        cache.register(source_host, config.source_host.poll.cache_ttl());
        cache.register(supervisor.clone(), config.supervisor.poll.cache_ttl());
        cache.register(process_table.clone(), config.process_table.poll.cache_ttl());
        let cache = Arc::new(cache);

        let retry = RetryPolicy::new(
            config.mutation.max_attempts,
            Backoff::Fixed(Duration::from_millis(config.mutation.retry_delay_ms)),
        );
        let controller = ProcessController::new(
            cache.clone(),
            supervisor.clone(),
            process_table.clone(),
            retry,
        );

        Ok(Self {
            aggregator: Aggregator::new(cache),
            controller,
            evaluator: AlertEvaluator::new(config.alert_rules()),
            supervisor,
            process_table,
            started_at: Utc::now(),
        })
    }

    /// Liveness of the monitor itself, independent of any backend
    pub fn health(&self) -> MonitorHealth {
        MonitorHealth {
            service: "stackwatch".to_string(),
            status: "healthy".to_string(),
            uptime_seconds: (Utc::now() - self.started_at).num_seconds().max(0) as u64,
            timestamp: Utc::now(),
        }
    }

    /// Aggregated health snapshot across all subsystems
    pub async fn cluster_snapshot(&self) -> ClusterHealth {
        self.aggregator.snapshot().await
    }

    /// System-wide CPU/memory/disk summary
    pub async fn system_resources(&self) -> SystemResources {
        self.process_table.system_resources().await
    }

    /// Top OS processes by CPU usage, descending
    pub async fn top_processes(&self, limit: usize) -> Vec<ProcessDescriptor> {
        self.process_table.top_processes(limit).await
    }

    /// Orchestration-related OS processes (configured keyword filter)
    pub async fn orchestration_processes(&self) -> Vec<ProcessDescriptor> {
        self.process_table.orchestration_processes().await
    }

    /// Current alert set: the configured rules over the live process table
    pub async fn alerts(&self) -> Vec<Alert> {
        let processes = self.process_table.processes().await;
        self.evaluator.evaluate(&processes)
    }

    pub async fn restart_os_process(&self, pid: u32) -> MutateOutcome {
        self.controller.restart_os_process(pid).await
    }

    pub async fn managed_processes(&self) -> Result<Vec<ProcessDescriptor>> {
        self.supervisor.list_processes().await
    }

    pub async fn managed_process(&self, name: &str) -> Result<Option<ProcessDescriptor>> {
        self.supervisor.process(name).await
    }

    pub async fn managed_logs(&self, name: &str, tail: usize) -> Result<Vec<String>> {
        self.supervisor.logs(name, tail).await
    }

    pub async fn start_managed(&self, name: &str) -> MutateOutcome {
        self.controller.start_managed(name).await
    }

    pub async fn stop_managed(&self, name: &str) -> MutateOutcome {
        self.controller.stop_managed(name).await
    }

    pub async fn restart_managed(&self, name: &str) -> MutateOutcome {
        self.controller.restart_managed(name).await
    }
}
