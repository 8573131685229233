// Local OS process table backend

use crate::config::ProcessTableConfig;
use crate::monitor::backend::Backend;
use crate::monitor::models::{
    HealthStatus, MutateCommand, MutateOutcome, ProcessDescriptor, ProcessId, ProcessKind,
    SubsystemReport, SystemResources,
};
use async_trait::async_trait;
use chrono::DateTime;
use std::collections::BTreeMap;
use std::time::Duration;
use sysinfo::{Disks, Pid, Signal, System};
use tokio::sync::Mutex;

/// Wraps the OS process table: enumeration with CPU/memory usage,
/// system-wide resource summary, and terminate-and-relaunch by pid
/// (the relaunch itself is the supervisor's job).
pub struct ProcessTableBackend {
    system: Mutex<System>,
    filter_keywords: Vec<String>,
    restart_allowlist: Vec<String>,
    restart_grace: Duration,
    poll_timeout: Duration,
}

impl ProcessTableBackend {
    pub const ID: &'static str = "process_table";

    pub fn new(config: &ProcessTableConfig) -> Self {
        Self {
            system: Mutex::new(System::new_all()),
            filter_keywords: config.filter_keywords.clone(),
            restart_allowlist: config.restart_allowlist.clone(),
            restart_grace: Duration::from_secs(config.restart_grace_secs),
            poll_timeout: config.poll.timeout(),
        }
    }

    /// Every visible process with current CPU and memory usage
    pub async fn processes(&self) -> Vec<ProcessDescriptor> {
        let mut system = self.system.lock().await;
        // two refreshes around the minimum interval so cpu_usage is a
        // real delta, not zero
        system.refresh_processes();
        tokio::time::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL).await;
        system.refresh_processes();

        system
            .processes()
            .iter()
            .filter(|(_, process)| !process.name().is_empty())
            .map(|(pid, process)| ProcessDescriptor {
                id: ProcessId::Pid(pid.as_u32()),
                kind: ProcessKind::OsProcess,
                name: process.name().to_string(),
                cpu_percent: process.cpu_usage() as f64,
                memory_bytes: process.memory(),
                state: process.status().to_string(),
            })
            .collect()
    }

    /// Processes whose name matches one of the configured orchestration
    /// keywords, busiest first
    pub async fn orchestration_processes(&self) -> Vec<ProcessDescriptor> {
        let processes: Vec<_> = self
            .processes()
            .await
            .into_iter()
            .filter(|process| matches_keywords(&process.name, &self.filter_keywords))
            .collect();
        let limit = processes.len();
        sort_by_cpu(processes, limit)
    }

    /// Top processes by CPU usage, descending
    pub async fn top_processes(&self, limit: usize) -> Vec<ProcessDescriptor> {
        sort_by_cpu(self.processes().await, limit)
    }

    /// System-wide CPU/memory/disk summary
    pub async fn system_resources(&self) -> SystemResources {
        let (cpu_percent, cpu_count, memory_total, memory_used) = {
            let mut system = self.system.lock().await;
            system.refresh_cpu();
            tokio::time::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL).await;
            system.refresh_cpu();
            system.refresh_memory();

            (
                system.global_cpu_info().cpu_usage() as f64,
                system.cpus().len(),
                system.total_memory(),
                system.used_memory(),
            )
        };

        let disks = Disks::new_with_refreshed_list();
        let (disk_total, disk_free) = disks
            .list()
            .iter()
            .fold((0u64, 0u64), |(total, free), disk| {
                (total + disk.total_space(), free + disk.available_space())
            });

        let load = System::load_average();

        SystemResources {
            cpu_percent,
            cpu_count,
            memory_total_bytes: memory_total,
            memory_used_bytes: memory_used,
            memory_percent: percent(memory_used, memory_total),
            disk_usage_percent: percent(disk_total.saturating_sub(disk_free), disk_total),
            disk_free_bytes: disk_free,
            load_average: [load.one, load.five, load.fifteen],
            boot_time: DateTime::from_timestamp(System::boot_time() as i64, 0)
                .unwrap_or(DateTime::UNIX_EPOCH),
        }
    }

    /// SIGTERM, bounded graceful wait, then SIGKILL. The pid must map to
    /// an allowlisted process name; anything else is refused.
    async fn restart_pid(&self, pid: u32) -> MutateOutcome {
        let target = Pid::from_u32(pid);

        let name = {
            let mut system = self.system.lock().await;
            system.refresh_processes();
            match system.process(target) {
                Some(process) => process.name().to_string(),
                None => return MutateOutcome::NotFound,
            }
        };

        if !self.restart_allowlist.iter().any(|allowed| *allowed == name) {
            return MutateOutcome::Failed {
                reason: format!("restarting '{}' is not allowed", name),
            };
        }

        {
            let system = self.system.lock().await;
            match system.process(target) {
                Some(process) => {
                    if process.kill_with(Signal::Term).is_none() {
                        // platform without SIGTERM support
                        process.kill();
                    }
                }
                None => return MutateOutcome::NotFound,
            }
        }

        tracing::info!("sent SIGTERM to pid {} ({})", pid, name);

        let deadline = std::time::Instant::now() + self.restart_grace;
        loop {
            tokio::time::sleep(Duration::from_millis(200)).await;

            let mut system = self.system.lock().await;
            system.refresh_processes();
            match system.process(target) {
                None => return MutateOutcome::Accepted,
                Some(process) => {
                    if std::time::Instant::now() >= deadline {
                        tracing::warn!("pid {} ignored SIGTERM, sending SIGKILL", pid);
                        process.kill();
                        return MutateOutcome::Accepted;
                    }
                }
            }
        }
    }
}

#[async_trait]
impl Backend for ProcessTableBackend {
    fn id(&self) -> &str {
        Self::ID
    }

    fn poll_timeout(&self) -> Duration {
        self.poll_timeout
    }

    async fn poll(&self) -> SubsystemReport {
        let processes = self.processes().await;
        let orchestration = processes
            .iter()
            .filter(|process| matches_keywords(&process.name, &self.filter_keywords))
            .count();

        let mut detail = BTreeMap::new();
        detail.insert("processes_total".to_string(), processes.len().into());
        detail.insert("orchestration_processes".to_string(), orchestration.into());

        // the table is local; if we can read it at all, it is healthy
        let status = if processes.is_empty() {
            HealthStatus::Unknown
        } else {
            HealthStatus::Healthy
        };

        SubsystemReport::observed(Self::ID, status, detail)
    }

    async fn mutate(&self, cmd: MutateCommand) -> MutateOutcome {
        match cmd {
            MutateCommand::RestartPid { pid } => self.restart_pid(pid).await,
            MutateCommand::Start { .. } | MutateCommand::Stop { .. } | MutateCommand::Restart { .. } => {
                MutateOutcome::Failed {
                    reason: "OS processes are addressed by pid only".to_string(),
                }
            }
        }
    }
}

/// Used amount as a percentage (0-100) of the total, 0.0 when total is 0
fn percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        used as f64 / total as f64 * 100.0
    }
}

/// True when the process name contains any of the keywords,
/// case-insensitively
pub(crate) fn matches_keywords(name: &str, keywords: &[String]) -> bool {
    let name = name.to_lowercase();
    keywords
        .iter()
        .any(|keyword| name.contains(&keyword.to_lowercase()))
}

/// Sort descending by CPU and truncate
pub(crate) fn sort_by_cpu(
    mut processes: Vec<ProcessDescriptor>,
    limit: usize,
) -> Vec<ProcessDescriptor> {
    processes.sort_by(|a, b| {
        b.cpu_percent
            .partial_cmp(&a.cpu_percent)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    processes.truncate(limit);
    processes
}
