// Health model shared across the monitor core

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Normalized health state of one subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
    Unknown,
}

impl HealthStatus {
    /// Returns true only for a fully healthy subsystem
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }

    /// Get display label for the status
    pub fn label(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unhealthy => "unhealthy",
            HealthStatus::Unknown => "unknown",
        }
    }
}

/// Adapter-level failure classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Timeout,
    Unreachable,
    InvalidResponse,
    PermissionDenied,
}

impl ErrorKind {
    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::Timeout => "timeout",
            ErrorKind::Unreachable => "unreachable",
            ErrorKind::InvalidResponse => "invalid_response",
            ErrorKind::PermissionDenied => "permission_denied",
        }
    }
}

/// Normalized output of one backend poll. Immutable once created; the next
/// poll supersedes it rather than mutating it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsystemReport {
    pub subsystem: String,
    pub status: HealthStatus,
    pub detail: BTreeMap<String, serde_json::Value>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub observed_at: DateTime<Utc>,
    pub error: Option<ErrorKind>,
}

impl SubsystemReport {
    /// Report for a poll that reached the upstream and classified its state
    pub fn observed(
        subsystem: &str,
        status: HealthStatus,
        detail: BTreeMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            subsystem: subsystem.to_string(),
            status,
            detail,
            observed_at: Utc::now(),
            error: None,
        }
    }

    /// Report for a poll that could not produce a usable upstream state.
    /// Transport-level failures map to Unknown (the upstream may be fine),
    /// protocol-level ones to Unhealthy.
    pub fn failure(subsystem: &str, kind: ErrorKind, message: impl Into<String>) -> Self {
        let status = match kind {
            ErrorKind::Timeout | ErrorKind::Unreachable => HealthStatus::Unknown,
            ErrorKind::InvalidResponse | ErrorKind::PermissionDenied => HealthStatus::Unhealthy,
        };

        let mut detail = BTreeMap::new();
        detail.insert(
            "message".to_string(),
            serde_json::Value::String(message.into()),
        );

        Self {
            subsystem: subsystem.to_string(),
            status,
            detail,
            observed_at: Utc::now(),
            error: Some(kind),
        }
    }
}

/// Aggregated point-in-time health view across all subsystems.
/// Recomputed on every aggregation cycle; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterHealth {
    pub overall_healthy: bool,
    pub subsystems: Vec<SubsystemReport>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub computed_at: DateTime<Utc>,
}

/// Liveness of the monitor itself, independent of any backend
#[derive(Debug, Clone, Serialize)]
pub struct MonitorHealth {
    pub service: String,
    pub status: String,
    pub uptime_seconds: u64,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
}

/// Identifier of a process: OS processes by pid, managed ones by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProcessId {
    Pid(u32),
    Name(String),
}

impl std::fmt::Display for ProcessId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessId::Pid(pid) => write!(f, "{}", pid),
            ProcessId::Name(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessKind {
    OsProcess,
    Managed,
}

/// One process as seen by either the OS process table or the supervisor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessDescriptor {
    pub id: ProcessId,
    pub kind: ProcessKind,
    pub name: String,
    pub cpu_percent: f64,
    pub memory_bytes: u64,
    pub state: String,
}

impl ProcessDescriptor {
    /// Format memory usage as human-readable string
    pub fn memory_formatted(&self) -> String {
        format_bytes(self.memory_bytes)
    }
}

/// System-wide resource summary from the local machine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemResources {
    pub cpu_percent: f64,
    pub cpu_count: usize,
    pub memory_total_bytes: u64,
    pub memory_used_bytes: u64,
    pub memory_percent: f64,
    pub disk_usage_percent: f64,
    pub disk_free_bytes: u64,
    pub load_average: [f64; 3],
    #[serde(with = "chrono::serde::ts_seconds")]
    pub boot_time: DateTime<Utc>,
}

impl SystemResources {
    /// Format memory usage as "used / total"
    pub fn memory_formatted(&self) -> String {
        format!(
            "{} / {}",
            format_bytes(self.memory_used_bytes),
            format_bytes(self.memory_total_bytes)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertMetric {
    Cpu,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Warning,
    High,
    Critical,
}

/// One threshold rule: fire when the metric observed for a process is
/// greater than or equal to `value`. Cpu values are percent, Memory
/// values are MiB.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRule {
    pub metric: AlertMetric,
    pub value: f64,
    pub severity: AlertSeverity,
}

/// A fired threshold rule. Recomputed on every evaluation; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub metric: AlertMetric,
    pub subject: String,
    pub threshold: f64,
    pub observed: f64,
    pub severity: AlertSeverity,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub fired_at: DateTime<Utc>,
}

/// Control command applied to a backend via `Backend::mutate`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutateCommand {
    Start { name: String },
    Stop { name: String },
    Restart { name: String },
    RestartPid { pid: u32 },
}

/// Outcome of a mutation. Adapters do not retry internally; a retry
/// decision belongs to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MutateOutcome {
    Accepted,
    NotFound,
    Failed { reason: String },
}

impl MutateOutcome {
    pub fn is_not_found(&self) -> bool {
        matches!(self, MutateOutcome::NotFound)
    }
}

/// Format bytes as human-readable string (e.g., "45.2 MiB")
pub fn format_bytes(bytes: u64) -> String {
    use byte_unit::{Byte, UnitType};

    let byte = Byte::from_u64(bytes);
    byte.get_appropriate_unit(UnitType::Binary).to_string()
}
