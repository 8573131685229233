// Aggregation engine: cache, snapshot assembly, alerts, control

pub mod aggregator;
pub mod alerts;
pub mod backend;
pub mod cache;
pub mod controller;
pub mod models;
pub mod retry;
pub mod service;


pub use aggregator::Aggregator;
pub use alerts::AlertEvaluator;
pub use backend::Backend;
pub use cache::{CacheTtl, ReportCache};
pub use controller::ProcessController;
pub use models::{
    Alert, AlertMetric, AlertSeverity, ClusterHealth, ErrorKind, HealthStatus, MonitorHealth,
    MutateCommand, MutateOutcome, ProcessDescriptor, ProcessId, ProcessKind, SubsystemReport,
    SystemResources, ThresholdRule,
};
pub use retry::{Backoff, RetryPolicy};
pub use service::Monitor;
