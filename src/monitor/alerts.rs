// Threshold evaluation over process metrics

use crate::monitor::models::{Alert, AlertMetric, ProcessDescriptor, ThresholdRule};
use chrono::Utc;

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// Evaluate every rule against every process; comparisons are `>=`.
/// Each call re-derives the full current alert set from the latest
/// metrics. There is no de-duplication and no hysteresis, so alerts
/// never go stale but a flapping process flaps its alerts too.
pub fn evaluate(processes: &[ProcessDescriptor], rules: &[ThresholdRule]) -> Vec<Alert> {
    let mut alerts = Vec::new();

    for process in processes {
        for rule in rules {
            let observed = match rule.metric {
                AlertMetric::Cpu => process.cpu_percent,
                AlertMetric::Memory => process.memory_bytes as f64 / BYTES_PER_MIB,
            };

            if observed >= rule.value {
                alerts.push(Alert {
                    metric: rule.metric,
                    subject: process.id.to_string(),
                    threshold: rule.value,
                    observed,
                    severity: rule.severity,
                    fired_at: Utc::now(),
                });
            }
        }
    }

    alerts
}

/// Evaluator bound to a configured rule set
pub struct AlertEvaluator {
    rules: Vec<ThresholdRule>,
}

impl AlertEvaluator {
    pub fn new(rules: Vec<ThresholdRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[ThresholdRule] {
        &self.rules
    }

    pub fn evaluate(&self, processes: &[ProcessDescriptor]) -> Vec<Alert> {
        evaluate(processes, &self.rules)
    }
}
