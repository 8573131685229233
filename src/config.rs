// Configuration management

use crate::error::Result;
use crate::monitor::cache::CacheTtl;
use crate::monitor::models::{AlertMetric, AlertSeverity, ThresholdRule};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Freshness and deadline settings shared by every subsystem section.
/// TTLs are per-subsystem because upstreams vary widely in cost and
/// volatility; failure TTLs are shorter so outages recover faster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollSettings {
    pub ttl_secs: u64,
    pub failure_ttl_secs: u64,
    pub poll_timeout_secs: u64,
}

impl PollSettings {
    fn new(ttl_secs: u64, failure_ttl_secs: u64, poll_timeout_secs: u64) -> Self {
        Self {
            ttl_secs,
            failure_ttl_secs,
            poll_timeout_secs,
        }
    }

    pub fn cache_ttl(&self) -> CacheTtl {
        CacheTtl {
            fresh: Duration::from_secs(self.ttl_secs),
            failure: Duration::from_secs(self.failure_ttl_secs),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }
}

/// Kubernetes API server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub api_url: String,
    pub token: Option<String>,
    pub insecure_tls: bool,
    pub poll: PollSettings,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            api_url: "https://127.0.0.1:6443".to_string(),
            token: None,
            insecure_tls: false,
            poll: PollSettings::new(15, 5, 5),
        }
    }
}

/// Delivery controller (ArgoCD-style application API)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    pub api_url: String,
    pub token: Option<String>,
    pub insecure_tls: bool,
    pub poll: PollSettings,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            api_url: "https://argocd.localhost".to_string(),
            token: None,
            insecure_tls: false,
            poll: PollSettings::new(30, 10, 5),
        }
    }
}

/// Source-hosting service (Gitea-style API)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceHostConfig {
    pub api_url: String,
    pub token: Option<String>,
    pub poll: PollSettings,
}

impl Default for SourceHostConfig {
    fn default() -> Self {
        Self {
            api_url: "http://git.localhost:3000".to_string(),
            token: None,
            poll: PollSettings::new(30, 10, 5),
        }
    }
}

/// Process supervisor (process-compose-style API)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    pub api_url: String,
    pub poll: PollSettings,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080".to_string(),
            poll: PollSettings::new(10, 5, 5),
        }
    }
}

/// Local OS process table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessTableConfig {
    /// Name/cmdline keywords marking a process as orchestration-related
    pub filter_keywords: Vec<String>,
    /// Process names that may be restarted by pid
    pub restart_allowlist: Vec<String>,
    /// Grace window between SIGTERM and SIGKILL
    pub restart_grace_secs: u64,
    pub poll: PollSettings,
}

impl Default for ProcessTableConfig {
    fn default() -> Self {
        Self {
            filter_keywords: [
                "k3s",
                "containerd",
                "runc",
                "kubelet",
                "kubectl",
                "traefik",
                "coredns",
                "argocd",
                "gitea",
                "process-compose",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            restart_allowlist: ["uvicorn", "gunicorn", "python", "node"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            restart_grace_secs: 10,
            poll: PollSettings::new(5, 5, 5),
        }
    }
}

/// Retry behavior for control commands
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MutationConfig {
    pub max_attempts: usize,
    pub retry_delay_ms: u64,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            retry_delay_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cluster: ClusterConfig,
    pub delivery: DeliveryConfig,
    pub source_host: SourceHostConfig,
    pub supervisor: SupervisorConfig,
    pub process_table: ProcessTableConfig,
    pub alerts: Vec<ThresholdRule>,
    pub mutation: MutationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cluster: ClusterConfig::default(),
            delivery: DeliveryConfig::default(),
            source_host: SourceHostConfig::default(),
            supervisor: SupervisorConfig::default(),
            process_table: ProcessTableConfig::default(),
            alerts: vec![
                ThresholdRule {
                    metric: AlertMetric::Cpu,
                    value: 80.0,
                    severity: AlertSeverity::Warning,
                },
                ThresholdRule {
                    metric: AlertMetric::Cpu,
                    value: 95.0,
                    severity: AlertSeverity::Critical,
                },
                ThresholdRule {
                    metric: AlertMetric::Memory,
                    value: 2048.0,
                    severity: AlertSeverity::Warning,
                },
            ],
            mutation: MutationConfig::default(),
        }
    }
}

impl Config {
    /// Get default config path: ~/.config/stackwatch/config.yaml
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join("stackwatch").join("config.yaml"))
    }

    /// Load config from path, falling back to defaults if not found
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = path.unwrap_or_else(|| Self::default_path().unwrap_or_default());

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_yaml::from_str(&contents)?;
            Ok(config)
        } else {
            // Return defaults if no config file exists
            Ok(Self::default())
        }
    }

    /// Save config to path
    pub fn save(&self, path: PathBuf) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Threshold rules handed to the alert evaluator
    pub fn alert_rules(&self) -> Vec<ThresholdRule> {
        self.alerts.clone()
    }
}
