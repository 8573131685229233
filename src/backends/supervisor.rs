// Process supervisor backend (process-compose-style API)

use crate::backends::http;
use crate::config::SupervisorConfig;
use crate::error::{Result, StackwatchError};
use crate::monitor::backend::Backend;
use crate::monitor::models::{
    ErrorKind, HealthStatus, MutateCommand, MutateOutcome, ProcessDescriptor, ProcessId,
    ProcessKind, SubsystemReport,
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Project state as the supervisor reports it; field names follow its API
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Project {
    #[serde(default)]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) processes: BTreeMap<String, ProcessState>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ProcessState {
    #[serde(default)]
    pub(crate) status: String,
    #[serde(default)]
    pub(crate) mem_rss_kb: Option<u64>,
    #[serde(default)]
    pub(crate) cpu_percent: Option<f64>,
    #[serde(default)]
    pub(crate) is_ready: bool,
}

/// Wraps the supervisor's REST API: health polling, process listing,
/// start/stop/restart mutations and trailing log retrieval
pub struct SupervisorBackend {
    client: reqwest::Client,
    api_url: String,
    poll_timeout: Duration,
}

impl SupervisorBackend {
    pub const ID: &'static str = "supervisor";

    pub fn new(config: &SupervisorConfig) -> Result<Self> {
        Ok(Self {
            client: http::build_client(config.poll.timeout(), false)?,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            poll_timeout: config.poll.timeout(),
        })
    }

    async fn project(&self) -> std::result::Result<Project, (ErrorKind, String)> {
        http::get_json(&self.client, format!("{}/project", self.api_url), None).await
    }

    /// All managed processes, in name order
    pub async fn list_processes(&self) -> Result<Vec<ProcessDescriptor>> {
        let project = self
            .project()
            .await
            .map_err(|(_, message)| StackwatchError::Supervisor(message))?;

        Ok(project
            .processes
            .iter()
            .map(|(name, state)| descriptor(name, state))
            .collect())
    }

    /// One managed process by name; Ok(None) when the supervisor does
    /// not know it
    pub async fn process(&self, name: &str) -> Result<Option<ProcessDescriptor>> {
        let response = self
            .client
            .get(format!("{}/processes/{}", self.api_url, name))
            .send()
            .await
            .map_err(|e| StackwatchError::Supervisor(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(StackwatchError::Supervisor(format!(
                "process lookup for '{}' returned {}",
                name,
                response.status()
            ))
            .into());
        }

        let state: ProcessState = response
            .json()
            .await
            .map_err(|e| StackwatchError::Supervisor(e.to_string()))?;

        Ok(Some(descriptor(name, &state)))
    }

    /// Trailing log lines of a managed process
    pub async fn logs(&self, name: &str, tail: usize) -> Result<Vec<String>> {
        let response = self
            .client
            .get(format!(
                "{}/processes/{}/logs?tail={}",
                self.api_url, name, tail
            ))
            .send()
            .await
            .map_err(|e| StackwatchError::Supervisor(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(
                StackwatchError::Supervisor(format!("process '{}' not found", name)).into(),
            );
        }
        if !response.status().is_success() {
            return Err(StackwatchError::Supervisor(format!(
                "log fetch for '{}' returned {}",
                name,
                response.status()
            ))
            .into());
        }

        let body = response
            .text()
            .await
            .map_err(|e| StackwatchError::Supervisor(e.to_string()))?;

        Ok(body.lines().map(|line| line.to_string()).collect())
    }

    async fn post_action(&self, name: &str, action: &str) -> MutateOutcome {
        let url = format!("{}/processes/{}/{}", self.api_url, name, action);

        let response = match self.client.post(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                return MutateOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        let status = response.status();
        if status.is_success() {
            MutateOutcome::Accepted
        } else if status == StatusCode::NOT_FOUND {
            MutateOutcome::NotFound
        } else {
            let body = response.text().await.unwrap_or_default();
            MutateOutcome::Failed {
                reason: format!("{} returned {}: {}", action, status, body),
            }
        }
    }
}

#[async_trait]
impl Backend for SupervisorBackend {
    fn id(&self) -> &str {
        Self::ID
    }

    fn poll_timeout(&self) -> Duration {
        self.poll_timeout
    }

    async fn poll(&self) -> SubsystemReport {
        match self.project().await {
            Ok(project) => classify(&project),
            Err((kind, message)) => SubsystemReport::failure(Self::ID, kind, message),
        }
    }

    async fn mutate(&self, cmd: MutateCommand) -> MutateOutcome {
        match cmd {
            MutateCommand::Start { name } => self.post_action(&name, "start").await,
            MutateCommand::Stop { name } => self.post_action(&name, "stop").await,
            MutateCommand::Restart { name } => self.post_action(&name, "restart").await,
            MutateCommand::RestartPid { .. } => MutateOutcome::Failed {
                reason: "supervisor processes are addressed by name, not pid".to_string(),
            },
        }
    }
}

/// Classify supervisor health from the project state: any failed or
/// crashed process is Unhealthy, all running is Healthy, anything in
/// between (pending, completed, restarting) is Degraded.
pub(crate) fn classify(project: &Project) -> SubsystemReport {
    let total = project.processes.len();
    let running = project
        .processes
        .values()
        .filter(|process| process.status == "Running")
        .count();
    let ready = project
        .processes
        .values()
        .filter(|process| process.is_ready)
        .count();
    let failed: Vec<&str> = project
        .processes
        .iter()
        .filter(|(_, process)| matches!(process.status.as_str(), "Failed" | "Crashed"))
        .map(|(name, _)| name.as_str())
        .collect();

    let status = if !failed.is_empty() {
        HealthStatus::Unhealthy
    } else if running == total {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    };

    let mut detail = BTreeMap::new();
    if !project.name.is_empty() {
        detail.insert(
            "project".to_string(),
            serde_json::Value::String(project.name.clone()),
        );
    }
    detail.insert("processes_total".to_string(), total.into());
    detail.insert("processes_running".to_string(), running.into());
    detail.insert("processes_ready".to_string(), ready.into());
    if !failed.is_empty() {
        detail.insert(
            "processes_failed".to_string(),
            serde_json::Value::String(failed.join(",")),
        );
    }

    SubsystemReport::observed(SupervisorBackend::ID, status, detail)
}

pub(crate) fn descriptor(name: &str, state: &ProcessState) -> ProcessDescriptor {
    ProcessDescriptor {
        id: ProcessId::Name(name.to_string()),
        kind: ProcessKind::Managed,
        name: name.to_string(),
        cpu_percent: state.cpu_percent.unwrap_or(0.0),
        memory_bytes: state.mem_rss_kb.unwrap_or(0) * 1024,
        state: if state.status.is_empty() {
            "unknown".to_string()
        } else {
            state.status.clone()
        },
    }
}
