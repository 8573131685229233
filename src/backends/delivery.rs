// Delivery controller backend (ArgoCD-style application API)

use crate::backends::http;
use crate::config::DeliveryConfig;
use crate::error::Result;
use crate::monitor::backend::Backend;
use crate::monitor::models::{HealthStatus, SubsystemReport};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApplicationList {
    #[serde(default)]
    pub(crate) items: Vec<Application>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Application {
    #[serde(default)]
    pub(crate) status: ApplicationStatus,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApplicationStatus {
    #[serde(default)]
    pub(crate) sync: SyncStatus,
    #[serde(default)]
    pub(crate) health: ApplicationHealth,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SyncStatus {
    #[serde(default)]
    pub(crate) status: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApplicationHealth {
    #[serde(default)]
    pub(crate) status: String,
}

/// Polls the delivery controller for per-application sync and health
pub struct DeliveryBackend {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
    poll_timeout: Duration,
}

impl DeliveryBackend {
    pub const ID: &'static str = "delivery";

    pub fn new(config: &DeliveryConfig) -> Result<Self> {
        Ok(Self {
            client: http::build_client(config.poll.timeout(), config.insecure_tls)?,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            poll_timeout: config.poll.timeout(),
        })
    }
}

#[async_trait]
impl Backend for DeliveryBackend {
    fn id(&self) -> &str {
        Self::ID
    }

    fn poll_timeout(&self) -> Duration {
        self.poll_timeout
    }

    async fn poll(&self) -> SubsystemReport {
        let applications: ApplicationList = match http::get_json(
            &self.client,
            format!("{}/api/v1/applications", self.api_url),
            self.token.as_deref(),
        )
        .await
        {
            Ok(list) => list,
            Err((kind, message)) => return SubsystemReport::failure(Self::ID, kind, message),
        };

        assess(&applications)
    }
}

/// Classify controller health from the application list. An application
/// whose health is Degraded or Missing makes the subsystem Unhealthy;
/// anything short of all-Synced-and-Healthy degrades it. An empty list
/// is Healthy: the controller itself answered.
pub(crate) fn assess(applications: &ApplicationList) -> SubsystemReport {
    let total = applications.items.len();
    let synced = applications
        .items
        .iter()
        .filter(|app| app.status.sync.status == "Synced")
        .count();
    let healthy = applications
        .items
        .iter()
        .filter(|app| app.status.health.status == "Healthy")
        .count();
    let broken = applications
        .items
        .iter()
        .any(|app| matches!(app.status.health.status.as_str(), "Degraded" | "Missing"));

    let status = if broken {
        HealthStatus::Unhealthy
    } else if synced == total && healthy == total {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    };

    let mut detail = BTreeMap::new();
    detail.insert("apps_total".to_string(), total.into());
    detail.insert("apps_synced".to_string(), synced.into());
    detail.insert("apps_healthy".to_string(), healthy.into());

    SubsystemReport::observed(DeliveryBackend::ID, status, detail)
}
