// Source-hosting backend (Gitea-style API)

use crate::backends::http;
use crate::config::SourceHostConfig;
use crate::error::Result;
use crate::monitor::backend::Backend;
use crate::monitor::models::{HealthStatus, SubsystemReport};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Healthz {
    #[serde(default)]
    pub(crate) status: String,
}

/// Polls the source host's health endpoint plus basic repository stats
pub struct SourceHostBackend {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
    poll_timeout: Duration,
}

impl SourceHostBackend {
    pub const ID: &'static str = "source_host";

    pub fn new(config: &SourceHostConfig) -> Result<Self> {
        Ok(Self {
            client: http::build_client(config.poll.timeout(), false)?,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            poll_timeout: config.poll.timeout(),
        })
    }

    /// Repository count via the search endpoint's X-Total-Count header.
    /// Best-effort garnish for the report detail, never a failure cause.
    async fn repository_count(&self) -> Option<u64> {
        let mut request = self
            .client
            .get(format!("{}/api/v1/repos/search?limit=1", self.api_url));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.ok()?;
        response
            .headers()
            .get("x-total-count")?
            .to_str()
            .ok()?
            .parse()
            .ok()
    }
}

#[async_trait]
impl Backend for SourceHostBackend {
    fn id(&self) -> &str {
        Self::ID
    }

    fn poll_timeout(&self) -> Duration {
        self.poll_timeout
    }

    async fn poll(&self) -> SubsystemReport {
        let healthz: Healthz = match http::get_json(
            &self.client,
            format!("{}/api/healthz", self.api_url),
            self.token.as_deref(),
        )
        .await
        {
            Ok(healthz) => healthz,
            Err((kind, message)) => return SubsystemReport::failure(Self::ID, kind, message),
        };

        let mut report = assess(&healthz);
        if let Some(count) = self.repository_count().await {
            report
                .detail
                .insert("repositories".to_string(), count.into());
        }
        report
    }
}

/// Map the healthz verdict onto the common model
pub(crate) fn assess(healthz: &Healthz) -> SubsystemReport {
    let status = match healthz.status.as_str() {
        "pass" | "ok" => HealthStatus::Healthy,
        "warn" => HealthStatus::Degraded,
        _ => HealthStatus::Unhealthy,
    };

    let mut detail = BTreeMap::new();
    detail.insert(
        "healthz".to_string(),
        serde_json::Value::String(healthz.status.clone()),
    );

    SubsystemReport::observed(SourceHostBackend::ID, status, detail)
}
