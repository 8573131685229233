// Kubernetes API server backend

use crate::backends::http;
use crate::config::ClusterConfig;
use crate::error::Result;
use crate::monitor::backend::Backend;
use crate::monitor::models::{HealthStatus, SubsystemReport};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

// Raw API objects; only the fields we classify on.

#[derive(Debug, Default, Deserialize)]
pub(crate) struct NodeList {
    #[serde(default)]
    pub(crate) items: Vec<Node>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Node {
    #[serde(default)]
    pub(crate) status: NodeStatus,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct NodeStatus {
    #[serde(default)]
    pub(crate) conditions: Vec<NodeCondition>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct NodeCondition {
    #[serde(rename = "type", default)]
    pub(crate) kind: String,
    #[serde(default)]
    pub(crate) status: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PodList {
    #[serde(default)]
    pub(crate) items: Vec<Pod>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Pod {
    #[serde(default)]
    pub(crate) status: PodStatus,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PodStatus {
    #[serde(default)]
    pub(crate) phase: String,
}

/// Polls the cluster API for node readiness and pod phases
pub struct ClusterBackend {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
    poll_timeout: Duration,
}

impl ClusterBackend {
    pub const ID: &'static str = "cluster";

    pub fn new(config: &ClusterConfig) -> Result<Self> {
        Ok(Self {
            client: http::build_client(config.poll.timeout(), config.insecure_tls)?,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            poll_timeout: config.poll.timeout(),
        })
    }
}

#[async_trait]
impl Backend for ClusterBackend {
    fn id(&self) -> &str {
        Self::ID
    }

    fn poll_timeout(&self) -> Duration {
        self.poll_timeout
    }

    async fn poll(&self) -> SubsystemReport {
        let token = self.token.as_deref();

        let nodes: NodeList = match http::get_json(
            &self.client,
            format!("{}/api/v1/nodes", self.api_url),
            token,
        )
        .await
        {
            Ok(list) => list,
            Err((kind, message)) => return SubsystemReport::failure(Self::ID, kind, message),
        };

        let pods: PodList = match http::get_json(
            &self.client,
            format!("{}/api/v1/pods", self.api_url),
            token,
        )
        .await
        {
            Ok(list) => list,
            Err((kind, message)) => return SubsystemReport::failure(Self::ID, kind, message),
        };

        assess(&nodes, &pods)
    }
}

/// Classify cluster health from the raw node and pod lists. Any node
/// that is not Ready makes the whole cluster Unhealthy; pods stuck
/// outside Running/Succeeded only degrade it.
pub(crate) fn assess(nodes: &NodeList, pods: &PodList) -> SubsystemReport {
    let nodes_total = nodes.items.len();
    let nodes_ready = nodes.items.iter().filter(|node| node_ready(node)).count();
    let pods_total = pods.items.len();
    let pods_running = pods
        .items
        .iter()
        .filter(|pod| matches!(pod.status.phase.as_str(), "Running" | "Succeeded"))
        .count();

    let status = if nodes_total == 0 || nodes_ready < nodes_total {
        HealthStatus::Unhealthy
    } else if pods_total == 0 || pods_running < pods_total {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    };

    let mut detail = BTreeMap::new();
    detail.insert("nodes_ready".to_string(), nodes_ready.into());
    detail.insert("nodes_total".to_string(), nodes_total.into());
    detail.insert("pods_running".to_string(), pods_running.into());
    detail.insert("pods_total".to_string(), pods_total.into());

    SubsystemReport::observed(ClusterBackend::ID, status, detail)
}

fn node_ready(node: &Node) -> bool {
    node.status
        .conditions
        .iter()
        .any(|condition| condition.kind == "Ready" && condition.status == "True")
}
