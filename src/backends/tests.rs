#[cfg(test)]
mod tests {
    use crate::backends::http;
    use crate::backends::proctable::{matches_keywords, sort_by_cpu};
    use crate::backends::{cluster, delivery, sourcehost, supervisor};
    use crate::monitor::models::{HealthStatus, ProcessDescriptor, ProcessId, ProcessKind};
    use serde_json::json;

    fn nodes(ready_flags: &[bool]) -> cluster::NodeList {
        let items: Vec<_> = ready_flags
            .iter()
            .map(|ready| {
                json!({
                    "status": {
                        "conditions": [
                            {"type": "MemoryPressure", "status": "False"},
                            {"type": "Ready", "status": if *ready { "True" } else { "False" }},
                        ]
                    }
                })
            })
            .collect();
        serde_json::from_value(json!({ "items": items })).unwrap()
    }

    fn pods(phases: &[&str]) -> cluster::PodList {
        let items: Vec<_> = phases
            .iter()
            .map(|phase| json!({"status": {"phase": phase}}))
            .collect();
        serde_json::from_value(json!({ "items": items })).unwrap()
    }

    #[test]
    fn test_cluster_all_ready_and_running_is_healthy() {
        let report = cluster::assess(&nodes(&[true, true]), &pods(&["Running", "Succeeded"]));
        assert_eq!(report.status, HealthStatus::Healthy);
        assert_eq!(report.detail["nodes_ready"], json!(2));
        assert_eq!(report.detail["pods_running"], json!(2));
        assert!(report.error.is_none());
    }

    #[test]
    fn test_cluster_unready_node_is_unhealthy() {
        let report = cluster::assess(&nodes(&[true, false]), &pods(&["Running"]));
        assert_eq!(report.status, HealthStatus::Unhealthy);
        assert_eq!(report.detail["nodes_ready"], json!(1));
        assert_eq!(report.detail["nodes_total"], json!(2));
    }

    #[test]
    fn test_cluster_pending_pod_is_degraded() {
        let report = cluster::assess(&nodes(&[true]), &pods(&["Running", "Pending"]));
        assert_eq!(report.status, HealthStatus::Degraded);
    }

    #[test]
    fn test_cluster_without_nodes_is_unhealthy() {
        let report = cluster::assess(&nodes(&[]), &pods(&[]));
        assert_eq!(report.status, HealthStatus::Unhealthy);
    }

    fn applications(pairs: &[(&str, &str)]) -> delivery::ApplicationList {
        let items: Vec<_> = pairs
            .iter()
            .map(|(sync, health)| {
                json!({
                    "status": {
                        "sync": {"status": sync},
                        "health": {"status": health},
                    }
                })
            })
            .collect();
        serde_json::from_value(json!({ "items": items })).unwrap()
    }

    #[test]
    fn test_delivery_all_synced_and_healthy() {
        let report = delivery::assess(&applications(&[
            ("Synced", "Healthy"),
            ("Synced", "Healthy"),
        ]));
        assert_eq!(report.status, HealthStatus::Healthy);
        assert_eq!(report.detail["apps_synced"], json!(2));
    }

    #[test]
    fn test_delivery_degraded_app_is_unhealthy() {
        let report = delivery::assess(&applications(&[
            ("Synced", "Healthy"),
            ("Synced", "Degraded"),
        ]));
        assert_eq!(report.status, HealthStatus::Unhealthy);
    }

    #[test]
    fn test_delivery_out_of_sync_is_degraded() {
        let report = delivery::assess(&applications(&[
            ("OutOfSync", "Healthy"),
            ("Synced", "Progressing"),
        ]));
        assert_eq!(report.status, HealthStatus::Degraded);
    }

    #[test]
    fn test_delivery_empty_controller_is_healthy() {
        // the controller answered; having nothing deployed is fine
        let report = delivery::assess(&applications(&[]));
        assert_eq!(report.status, HealthStatus::Healthy);
        assert_eq!(report.detail["apps_total"], json!(0));
    }

    #[test]
    fn test_sourcehost_healthz_mapping() {
        let pass: sourcehost::Healthz =
            serde_json::from_value(json!({"status": "pass"})).unwrap();
        assert_eq!(sourcehost::assess(&pass).status, HealthStatus::Healthy);

        let warn: sourcehost::Healthz =
            serde_json::from_value(json!({"status": "warn"})).unwrap();
        assert_eq!(sourcehost::assess(&warn).status, HealthStatus::Degraded);

        let fail: sourcehost::Healthz =
            serde_json::from_value(json!({"status": "fail"})).unwrap();
        assert_eq!(sourcehost::assess(&fail).status, HealthStatus::Unhealthy);
    }

    fn project(states: &[(&str, &str)]) -> supervisor::Project {
        let processes: serde_json::Map<String, serde_json::Value> = states
            .iter()
            .map(|(name, status)| {
                (
                    name.to_string(),
                    json!({
                        "status": status,
                        "mem_rss_kb": 2048,
                        "cpu_percent": 1.5,
                        "is_ready": status == &"Running",
                    }),
                )
            })
            .collect();
        serde_json::from_value(json!({"name": "platform", "processes": processes})).unwrap()
    }

    #[test]
    fn test_supervisor_all_running_is_healthy() {
        let report = supervisor::classify(&project(&[("api", "Running"), ("web", "Running")]));
        assert_eq!(report.status, HealthStatus::Healthy);
        assert_eq!(report.detail["processes_running"], json!(2));
        assert_eq!(report.detail["project"], json!("platform"));
    }

    #[test]
    fn test_supervisor_failed_process_is_unhealthy() {
        let report = supervisor::classify(&project(&[("api", "Running"), ("web", "Failed")]));
        assert_eq!(report.status, HealthStatus::Unhealthy);
        assert_eq!(report.detail["processes_failed"], json!("web"));
    }

    #[test]
    fn test_supervisor_partial_is_degraded() {
        let report = supervisor::classify(&project(&[("api", "Running"), ("web", "Pending")]));
        assert_eq!(report.status, HealthStatus::Degraded);
    }

    #[test]
    fn test_supervisor_descriptor_mapping() {
        let state: supervisor::ProcessState = serde_json::from_value(json!({
            "status": "Running",
            "mem_rss_kb": 4096,
            "cpu_percent": 12.5,
            "is_ready": true,
        }))
        .unwrap();

        let descriptor = supervisor::descriptor("api", &state);
        assert_eq!(descriptor.id, ProcessId::Name("api".to_string()));
        assert_eq!(descriptor.kind, ProcessKind::Managed);
        assert_eq!(descriptor.memory_bytes, 4096 * 1024);
        assert_eq!(descriptor.cpu_percent, 12.5);
        assert_eq!(descriptor.state, "Running");
    }

    #[test]
    fn test_supervisor_descriptor_defaults() {
        let state: supervisor::ProcessState = serde_json::from_value(json!({})).unwrap();
        let descriptor = supervisor::descriptor("api", &state);
        assert_eq!(descriptor.memory_bytes, 0);
        assert_eq!(descriptor.state, "unknown");
    }

    #[test]
    fn test_keyword_matching_is_case_insensitive() {
        let keywords = vec!["k3s".to_string(), "Containerd".to_string()];
        assert!(matches_keywords("k3s-server", &keywords));
        assert!(matches_keywords("containerd-shim", &keywords));
        assert!(!matches_keywords("bash", &keywords));
    }

    #[test]
    fn test_sort_by_cpu_orders_and_truncates() {
        let process = |pid: u32, cpu: f64| ProcessDescriptor {
            id: ProcessId::Pid(pid),
            kind: ProcessKind::OsProcess,
            name: format!("p{}", pid),
            cpu_percent: cpu,
            memory_bytes: 0,
            state: "Run".to_string(),
        };

        let sorted = sort_by_cpu(
            vec![process(1, 5.0), process(2, 80.0), process(3, 40.0)],
            2,
        );
        assert_eq!(sorted.len(), 2);
        assert_eq!(sorted[0].id, ProcessId::Pid(2));
        assert_eq!(sorted[1].id, ProcessId::Pid(3));
    }

    #[test]
    fn test_status_code_classification() {
        use crate::monitor::models::ErrorKind;
        use reqwest::StatusCode;

        assert_eq!(
            http::classify_status(StatusCode::UNAUTHORIZED),
            ErrorKind::PermissionDenied
        );
        assert_eq!(
            http::classify_status(StatusCode::FORBIDDEN),
            ErrorKind::PermissionDenied
        );
        assert_eq!(
            http::classify_status(StatusCode::INTERNAL_SERVER_ERROR),
            ErrorKind::InvalidResponse
        );
    }
}
