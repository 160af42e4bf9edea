//! The curl transport against a local scripted ingest endpoint.

mod common;

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use common::ingest_server::{self, Reply};
use rollship_core::client::http::{Credentials, HttpConnector};
use rollship_core::{
    BackoffPolicy, ClientRegistry, IngestionDestination, IngestionOrchestrator, RelocationCause,
    TaskReport, TaskState,
};
use tempfile::tempdir;

fn orchestrator(base_url: &str, credentials: Credentials) -> IngestionOrchestrator {
    let dest = IngestionDestination::new(base_url, "Logs", "AppEvents")
        .unwrap()
        .with_mapping(Some("app_csv"), Some("csv"));
    let connector = HttpConnector::new(credentials)
        .with_timeouts(Duration::from_secs(2), Duration::from_secs(5));
    let registry = Arc::new(ClientRegistry::new());
    registry.get_or_init(&dest, &connector).unwrap();
    let policy = BackoffPolicy::default().with_delays(Duration::from_millis(1), Duration::from_millis(2));
    IngestionOrchestrator::new(registry, policy)
}

#[test]
fn posts_file_body_with_destination_and_token() {
    let server = ingest_server::start(vec![Reply::ok()]);
    let dir = tempdir().unwrap();
    let path = dir.path().join("app-1.log");
    fs::write(&path, b"2024-05-01,INFO,started\n2024-05-01,WARN,slow\n").unwrap();

    let report = orchestrator(&server.base_url, Credentials::AccessToken("t0ken".to_string())).submit(&path);

    assert_eq!(report.state(), TaskState::Delivered);
    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert_eq!(req.method, "POST");
    assert_eq!(
        req.target,
        "/v1/rest/ingest/Logs/AppEvents?streamFormat=Csv&mappingName=app_csv"
    );
    assert_eq!(req.headers.get("authorization").map(String::as_str), Some("Bearer t0ken"));
    assert_eq!(req.body, b"2024-05-01,INFO,started\n2024-05-01,WARN,slow\n");
}

#[test]
fn service_unavailable_is_retried_until_success() {
    let server = ingest_server::start(vec![Reply::status(503), Reply::status(429), Reply::ok()]);
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.log");
    fs::write(&path, b"row\n").unwrap();

    let report = orchestrator(&server.base_url, Credentials::Anonymous).submit(&path);

    assert_eq!(report.state(), TaskState::Delivered);
    assert_eq!(report.attempts(), 3);
    assert_eq!(server.requests().len(), 3);
    assert!(server.requests()[0].headers.get("authorization").is_none());
}

#[test]
fn permanent_flag_in_error_body_stops_retries() {
    let body = r#"{"error":{"code":"BadRequest_MappingReferenceWasNotFound","message":"Mapping reference 'app_csv' was not found","@permanent":true}}"#;
    let server = ingest_server::start(vec![Reply::json(400, body)]);
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.log");
    fs::write(&path, b"row\n").unwrap();

    let report = orchestrator(&server.base_url, Credentials::Anonymous).submit(&path);

    assert_eq!(server.requests().len(), 1);
    assert!(matches!(
        report,
        TaskReport::Relocated {
            cause: RelocationCause::Permanent(_),
            ..
        }
    ));
    assert!(dir.path().join("backout/app.log").exists());
    assert!(!path.exists());
}

#[test]
fn unreachable_endpoint_exhausts_and_backs_out() {
    let url = ingest_server::dead_url();
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.log");
    fs::write(&path, b"row\n").unwrap();

    let report = orchestrator(&url, Credentials::Anonymous).submit(&path);

    assert_eq!(report.attempts(), 3);
    assert!(matches!(
        report,
        TaskReport::Relocated {
            cause: RelocationCause::Exhausted(_),
            ..
        }
    ));
    assert_eq!(fs::read(dir.path().join("backout/app.log")).unwrap(), b"row\n");
}
