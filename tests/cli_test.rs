//! CLI integration tests
//!
//! Tests for the interactive binary using assert_cmd.
//!
//! These tests verify:
//! - Help and version flags
//! - Exit status for configuration errors
//! - End-to-end output against a mocked server

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Get a command for the interactive binary
#[allow(deprecated)]
fn cmd() -> Command {
    Command::cargo_bin("plex-metrics").expect("Failed to find plex-metrics binary")
}

async fn mock_plex() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"MediaContainer": {"friendlyName": "basement"}})),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/library/sections"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "MediaContainer": {"Directory": [{"key": "1", "title": "Movies", "type": "movie"}]}
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/status/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<MediaContainer size="3">
  <Video><Player state="playing"/></Video>
  <Video><Player state="playing"/></Video>
  <Video><Player state="paused"/></Video>
</MediaContainer>"#,
        ))
        .mount(&server)
        .await;

    server
}

fn host_port(server: &MockServer) -> (String, String) {
    let addr = server.address();
    (addr.ip().to_string(), addr.port().to_string())
}

/// Test --help flag displays usage information
#[test]
fn test_help_flag() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("--include"))
        .stdout(predicate::str::contains("--sessions"));
}

/// Test --version flag displays version
#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

/// Missing positional arguments are a usage error
#[test]
fn test_missing_arguments() {
    cmd().arg("plex.local").assert().failure();
}

/// Nothing selected fails before any request is made
#[test]
fn test_no_metrics_selected() {
    cmd()
        .args(["127.0.0.1", "1", "token", "--https", "false"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No metrics configured"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sessions_end_to_end() {
    let server = mock_plex().await;
    let (host, port) = host_port(&server);

    let output = tokio::task::spawn_blocking(move || {
        cmd()
            .args([host.as_str(), port.as_str(), "token", "--https", "false", "--sessions"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone()
    })
    .await
    .unwrap();

    let records: Vec<Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["type_instance"], "sessions-total");
    assert_eq!(records[0]["value"], 3.0);
    assert_eq!(records[1]["type_instance"], "sessions-active");
    assert_eq!(records[1]["value"], 2.0);
    assert_eq!(records[2]["type_instance"], "sessions-inactive");
    assert_eq!(records[2]["value"], 1.0);
    assert_eq!(records[2]["full_name"], "plex-basement.sessions-inactive.value");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_include_section_fails() {
    let server = mock_plex().await;
    let (host, port) = host_port(&server);

    tokio::task::spawn_blocking(move || {
        cmd()
            .args([
                host.as_str(),
                port.as_str(),
                "token",
                "--https",
                "false",
                "--movies",
                "--episodes",
                "--include",
                "5",
            ])
            .assert()
            .failure()
            .stdout(predicate::str::is_empty())
            .stderr(predicate::str::contains("Requested section not found"))
            .stderr(predicate::str::contains("No metrics collected"));
    })
    .await
    .unwrap();
}
