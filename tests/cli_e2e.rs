//! End-to-end CLI tests for the mixamo-downloader binary.

mod support;

use assert_cmd::Command;
use predicates::prelude::*;
use support::search_page;
use support::socket_guard::start_mock_server_or_skip;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

fn binary() -> Command {
    let mut cmd = Command::cargo_bin("mixamo-downloader").unwrap();
    cmd.env_remove("MIXAMO_ACCESS_TOKEN").env_remove("RUST_LOG");
    cmd
}

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    binary()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("motion catalog"))
        .stdout(predicate::str::contains("enumerate"))
        .stdout(predicate::str::contains("tpose"));
}

/// Test that --version displays version and exits with code 0.
#[test]
fn test_binary_version_displays_version() {
    binary()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mixamo-downloader"));
}

/// Test that a missing subcommand causes non-zero exit.
#[test]
fn test_binary_without_subcommand_returns_error() {
    binary()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

/// Test that invalid flags cause non-zero exit.
#[test]
fn test_binary_invalid_flag_returns_error() {
    binary()
        .args(["--invalid-flag", "tpose"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

/// Test that exporting from a missing snapshot fails with context.
#[test]
fn test_binary_export_without_catalog_fails() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    binary()
        .args(["-q", "export", "--output-dir"])
        .arg(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load catalog"));
}

/// Test that an unreachable identity endpoint is fatal.
#[test]
fn test_binary_tpose_fails_without_identity() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    binary()
        .args([
            "-q",
            "--base-url",
            "http://127.0.0.1:9",
            "--timeout-secs",
            "2",
            "tpose",
            "--output-dir",
        ])
        .arg(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("primary character"));
}

/// Test that enumerate writes the snapshot and summary.
#[tokio::test(flavor = "multi_thread")]
async fn test_binary_enumerate_writes_outputs() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/api/v1/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_page(vec![], 1, 10)))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let uri = mock_server.uri();
    let output_dir = temp_dir.path().to_path_buf();
    tokio::task::spawn_blocking(move || {
        binary()
            .args([
                "-q",
                "--base-url",
                uri.as_str(),
                "enumerate",
                "--stagnation-limit",
                "1",
                "--page-delay",
                "0",
                "--output-dir",
            ])
            .arg(&output_dir)
            .assert()
            .success()
            .stdout(predicate::str::contains("Collected 0 unique items"));
    })
    .await
    .unwrap();

    assert!(temp_dir.path().join("catalog.json").exists());
    assert!(temp_dir.path().join("download_summary.json").exists());
    assert!(!temp_dir.path().join("duplicate_differences.json").exists());
}

/// Test that query resolves the identity before any search request.
#[tokio::test(flavor = "multi_thread")]
async fn test_binary_query_checks_identity_before_searching() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/api/v1/characters/primary"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_page(vec![], 1, 0)))
        .expect(0)
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let uri = mock_server.uri();
    let output_dir = temp_dir.path().to_path_buf();
    tokio::task::spawn_blocking(move || {
        binary()
            .args(["-q", "--base-url", uri.as_str(), "query", "walk", "--output-dir"])
            .arg(&output_dir)
            .assert()
            .failure()
            .stderr(predicate::str::contains("primary character"));
    })
    .await
    .unwrap();
}
