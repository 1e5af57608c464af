//! Integration tests for export runs: resume skipping, artifact persistence,
//! per-item failure isolation, cancellation, and the neutral pose.

mod support;

use std::sync::Arc;

use mixamo_core::catalog::{
    CollectionState, PartitionFetch, StopReason, load_catalog, write_enumeration_outputs,
};
use mixamo_core::download::DownloadResumer;
use mixamo_core::run::{Character, ExportRunner, RunSummary};
use serde_json::json;
use support::socket_guard::start_mock_server_or_skip;
use support::{
    RecordingObserver, client_for, fast_export_config, item_with_hash, item_without_hash,
    monitor_body, record_with_hash,
};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{any, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EXPORT: &str = "/api/v1/animations/export";
const MONITOR: &str = "/api/v1/characters/c-1/monitor";

fn character() -> Character {
    Character {
        id: "c-1".to_string(),
        name: "Y Bot".to_string(),
    }
}

/// Mounts an export endpoint that accepts everything and a monitor that
/// completes immediately with an artifact served by the same mock.
async fn mount_successful_export(mock_server: &MockServer, artifact: &[u8]) {
    let artifact_url = format!("{}/artifacts/result.fbx", mock_server.uri());
    Mock::given(method("POST"))
        .and(path(EXPORT))
        .respond_with(ResponseTemplate::new(202))
        .mount(mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(MONITOR))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(monitor_body("completed", Some(&artifact_url))),
        )
        .mount(mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/artifacts/result.fbx"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(artifact.to_vec()))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_run_skips_existing_artifacts_without_network() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().expect("failed to create temp dir");
    std::fs::write(temp_dir.path().join("Idle.fbx"), b"existing").unwrap();
    std::fs::write(temp_dir.path().join("Walk.fbx"), b"existing").unwrap();

    let runner = ExportRunner::new(
        client_for(&mock_server),
        fast_export_config(),
        DownloadResumer::new(temp_dir.path()),
    );
    let items = [item_with_hash("m-1", "Idle"), item_without_hash("m-2", "Walk")];
    let summary = runner.run_catalog(&character(), &items).await;

    assert_eq!(
        summary,
        RunSummary {
            skipped: 2,
            ..RunSummary::default()
        }
    );
    assert_eq!(std::fs::read(temp_dir.path().join("Idle.fbx")).unwrap(), b"existing");
}

#[tokio::test]
async fn test_run_exports_and_saves_missing_artifacts() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_successful_export(&mock_server, b"FBX binary payload").await;

    let temp_dir = TempDir::new().expect("failed to create temp dir");
    std::fs::write(temp_dir.path().join("Idle.fbx"), b"existing").unwrap();

    let observer = Arc::new(RecordingObserver::default());
    let runner = ExportRunner::new(
        client_for(&mock_server),
        fast_export_config(),
        DownloadResumer::new(temp_dir.path()),
    )
    .with_observer(Arc::clone(&observer) as _);
    let items = [item_with_hash("m-1", "Idle"), item_with_hash("m-2", "Run")];
    let summary = runner.run_catalog(&character(), &items).await;

    assert_eq!(summary.attempted, 1);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 0);
    assert!(!summary.cancelled);

    let saved = std::fs::read(temp_dir.path().join("Run.fbx")).unwrap();
    assert_eq!(saved, b"FBX binary payload");
    assert!(!temp_dir.path().join("Run.fbx.part").exists());

    assert_eq!(*observer.totals.lock().unwrap(), [2]);
    assert_eq!(*observer.progress.lock().unwrap(), [(1, 2), (2, 2)]);
    assert_eq!(
        *observer.results.lock().unwrap(),
        [
            ("m-1".to_string(), "skipped"),
            ("m-2".to_string(), "succeeded")
        ]
    );
}

#[tokio::test]
async fn test_run_continues_after_item_failure() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_successful_export(&mock_server, b"data").await;
    Mock::given(method("GET"))
        .and(path("/api/v1/products/m-1"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let runner = ExportRunner::new(
        client_for(&mock_server),
        fast_export_config(),
        DownloadResumer::new(temp_dir.path()),
    );
    let items = [item_without_hash("m-1", "Broken"), item_with_hash("m-2", "Run")];
    let summary = runner.run_catalog(&character(), &items).await;

    assert_eq!(summary.attempted, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.succeeded, 1);
    assert!(!temp_dir.path().join("Broken.fbx").exists());
    assert!(temp_dir.path().join("Run.fbx").exists());
}

#[tokio::test]
async fn test_run_failed_download_leaves_no_marker() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    let artifact_url = format!("{}/artifacts/missing.fbx", mock_server.uri());
    Mock::given(method("POST"))
        .and(path(EXPORT))
        .respond_with(ResponseTemplate::new(202))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(MONITOR))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(monitor_body("completed", Some(&artifact_url))),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/artifacts/missing.fbx"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let runner = ExportRunner::new(
        client_for(&mock_server),
        fast_export_config(),
        DownloadResumer::new(temp_dir.path()),
    );
    let summary = runner
        .run_catalog(&character(), &[item_with_hash("m-1", "Idle")])
        .await;

    assert_eq!(summary.failed, 1);
    assert!(!temp_dir.path().join("Idle.fbx").exists());
    assert!(!temp_dir.path().join("Idle.fbx.part").exists());
}

#[tokio::test]
async fn test_run_disambiguates_colliding_names() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_successful_export(&mock_server, b"data").await;

    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let runner = ExportRunner::new(
        client_for(&mock_server),
        fast_export_config(),
        DownloadResumer::new(temp_dir.path()),
    );
    let items = [item_with_hash("id-001", "Idle"), item_with_hash("id-002", "Idle")];
    let summary = runner.run_catalog(&character(), &items).await;

    assert_eq!(summary.succeeded, 2);
    assert!(temp_dir.path().join("Idle-001.fbx").exists());
    assert!(temp_dir.path().join("Idle-002.fbx").exists());
}

/// Writes a snapshot of `records` into `dir` and loads it back.
async fn enumerate_into(
    dir: &std::path::Path,
    records: Vec<serde_json::Value>,
) -> Vec<mixamo_core::catalog::CatalogItem> {
    let mut state = CollectionState::new();
    state.ingest(PartitionFetch::complete("a", records));
    let total = state.unique();
    let outputs = write_enumeration_outputs(&state.finish(Some(total), StopReason::Complete), dir)
        .await
        .unwrap();
    load_catalog(&outputs.catalog).await.unwrap().into_items()
}

#[tokio::test]
async fn test_artifact_marker_survives_catalog_growth() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_successful_export(&mock_server, b"data").await;

    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let runner = ExportRunner::new(
        client_for(&mock_server),
        fast_export_config(),
        DownloadResumer::new(temp_dir.path()),
    );

    let items = enumerate_into(temp_dir.path(), vec![record_with_hash("aaa111", "Idle")]).await;
    let first = runner.run_catalog(&character(), &items).await;
    assert_eq!(first.succeeded, 1);
    assert!(temp_dir.path().join("Idle.fbx").exists());

    let items = enumerate_into(
        temp_dir.path(),
        vec![record_with_hash("aaa111", "Idle"), record_with_hash("ccc333", "Idle")],
    )
    .await;
    let second = runner.run_catalog(&character(), &items).await;

    assert_eq!(second.skipped, 1);
    assert_eq!(second.attempted, 1);
    assert_eq!(second.succeeded, 1);
    assert!(temp_dir.path().join("Idle-333.fbx").exists());
    assert!(!temp_dir.path().join("Idle-111.fbx").exists());

    let posts = mock_server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|request| request.method.as_str() == "POST")
        .count();
    assert_eq!(posts, 2);
}

#[tokio::test]
async fn test_run_stops_when_cancelled() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let cancel = CancellationToken::new();
    cancel.cancel();
    let runner = ExportRunner::new(
        client_for(&mock_server),
        fast_export_config(),
        DownloadResumer::new(temp_dir.path()),
    )
    .with_cancellation(cancel);
    let summary = runner
        .run_catalog(&character(), &[item_with_hash("m-1", "Idle")])
        .await;

    assert!(summary.cancelled);
    assert_eq!(summary.processed(), 0);
}

#[tokio::test]
async fn test_neutral_pose_export_uses_character_name() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    let artifact_url = format!("{}/artifacts/pose.fbx", mock_server.uri());
    Mock::given(method("POST"))
        .and(path(EXPORT))
        .and(body_partial_json(json!({
            "character_id": "c-1",
            "product_name": "Y Bot",
            "type": "Character",
            "preferences": {"format": "fbx7_2019", "mesh": "t-pose"},
            "gms_hash": null
        })))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(MONITOR))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(monitor_body("completed", Some(&artifact_url))),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/artifacts/pose.fbx"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"pose".to_vec()))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let runner = ExportRunner::new(
        client_for(&mock_server),
        fast_export_config(),
        DownloadResumer::new(temp_dir.path()),
    );
    let summary = runner.run_neutral_pose(&character()).await;

    assert_eq!(summary.succeeded, 1);
    assert_eq!(std::fs::read(temp_dir.path().join("Y Bot.fbx")).unwrap(), b"pose");

    // A second run finds the marker and stays offline.
    let again = runner.run_neutral_pose(&character()).await;
    assert_eq!(again.skipped, 1);
    assert_eq!(again.attempted, 0);
}
