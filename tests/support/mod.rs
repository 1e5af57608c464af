//! Shared fixtures for integration tests: socket guard, mock payloads, and
//! sequenced responders.

#![allow(dead_code)]

pub mod socket_guard;

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use mixamo_core::catalog::CatalogItem;
use mixamo_core::export::ExportConfig;
use mixamo_core::gateway::{ApiClient, GatewayConfig};
use mixamo_core::run::{ItemOutcome, ProgressObserver};
use serde_json::{Value, json};
use wiremock::{MockServer, Respond, ResponseTemplate};

/// Client pointed at the mock server with a short request timeout.
pub fn client_for(server: &MockServer) -> ApiClient {
    let config = GatewayConfig::new(server.uri())
        .with_access_token("test-token")
        .with_request_timeout(Duration::from_secs(5));
    ApiClient::new(&config).expect("mock gateway config is valid")
}

/// Export settings with millisecond waits.
pub fn fast_export_config() -> ExportConfig {
    ExportConfig::default()
        .with_poll_interval(Duration::from_millis(1))
        .with_poll_budget(5)
        .with_rate_limit_backoff(Duration::from_millis(10))
        .with_item_delay(Duration::ZERO)
}

/// A search record as the products endpoint returns it.
pub fn motion_record(id: &str, description: &str) -> Value {
    json!({
        "id": id,
        "type": "Motion",
        "description": description,
        "name": description.to_lowercase(),
    })
}

/// One search page body.
pub fn search_page(records: Vec<Value>, num_pages: u32, num_results: u64) -> Value {
    json!({
        "results": records,
        "pagination": {"num_pages": num_pages, "num_results": num_results}
    })
}

/// A search record that already embeds a hash block.
pub fn record_with_hash(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "type": "Motion",
        "description": name,
        "details": {
            "gms_hash": {
                "model-id": 103_120,
                "mirror": false,
                "params": [["Overdrive", 0], ["Emotion", 50]],
                "overdrive": 5,
                "trim": [0, 100]
            }
        }
    })
}

/// A catalog item whose record already embeds a hash block.
pub fn item_with_hash(id: &str, name: &str) -> CatalogItem {
    CatalogItem::from_record(&record_with_hash(id, name), "a").expect("record has an id")
}

/// A catalog item without a hash block; preparing it needs product details.
pub fn item_without_hash(id: &str, name: &str) -> CatalogItem {
    CatalogItem::from_record(&motion_record(id, name), "a").expect("record has an id")
}

/// Monitor body for a given status.
pub fn monitor_body(status: &str, job_result: Option<&str>) -> Value {
    json!({"status": status, "job_result": job_result})
}

/// Replays `responses` in order, repeating the last one once exhausted.
pub struct SequenceResponder {
    responses: Vec<ResponseTemplate>,
    calls: AtomicUsize,
}

impl SequenceResponder {
    pub fn new(responses: Vec<ResponseTemplate>) -> Self {
        assert!(!responses.is_empty(), "sequence needs at least one response");
        Self {
            responses,
            calls: AtomicUsize::new(0),
        }
    }
}

impl Respond for SequenceResponder {
    fn respond(&self, _request: &wiremock::Request) -> ResponseTemplate {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let index = n.min(self.responses.len() - 1);
        self.responses[index].clone()
    }
}

/// Observer that records every notification.
#[derive(Default)]
pub struct RecordingObserver {
    pub totals: Mutex<Vec<usize>>,
    pub progress: Mutex<Vec<(usize, usize)>>,
    pub results: Mutex<Vec<(String, &'static str)>>,
}

impl ProgressObserver for RecordingObserver {
    fn on_total(&self, total: usize) {
        self.totals.lock().unwrap().push(total);
    }

    fn on_progress(&self, completed: usize, total: usize) {
        self.progress.lock().unwrap().push((completed, total));
    }

    fn on_item_result(&self, item_id: &str, outcome: &ItemOutcome) {
        let label = match outcome {
            ItemOutcome::Skipped { .. } => "skipped",
            ItemOutcome::Succeeded { .. } => "succeeded",
            ItemOutcome::Failed { .. } => "failed",
        };
        self.results
            .lock()
            .unwrap()
            .push((item_id.to_string(), label));
    }
}
