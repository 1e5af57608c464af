//! Sequential export loop over a catalog.
//!
//! Items are processed strictly one after another in catalog order. For each
//! item the runner:
//!
//! 1. checks the stop signal (the only cancellation point)
//! 2. checks the completion marker and skips the item, with no network
//!    activity, if the artifact already exists; the marker path comes from
//!    the item's stored artifact name, see [`disambiguate_names`]
//! 3. builds the payload, drives the export job, and streams the artifact
//!
//! Every per-item error is logged and counted; none stops the run.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::api::ExportRequest;
use crate::catalog::{CatalogItem, disambiguate_names};
use crate::download::DownloadResumer;
use crate::export::{ExportConfig, ExportOrchestrator, JobFailure, JobState};
use crate::gateway::ApiClient;

use super::identity::Character;
use super::observer::{ItemFailure, ItemOutcome, NoopObserver, ProgressObserver};

/// Final counts of an export run.
///
/// `attempted` counts items that issued network activity, so
/// `attempted == succeeded + failed` and `skipped` counts pre-existing artifacts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Items that issued network activity.
    pub attempted: usize,
    /// Items whose artifact already existed.
    pub skipped: usize,
    /// Items exported and saved.
    pub succeeded: usize,
    /// Items that failed.
    pub failed: usize,
    /// True if the stop signal ended the run early.
    pub cancelled: bool,
}

impl RunSummary {
    /// Counts one item outcome.
    pub fn record(&mut self, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Skipped { .. } => self.skipped += 1,
            ItemOutcome::Succeeded { .. } => {
                self.attempted += 1;
                self.succeeded += 1;
            }
            ItemOutcome::Failed { .. } => {
                self.attempted += 1;
                self.failed += 1;
            }
        }
    }

    /// Items handled in any way.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.attempted + self.skipped
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} attempted, {} succeeded, {} failed, {} skipped (already present)",
            self.attempted, self.succeeded, self.failed, self.skipped
        )?;
        if self.cancelled {
            f.write_str(", stopped early")?;
        }
        Ok(())
    }
}

/// Drives export jobs for a list of items and persists their artifacts.
pub struct ExportRunner {
    client: ApiClient,
    orchestrator: ExportOrchestrator,
    resumer: DownloadResumer,
    observer: Arc<dyn ProgressObserver>,
    cancel: CancellationToken,
}

impl fmt::Debug for ExportRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportRunner")
            .field("orchestrator", &self.orchestrator)
            .field("resumer", &self.resumer)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl ExportRunner {
    /// Creates a runner with a no-op observer and a fresh stop signal.
    #[must_use]
    pub fn new(client: ApiClient, config: ExportConfig, resumer: DownloadResumer) -> Self {
        Self {
            orchestrator: ExportOrchestrator::new(client.clone(), config),
            client,
            resumer,
            observer: Arc::new(NoopObserver),
            cancel: CancellationToken::new(),
        }
    }

    /// Registers the progress observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Uses `cancel` as the stop signal.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The stop signal checked between items.
    #[must_use]
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Exports every item as a motion on `character`, in order.
    #[instrument(skip(self, character, items), fields(character_id = %character.id, items = items.len()))]
    pub async fn run_catalog(&self, character: &Character, items: &[CatalogItem]) -> RunSummary {
        let total = items.len();
        let names = disambiguate_names(items);
        let item_delay = self.orchestrator.config().item_delay;
        let mut summary = RunSummary::default();
        self.observer.on_total(total);

        for (index, (item, name)) in items.iter().zip(names.iter()).enumerate() {
            if self.cancel.is_cancelled() {
                info!(remaining = total - index, "stop requested; ending run");
                summary.cancelled = true;
                break;
            }

            info!(
                item_id = %item.id,
                name = %name,
                position = index + 1,
                of = total,
                "processing item"
            );
            let outcome = self.process_motion(character, item, name).await;
            self.report(&item.id, &outcome, &mut summary, total);

            if outcome.was_attempted() && index + 1 < total && !item_delay.is_zero() {
                tokio::time::sleep(item_delay).await;
            }
        }

        info!(
            %summary,
            backoff_secs = self.client.pacer().cumulative_backoff().as_secs(),
            "export run finished"
        );
        summary
    }

    /// Exports the neutral pose of `character`, saved under its name.
    #[instrument(skip(self, character), fields(character_id = %character.id))]
    pub async fn run_neutral_pose(&self, character: &Character) -> RunSummary {
        let mut summary = RunSummary::default();
        self.observer.on_total(1);
        if self.cancel.is_cancelled() {
            summary.cancelled = true;
            return summary;
        }

        let path = self.resumer.canonical_path(&character.name);
        let outcome = match self.existing(&path).await {
            Some(outcome) => outcome,
            None => {
                let payload = self.orchestrator.neutral_pose(&character.id, &character.name);
                self.export_to(&character.id, &character.id, payload, path)
                    .await
            }
        };
        self.report(&character.id, &outcome, &mut summary, 1);
        info!(%summary, "neutral pose run finished");
        summary
    }

    async fn process_motion(
        &self,
        character: &Character,
        item: &CatalogItem,
        name: &str,
    ) -> ItemOutcome {
        let path = self.resumer.canonical_path(name);
        if let Some(skipped) = self.existing(&path).await {
            return skipped;
        }

        let payload = match self.orchestrator.prepare(&character.id, item).await {
            Ok(payload) => payload,
            Err(source) => {
                warn!(item_id = %item.id, error = %source, "skipping item");
                return ItemOutcome::Failed {
                    reason: ItemFailure::Payload { source },
                };
            }
        };
        self.export_to(&character.id, &item.id, payload, path).await
    }

    async fn existing(&self, path: &std::path::Path) -> Option<ItemOutcome> {
        let bytes = self.resumer.existing_marker(path).await?;
        info!(path = %path.display(), bytes, "artifact already present; skipping");
        Some(ItemOutcome::Skipped {
            path: path.to_path_buf(),
        })
    }

    async fn export_to(
        &self,
        character_id: &str,
        item_id: &str,
        payload: ExportRequest,
        path: PathBuf,
    ) -> ItemOutcome {
        let job = self.orchestrator.run(character_id, item_id, payload).await;
        let reason = match (job.state(), job.result_location()) {
            (JobState::Completed, Some(location)) => {
                match self.resumer.materialize(&self.client, location, &path).await {
                    Ok(bytes) => return ItemOutcome::Succeeded { path, bytes },
                    Err(source) => ItemFailure::Download { source },
                }
            }
            (JobState::TimedOut, _) => ItemFailure::TimedOut { polls: job.polls() },
            _ => ItemFailure::Export {
                failure: job
                    .failure()
                    .cloned()
                    .unwrap_or(JobFailure::MissingResult),
            },
        };
        warn!(item_id, error = %reason, "item failed");
        ItemOutcome::Failed { reason }
    }

    fn report(&self, item_id: &str, outcome: &ItemOutcome, summary: &mut RunSummary, total: usize) {
        summary.record(outcome);
        self.observer.on_item_result(item_id, outcome);
        self.observer.on_progress(summary.processed(), total);
    }
}
