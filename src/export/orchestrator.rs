//! Submit-and-poll driver for export jobs.
//!
//! # Policy
//!
//! Submission:
//! - 200/202: accepted, polling starts
//! - 429: one fixed backoff, one retry; a second 429 fails the job
//! - any other status or a transport error: the job fails
//! - a transport timeout: the job times out
//!
//! Polling (each cycle waits `poll_interval` first and consumes one unit of
//! the poll budget, whatever its outcome):
//! - 429: fixed backoff, next cycle
//! - other non-200, transport error, undecodable body: logged, next cycle
//! - `processing` (or an unknown status): next cycle
//! - `failed`: Failed; `completed`: Completed with the result URL
//!
//! The budget is finite, so every job reaches a terminal state.

use tracing::{debug, error, info, instrument, warn};

use crate::api::{
    ExportKind, ExportRequest, JobStatusResponse, MOTION_TYPE, ProductDetails, RemoteJobStatus,
    paths,
};
use crate::catalog::CatalogItem;
use crate::gateway::{ApiClient, decode_json};

use super::config::ExportConfig;
use super::job::{ExportJob, InvalidTransition, JobFailure};
use super::payload::{PayloadError, is_present, normalize_hash_block};

/// Attempts per submission: the first try plus one retry after a 429.
const SUBMIT_ATTEMPTS: u32 = 2;

/// Log a "still processing" line every this many polls.
const PROGRESS_LOG_EVERY: u32 = 10;

enum Submission {
    Accepted,
    Failed(JobFailure),
    TimedOut,
}

/// Builds payloads and drives export jobs to a terminal state.
#[derive(Debug, Clone)]
pub struct ExportOrchestrator {
    client: ApiClient,
    config: ExportConfig,
}

impl ExportOrchestrator {
    /// Creates an orchestrator sharing `client`'s connection pool.
    #[must_use]
    pub fn new(client: ApiClient, config: ExportConfig) -> Self {
        Self { client, config }
    }

    /// The export settings.
    #[must_use]
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Builds the motion payload for a catalog item.
    ///
    /// The hash block is read from the item's `details.gms_hash`; items
    /// collected without it trigger one product-details request.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError`] if the block is missing, malformed, or the
    /// details request fails. The item should be skipped.
    #[instrument(skip(self, item), fields(item_id = %item.id))]
    pub async fn prepare(
        &self,
        character_id: &str,
        item: &CatalogItem,
    ) -> Result<ExportRequest, PayloadError> {
        let embedded = item
            .attributes
            .get("details")
            .and_then(|details| details.get("gms_hash"))
            .filter(|block| is_present(block));

        let (block, product_type) = if let Some(block) = embedded {
            (block.clone(), item.product_type().map(str::to_string))
        } else {
            debug!("hash block not in catalog record; fetching product details");
            let details = self.fetch_details(character_id, &item.id).await?;
            let block = details
                .hash_block()
                .filter(|block| is_present(block))
                .cloned()
                .ok_or_else(|| PayloadError::MissingHashBlock {
                    item_id: item.id.clone(),
                })?;
            let product_type = details
                .product_type
                .filter(|t| !t.is_empty())
                .or_else(|| item.product_type().map(str::to_string));
            (block, product_type)
        };

        let hash = normalize_hash_block(&item.id, &block)?;
        Ok(ExportRequest {
            character_id: character_id.to_string(),
            product_name: item.name.clone(),
            kind: ExportKind::Motion {
                product_type: product_type.unwrap_or_else(|| MOTION_TYPE.to_string()),
                preferences: self.config.motion_preferences.clone(),
                hash,
            },
        })
    }

    /// Builds the neutral-pose payload for a character.
    #[must_use]
    pub fn neutral_pose(&self, character_id: &str, character_name: &str) -> ExportRequest {
        ExportRequest {
            character_id: character_id.to_string(),
            product_name: character_name.to_string(),
            kind: ExportKind::NeutralPose {
                preferences: self.config.pose_preferences.clone(),
            },
        }
    }

    /// Submits `payload` and polls until the job is terminal.
    #[instrument(skip(self, payload), fields(product = %payload.product_name))]
    pub async fn run(&self, character_id: &str, item_id: &str, payload: ExportRequest) -> ExportJob {
        let mut job = ExportJob::new(item_id, payload);

        match self.submit(job.payload()).await {
            Submission::Accepted => settle(&mut job, ExportJob::begin_processing),
            Submission::Failed(failure) => {
                warn!(reason = %failure, "export submission failed");
                settle(&mut job, |job| job.fail(failure));
                return job;
            }
            Submission::TimedOut => {
                warn!("export submission timed out");
                settle(&mut job, ExportJob::time_out);
                return job;
            }
        }

        self.poll(character_id, &mut job).await;
        job
    }

    async fn fetch_details(
        &self,
        character_id: &str,
        item_id: &str,
    ) -> Result<ProductDetails, PayloadError> {
        let query = [
            ("similar", "0".to_string()),
            ("character_id", character_id.to_string()),
        ];
        self.client
            .get_json::<ProductDetails>(&paths::product(item_id), &query)
            .await
            .map_err(|source| PayloadError::DetailsUnavailable {
                item_id: item_id.to_string(),
                source,
            })
    }

    async fn submit(&self, payload: &ExportRequest) -> Submission {
        for attempt in 1..=SUBMIT_ATTEMPTS {
            let response = match self.client.post_json(paths::EXPORT, payload).await {
                Ok(response) => response,
                Err(error) if error.is_timeout() => return Submission::TimedOut,
                Err(error) => {
                    return Submission::Failed(JobFailure::Transport {
                        reason: error.to_string(),
                    });
                }
            };

            match response.status().as_u16() {
                200 | 202 => {
                    debug!(attempt, "export accepted");
                    return Submission::Accepted;
                }
                429 if attempt < SUBMIT_ATTEMPTS => {
                    warn!(
                        attempt,
                        backoff_secs = self.config.rate_limit_backoff.as_secs(),
                        "export submission rate limited; backing off before retry"
                    );
                    self.client
                        .pacer()
                        .backoff(self.config.rate_limit_backoff)
                        .await;
                }
                429 => return Submission::Failed(JobFailure::RateLimited),
                status => return Submission::Failed(JobFailure::Rejected { status }),
            }
        }
        Submission::Failed(JobFailure::RateLimited)
    }

    async fn poll(&self, character_id: &str, job: &mut ExportJob) {
        let monitor = paths::monitor(character_id);
        let budget = self.config.poll_budget;

        while job.polls() < budget {
            tokio::time::sleep(self.config.poll_interval).await;
            job.record_poll();
            let cycle = job.polls();

            let response = match self.client.get(&monitor, &[]).await {
                Ok(response) => response,
                Err(error) => {
                    warn!(cycle, budget, error = %error, "monitor request failed");
                    continue;
                }
            };

            let status = response.status().as_u16();
            if status == 429 {
                warn!(cycle, budget, "monitor rate limited; backing off");
                self.client
                    .pacer()
                    .backoff(self.config.rate_limit_backoff)
                    .await;
                continue;
            }
            if status != 200 {
                warn!(cycle, budget, status, "monitor returned unexpected status");
                continue;
            }

            let body = match decode_json::<JobStatusResponse>(response).await {
                Ok(body) => body,
                Err(error) => {
                    warn!(cycle, budget, error = %error, "monitor response undecodable");
                    continue;
                }
            };

            match body.remote_status() {
                RemoteJobStatus::Processing => {
                    if cycle % PROGRESS_LOG_EVERY == 0 {
                        info!(cycle, budget, "export still processing");
                    }
                }
                RemoteJobStatus::Completed(Some(location)) => {
                    info!(cycle, "export completed");
                    settle(job, |job| job.complete(location));
                    return;
                }
                RemoteJobStatus::Completed(None) => {
                    warn!(cycle, "export completed without a result location");
                    settle(job, |job| job.fail(JobFailure::MissingResult));
                    return;
                }
                RemoteJobStatus::Failed => {
                    warn!(cycle, "export failed on the server");
                    settle(job, |job| job.fail(JobFailure::RemoteFailed));
                    return;
                }
                RemoteJobStatus::Unknown(status) => {
                    debug!(cycle, status = ?status, "unrecognized monitor status");
                }
            }
        }

        warn!(polls = job.polls(), "export poll budget exhausted");
        settle(job, ExportJob::time_out);
    }
}

fn settle<F>(job: &mut ExportJob, transition: F)
where
    F: FnOnce(&mut ExportJob) -> Result<(), InvalidTransition>,
{
    if let Err(invalid) = transition(job) {
        error!(item_id = job.item_id(), error = %invalid, "export job state machine violated");
    }
}
