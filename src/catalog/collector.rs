//! Partitioned catalog enumeration with deduplication.
//!
//! # Overview
//!
//! The search endpoint pages through at most a bounded window of results per
//! query, so the collector runs one exhaustive pagination per query fragment
//! (see [`QueryPartitioner`]) and merges everything into one [`Catalog`]:
//!
//! 1. Probe the empty query once to learn the server-reported total
//! 2. For each fragment, consult the [`TerminationPolicy`], then page until the
//!    reported page count is exhausted or a page fails
//! 3. Ingest the records: new identifiers enter the catalog, repeated ones are
//!    recorded as further occurrences for duplicate analysis
//!
//! A failed page truncates only its own partition; later partitions usually
//! re-cover the same items.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::api::{DEFAULT_PAGE_SIZE, SearchPage, SearchParams, paths};
use crate::gateway::ApiClient;

use super::diff::{DuplicateObservation, Occurrence, diff_snapshots};
use super::item::{Catalog, CatalogItem, record_id};
use super::partition::QueryPartitioner;
use super::termination::{DEFAULT_STAGNATION_LIMIT, Decision, StopReason, TerminationPolicy};

/// Default delay after each page request (300 ms).
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(300);

/// Enumeration tuning.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Results requested per page.
    pub page_size: u32,
    /// Consecutive zero-new partitions before stopping (0 disables).
    pub stagnation_limit: u32,
    /// Pause after every successful page request.
    pub page_delay: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            stagnation_limit: DEFAULT_STAGNATION_LIMIT,
            page_delay: DEFAULT_PAGE_DELAY,
        }
    }
}

/// Raw result of paginating one partition.
#[derive(Debug, Clone, Default)]
pub struct PartitionFetch {
    /// Query fragment.
    pub partition: String,
    /// Every record returned, in page order.
    pub records: Vec<Value>,
    /// Pages successfully fetched.
    pub pages: u32,
    /// True if a page failed and the remaining pages were abandoned.
    pub truncated: bool,
}

impl PartitionFetch {
    /// A fully paginated partition.
    #[must_use]
    pub fn complete(partition: impl Into<String>, records: Vec<Value>) -> Self {
        Self {
            partition: partition.into(),
            records,
            pages: 1,
            truncated: false,
        }
    }
}

/// Per-partition counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PartitionStats {
    /// Query fragment.
    #[serde(skip)]
    pub partition: String,
    /// Records returned by the server.
    pub fetched: u64,
    /// Records whose identifier was new.
    pub new: u64,
    /// Records whose identifier had been seen before.
    pub duplicate: u64,
    /// Records skipped for lacking an identifier.
    pub malformed: u64,
    /// Pages fetched.
    pub pages: u32,
    /// True if pagination stopped on a failed page.
    pub truncated: bool,
}

/// Mutable accumulator for one enumeration; free of I/O so it can be driven
/// directly in tests.
#[derive(Debug, Default)]
pub struct CollectionState {
    catalog: Catalog,
    occurrences: HashMap<String, Vec<Occurrence>>,
    partitions: Vec<PartitionStats>,
    records_fetched: u64,
    zero_new_streak: u32,
}

impl CollectionState {
    /// Creates an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges one partition's records into the catalog.
    pub fn ingest(&mut self, fetch: PartitionFetch) -> PartitionStats {
        let PartitionFetch {
            partition,
            records,
            pages,
            truncated,
        } = fetch;
        let mut stats = PartitionStats {
            partition: partition.clone(),
            fetched: records.len() as u64,
            pages,
            truncated,
            ..PartitionStats::default()
        };

        for record in records {
            let Some(id) = record_id(&record) else {
                stats.malformed += 1;
                debug!(partition = %partition, "skipping record without id");
                continue;
            };
            self.records_fetched += 1;

            if self.catalog.contains(&id) {
                stats.duplicate += 1;
                self.catalog.note_partition(&id, &partition);
                let occurrences = self.occurrences.entry(id.clone()).or_default();
                if let Some(first) = occurrences.first() {
                    let diffs = diff_snapshots(&first.snapshot, &record);
                    if !diffs.is_empty() {
                        debug!(
                            item_id = %id,
                            partition = %partition,
                            fields = diffs.len(),
                            "duplicate record differs from first occurrence"
                        );
                    }
                }
                occurrences.push(Occurrence {
                    partition: partition.clone(),
                    snapshot: record,
                });
            } else if let Some(item) = CatalogItem::from_record(&record, &partition) {
                stats.new += 1;
                self.catalog.insert(item);
                self.occurrences.insert(
                    id,
                    vec![Occurrence {
                        partition: partition.clone(),
                        snapshot: record,
                    }],
                );
            } else {
                stats.malformed += 1;
            }
        }

        if stats.new == 0 {
            self.zero_new_streak += 1;
        } else {
            self.zero_new_streak = 0;
        }
        self.partitions.push(stats.clone());
        stats
    }

    /// The catalog collected so far.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Number of unique identifiers collected.
    #[must_use]
    pub fn unique(&self) -> u64 {
        self.catalog.len() as u64
    }

    /// Consecutive ingested partitions that contributed nothing new.
    #[must_use]
    pub fn zero_new_streak(&self) -> u32 {
        self.zero_new_streak
    }

    /// Seals the state into an outcome.
    #[must_use]
    pub fn finish(self, reported_total: Option<u64>, stop_reason: StopReason) -> CollectionOutcome {
        CollectionOutcome {
            catalog: self.catalog,
            occurrences: self.occurrences,
            partitions: self.partitions,
            records_fetched: self.records_fetched,
            reported_total,
            stop_reason,
            partitions_total: QueryPartitioner::total(),
        }
    }
}

/// Final product of an enumeration.
#[derive(Debug)]
pub struct CollectionOutcome {
    /// Deduplicated catalog in first-seen order.
    pub catalog: Catalog,
    /// Every occurrence of every identifier.
    pub occurrences: HashMap<String, Vec<Occurrence>>,
    /// Stats of each partition queried, in order.
    pub partitions: Vec<PartitionStats>,
    /// Records with an identifier returned across all partitions.
    pub records_fetched: u64,
    /// Server-reported total, if the probe succeeded.
    pub reported_total: Option<u64>,
    /// Why enumeration ended.
    pub stop_reason: StopReason,
    /// Number of partitions the run could have queried.
    pub partitions_total: usize,
}

impl CollectionOutcome {
    /// Occurrence view for one identifier.
    #[must_use]
    pub fn observation(&self, id: &str) -> Option<DuplicateObservation<'_>> {
        self.occurrences
            .get_key_value(id)
            .map(|(id, occurrences)| DuplicateObservation {
                id: id.as_str(),
                occurrences: occurrences.as_slice(),
            })
    }

    /// Occurrence views for every identifier, in catalog order.
    pub fn observations(&self) -> impl Iterator<Item = DuplicateObservation<'_>> {
        self.catalog
            .iter()
            .filter_map(|item| self.observation(&item.id))
    }
}

/// Drives partitioned enumeration against the search endpoint.
#[derive(Debug, Clone)]
pub struct CatalogCollector {
    client: ApiClient,
    config: CollectorConfig,
}

impl CatalogCollector {
    /// Creates a collector sharing `client`'s connection pool.
    #[must_use]
    pub fn new(client: ApiClient, config: CollectorConfig) -> Self {
        Self { client, config }
    }

    /// Requests page 1 of the empty query and returns the server-reported total.
    ///
    /// Returns `None` when the probe fails; enumeration then runs without the
    /// completeness stop.
    #[instrument(level = "debug", skip(self))]
    pub async fn probe_total(&self) -> Option<u64> {
        let params = SearchParams {
            page: 1,
            limit: self.config.page_size,
            query: "",
        };
        match self
            .client
            .get_json::<SearchPage>(paths::PRODUCTS, &params.to_query())
            .await
        {
            Ok(page) => {
                info!(
                    total = page.pagination.num_results,
                    pages = page.pagination.num_pages,
                    "server-reported catalog size"
                );
                Some(page.pagination.num_results)
            }
            Err(error) => {
                warn!(error = %error, "total probe failed; completeness stop disabled");
                None
            }
        }
    }

    /// Paginates one partition exhaustively, stopping at the first failed page.
    #[instrument(skip(self), fields(partition = %QueryPartitioner::label(fragment)))]
    pub async fn fetch_partition(&self, fragment: &str) -> PartitionFetch {
        let mut fetch = PartitionFetch {
            partition: fragment.to_string(),
            ..PartitionFetch::default()
        };
        let mut page = 1u32;
        loop {
            let params = SearchParams {
                page,
                limit: self.config.page_size,
                query: fragment,
            };
            let body = match self
                .client
                .get_json::<SearchPage>(paths::PRODUCTS, &params.to_query())
                .await
            {
                Ok(body) => body,
                Err(error) => {
                    warn!(page, error = %error, "page request failed; abandoning partition");
                    fetch.truncated = true;
                    break;
                }
            };
            fetch.pages += 1;
            fetch.records.extend(body.results);

            if !self.config.page_delay.is_zero() {
                tokio::time::sleep(self.config.page_delay).await;
            }
            if page >= body.pagination.num_pages {
                break;
            }
            page += 1;
        }
        debug!(
            pages = fetch.pages,
            records = fetch.records.len(),
            truncated = fetch.truncated,
            "partition fetched"
        );
        fetch
    }

    /// Runs the full partitioned enumeration.
    ///
    /// The stop signal is checked before each partition; a partition already
    /// in flight runs to completion.
    #[instrument(skip(self, cancel))]
    pub async fn collect(&self, cancel: &CancellationToken) -> CollectionOutcome {
        let reported_total = self.probe_total().await;
        let policy = TerminationPolicy::new(self.config.stagnation_limit);
        let mut state = CollectionState::new();
        let mut stop_reason = StopReason::Exhausted;

        for (index, fragment) in QueryPartitioner::new().enumerate() {
            if cancel.is_cancelled() {
                stop_reason = StopReason::Cancelled;
                break;
            }
            if let Decision::Stop(reason) =
                policy.decide(state.unique(), reported_total, state.zero_new_streak())
            {
                stop_reason = reason;
                break;
            }

            let fetch = self.fetch_partition(&fragment).await;
            let stats = state.ingest(fetch);
            info!(
                partition = %QueryPartitioner::label(&fragment),
                index = index + 1,
                of = QueryPartitioner::total(),
                fetched = stats.fetched,
                new = stats.new,
                duplicate = stats.duplicate,
                unique = state.unique(),
                "partition merged"
            );
        }

        info!(
            unique = state.unique(),
            reported_total = ?reported_total,
            reason = ?stop_reason,
            "enumeration finished"
        );
        state.finish(reported_total, stop_reason)
    }

    /// Enumerates a single user-supplied query.
    #[instrument(skip(self))]
    pub async fn collect_query(&self, query: &str) -> CollectionOutcome {
        let fetch = self.fetch_partition(query).await;
        let mut state = CollectionState::new();
        let stats = state.ingest(fetch);
        info!(query, fetched = stats.fetched, unique = state.unique(), "query collected");
        let reported_total = Some(state.unique());
        state.finish(reported_total, StopReason::Exhausted)
    }
}
