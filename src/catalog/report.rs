//! Enumeration reports: summary statistics and divergent duplicates.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use super::collector::{CollectionOutcome, PartitionStats};
use super::diff::{DuplicateClass, FieldDiff};
use super::error::CatalogError;
use super::names::assign_artifact_names;
use super::partition::QueryPartitioner;
use super::snapshot::{
    CATALOG_FILE, load_existing_catalog, save_catalog, write_json_atomic,
};
use super::termination::StopReason;

/// Summary report file name.
pub const SUMMARY_FILE: &str = "download_summary.json";

/// Divergent-duplicates report file name.
pub const DUPLICATES_FILE: &str = "duplicate_differences.json";

const MAX_DUPLICATE_EXAMPLES: usize = 10;

/// Statistics of one enumeration run.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    /// Server-reported total, when known.
    pub reported_total: Option<u64>,
    /// Unique identifiers collected.
    pub unique_collected: u64,
    /// `unique_collected / reported_total` (0 when the total is unknown or 0).
    pub completeness: f64,
    /// Partitions queried.
    pub partitions_executed: usize,
    /// Partitions available.
    pub partitions_total: usize,
    /// Average unique items per executed partition.
    pub avg_new_per_partition: f64,
    /// Records with an identifier returned by the server.
    pub records_fetched: u64,
    /// Identifiers observed more than once.
    pub duplicate_ids: u64,
    /// Repeated identifiers whose snapshots all agree.
    pub consistent_duplicates: u64,
    /// Repeated identifiers with at least one field disagreement.
    pub divergent_duplicates: u64,
    /// Occurrence count -> number of identifiers seen that many times.
    pub occurrence_distribution: BTreeMap<usize, u64>,
    /// Per-partition counters, in query order.
    pub partitions: Vec<PartitionEntry>,
    /// Why enumeration ended.
    pub stop_reason: StopReason,
    /// A few repeated identifiers, for eyeballing.
    pub duplicate_examples: Vec<DuplicateExample>,
}

/// Per-partition row of the summary.
#[derive(Debug, Clone, Serialize)]
pub struct PartitionEntry {
    /// Partition label.
    pub partition: String,
    /// Counters.
    #[serde(flatten)]
    pub stats: PartitionStats,
}

/// One repeated identifier in the summary.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateExample {
    /// Identifier.
    pub id: String,
    /// Catalog display name.
    pub name: String,
    /// Times observed.
    pub occurrences: usize,
    /// Partition labels of each observation.
    pub partitions: Vec<String>,
}

/// One identifier whose repeated observations disagreed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DivergentDuplicate {
    /// Identifier.
    pub id: String,
    /// Catalog display name (from the first observation).
    pub name: String,
    /// Partition labels of each observation.
    pub partitions: Vec<String>,
    /// Field-level differences against the first observation.
    pub differences: Vec<FieldDiff>,
}

impl SummaryReport {
    /// Computes the summary of an enumeration.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_outcome(outcome: &CollectionOutcome) -> Self {
        let unique = outcome.catalog.len() as u64;
        let completeness = match outcome.reported_total {
            Some(total) if total > 0 => unique as f64 / total as f64,
            _ => 0.0,
        };
        let executed = outcome.partitions.len();
        let avg_new_per_partition = if executed > 0 {
            unique as f64 / executed as f64
        } else {
            0.0
        };

        let mut occurrence_distribution = BTreeMap::new();
        let mut duplicate_ids = 0u64;
        let mut consistent = 0u64;
        let mut divergent = 0u64;
        let mut duplicate_examples = Vec::new();
        for observation in outcome.observations() {
            *occurrence_distribution
                .entry(observation.occurrences.len())
                .or_insert(0u64) += 1;
            match observation.class() {
                DuplicateClass::Unique => continue,
                DuplicateClass::Consistent => consistent += 1,
                DuplicateClass::Divergent => divergent += 1,
            }
            duplicate_ids += 1;
            if duplicate_examples.len() < MAX_DUPLICATE_EXAMPLES {
                duplicate_examples.push(DuplicateExample {
                    id: observation.id.to_string(),
                    name: display_name(outcome, observation.id),
                    occurrences: observation.occurrences.len(),
                    partitions: labels(observation.partitions()),
                });
            }
        }

        Self {
            reported_total: outcome.reported_total,
            unique_collected: unique,
            completeness,
            partitions_executed: executed,
            partitions_total: outcome.partitions_total,
            avg_new_per_partition,
            records_fetched: outcome.records_fetched,
            duplicate_ids,
            consistent_duplicates: consistent,
            divergent_duplicates: divergent,
            occurrence_distribution,
            partitions: outcome
                .partitions
                .iter()
                .map(|stats| PartitionEntry {
                    partition: QueryPartitioner::label(&stats.partition).to_string(),
                    stats: stats.clone(),
                })
                .collect(),
            stop_reason: outcome.stop_reason,
            duplicate_examples,
        }
    }
}

/// Lists every divergent duplicate, once per identifier, in catalog order.
#[must_use]
pub fn divergent_duplicates(outcome: &CollectionOutcome) -> Vec<DivergentDuplicate> {
    outcome
        .observations()
        .filter_map(|observation| {
            let differences = observation.diffs();
            (observation.occurrences.len() > 1 && !differences.is_empty()).then(|| {
                DivergentDuplicate {
                    id: observation.id.to_string(),
                    name: display_name(outcome, observation.id),
                    partitions: labels(observation.partitions()),
                    differences,
                }
            })
        })
        .collect()
}

/// Paths written by [`write_enumeration_outputs`].
#[derive(Debug, Clone)]
pub struct EnumerationOutputs {
    /// Catalog snapshot.
    pub catalog: PathBuf,
    /// Summary report.
    pub summary: PathBuf,
    /// Divergent-duplicates report, only written when non-empty.
    pub duplicates: Option<PathBuf>,
}

/// Writes the snapshot, the summary, and (when non-empty) the divergent
/// duplicates report into `dir`.
///
/// Every snapshot item gets a stored artifact name. Items already listed in a
/// previous snapshot in `dir` keep the name recorded there.
///
/// # Errors
///
/// Returns the first [`CatalogError`] encountered.
pub async fn write_enumeration_outputs(
    outcome: &CollectionOutcome,
    dir: &Path,
) -> Result<EnumerationOutputs, CatalogError> {
    let catalog = dir.join(CATALOG_FILE);
    let previous = load_existing_catalog(&catalog).await;
    let mut named = outcome.catalog.clone();
    assign_artifact_names(named.items_mut(), &previous);
    save_catalog(&named, &catalog).await?;

    let summary_report = SummaryReport::from_outcome(outcome);
    let summary = dir.join(SUMMARY_FILE);
    write_json_atomic(&summary, &summary_report).await?;

    let divergent = divergent_duplicates(outcome);
    let duplicates = if divergent.is_empty() {
        None
    } else {
        warn!(
            count = divergent.len(),
            "identifiers with conflicting duplicate records; see report"
        );
        let path = dir.join(DUPLICATES_FILE);
        write_json_atomic(&path, &divergent).await?;
        Some(path)
    };

    info!(
        unique = summary_report.unique_collected,
        duplicates = summary_report.duplicate_ids,
        divergent = summary_report.divergent_duplicates,
        catalog = %catalog.display(),
        "enumeration outputs written"
    );
    Ok(EnumerationOutputs {
        catalog,
        summary,
        duplicates,
    })
}

fn display_name(outcome: &CollectionOutcome, id: &str) -> String {
    outcome
        .catalog
        .get(id)
        .map_or_else(|| id.to_string(), |item| item.name.clone())
}

fn labels(partitions: Vec<String>) -> Vec<String> {
    partitions
        .into_iter()
        .map(|p| QueryPartitioner::label(&p).to_string())
        .collect()
}
