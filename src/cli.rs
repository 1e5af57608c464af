//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use mixamo_core::api::DEFAULT_PAGE_SIZE;
use mixamo_core::catalog::{CATALOG_FILE, DEFAULT_STAGNATION_LIMIT};
use mixamo_core::export::DEFAULT_POLL_BUDGET;
use mixamo_core::gateway::{DEFAULT_BASE_URL, REQUEST_TIMEOUT_SECS};

/// Enumerate the Mixamo motion catalog and bulk-export every entry.
///
/// Exports are rendered on the account's primary character and saved as one
/// FBX file per motion. Files already present in the output directory are
/// skipped, so an interrupted run can simply be restarted.
#[derive(Parser, Debug)]
#[command(name = "mixamo-downloader")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// API origin
    #[arg(long, default_value = DEFAULT_BASE_URL, global = true)]
    pub base_url: String,

    /// Bearer access token of a signed-in session
    #[arg(long, env = "MIXAMO_ACCESS_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Upstream proxy for every request (e.g. http://127.0.0.1:8080)
    #[arg(long, global = true)]
    pub proxy: Option<String>,

    /// Per-request timeout in seconds (1-600)
    #[arg(long, default_value_t = REQUEST_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=600), global = true)]
    pub timeout_secs: u64,

    /// Delay between exported items in milliseconds; also the poll interval (floored at 1000)
    #[arg(short = 'd', long, default_value_t = 500, value_parser = clap::value_parser!(u64).range(0..=60000), global = true)]
    pub delay: u64,

    /// Minimum spacing between API requests in milliseconds (0 disables)
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u64).range(0..=60000), global = true)]
    pub min_interval: u64,

    /// Maximum status polls per export job (1-1000)
    #[arg(long, default_value_t = DEFAULT_POLL_BUDGET, value_parser = clap::value_parser!(u32).range(1..=1000), global = true)]
    pub poll_budget: u32,

    /// Directory for catalog files and exported artifacts
    #[arg(short, long, default_value = ".", global = true)]
    pub output_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

/// What to run.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Enumerate the full catalog and write the snapshot and reports
    Enumerate {
        /// Results requested per page (1-96)
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE, value_parser = clap::value_parser!(u32).range(1..=96))]
        page_size: u32,

        /// Consecutive partitions without new items before stopping (0 disables)
        #[arg(long, default_value_t = DEFAULT_STAGNATION_LIMIT)]
        stagnation_limit: u32,

        /// Delay between page requests in milliseconds
        #[arg(long, default_value_t = 300, value_parser = clap::value_parser!(u64).range(0..=60000))]
        page_delay: u64,
    },

    /// Export every item of a catalog snapshot
    Export {
        /// Snapshot to read (defaults to catalog.json in the output directory)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Export the results of a single search query
    Query {
        /// Search text
        text: String,
    },

    /// Export the neutral pose of the primary character
    Tpose,
}

impl Args {
    /// Snapshot path for `export`, resolved against the output directory.
    #[must_use]
    pub fn catalog_path(&self) -> PathBuf {
        match &self.command {
            Command::Export {
                catalog: Some(path),
            } => path.clone(),
            _ => self.output_dir.join(CATALOG_FILE),
        }
    }
}
