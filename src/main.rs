//! CLI entry point for the mixamo downloader.

use std::io::{self, IsTerminal};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use mixamo_core::catalog::{
    CatalogCollector, CatalogItem, CollectorConfig, assign_artifact_names, load_catalog,
    load_existing_catalog, write_enumeration_outputs,
};
use mixamo_core::download::DownloadResumer;
use mixamo_core::export::ExportConfig;
use mixamo_core::gateway::{ApiClient, GatewayConfig};
use mixamo_core::run::{Character, ExportRunner, RunSummary, resolve_primary_character};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

mod cli;
mod progress;

use cli::{Args, Command};
use progress::BarObserver;

/// Process outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProcessExit {
    Success,
    Partial,
    Failure,
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        match exit {
            ProcessExit::Success => ExitCode::SUCCESS,
            ProcessExit::Partial => ExitCode::from(2),
            ProcessExit::Failure => ExitCode::FAILURE,
        }
    }
}

/// Maps run counts to the process outcome.
fn determine_exit_outcome(summary: &RunSummary) -> ProcessExit {
    if summary.failed == 0 {
        ProcessExit::Success
    } else if summary.succeeded > 0 {
        ProcessExit::Partial
    } else {
        ProcessExit::Failure
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(command = ?args.command, "CLI arguments parsed");
    info!("Mixamo downloader starting");

    if args.token.is_none() {
        warn!("no access token given (--token or MIXAMO_ACCESS_TOKEN); requests will be anonymous");
    }

    let client = ApiClient::new(&gateway_config(&args)).context("invalid gateway configuration")?;

    let cancel = CancellationToken::new();
    let signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; finishing the current item before stopping");
            signal.cancel();
        }
    });

    let exit = match &args.command {
        Command::Enumerate {
            page_size,
            stagnation_limit,
            page_delay,
        } => {
            let config = CollectorConfig {
                page_size: *page_size,
                stagnation_limit: *stagnation_limit,
                page_delay: Duration::from_millis(*page_delay),
            };
            let outcome = CatalogCollector::new(client, config)
                .collect(&cancel)
                .await;
            let outputs = write_enumeration_outputs(&outcome, &args.output_dir)
                .await
                .context("failed to write enumeration outputs")?;
            println!(
                "Collected {} unique items ({:?}); catalog written to {}",
                outcome.catalog.len(),
                outcome.stop_reason,
                outputs.catalog.display()
            );
            ProcessExit::Success
        }
        Command::Export { .. } => {
            let path = args.catalog_path();
            let catalog = load_catalog(&path)
                .await
                .with_context(|| format!("failed to load catalog {}", path.display()))?;
            info!(items = catalog.len(), path = %path.display(), "catalog loaded");
            let items = catalog.into_items();
            let character = resolve_primary_character(&client).await?;
            export_items(&args, client, cancel, &character, &items).await
        }
        Command::Query { text } => {
            let character = resolve_primary_character(&client).await?;
            let outcome = CatalogCollector::new(client.clone(), CollectorConfig::default())
                .collect_query(text)
                .await;
            let mut items = outcome.catalog.into_items();
            if items.is_empty() {
                info!(query = %text, "query returned no items");
                ProcessExit::Success
            } else {
                let snapshot = load_existing_catalog(&args.catalog_path()).await;
                assign_artifact_names(&mut items, &snapshot);
                export_items(&args, client, cancel, &character, &items).await
            }
        }
        Command::Tpose => {
            let character = resolve_primary_character(&client).await?;
            let observer = Arc::new(BarObserver::new(show_progress(&args)));
            let runner = build_runner(&args, client, cancel, &args.output_dir)
                .with_observer(Arc::clone(&observer) as _);
            let summary = runner.run_neutral_pose(&character).await;
            observer.finish();
            println!("Neutral pose: {summary}");
            determine_exit_outcome(&summary)
        }
    };

    Ok(exit.into())
}

async fn export_items(
    args: &Args,
    client: ApiClient,
    cancel: CancellationToken,
    character: &Character,
    items: &[CatalogItem],
) -> ProcessExit {
    let observer = Arc::new(BarObserver::new(show_progress(args)));
    let runner = build_runner(args, client, cancel, &args.output_dir)
        .with_observer(Arc::clone(&observer) as _);
    let summary = runner.run_catalog(character, items).await;
    observer.finish();
    println!("Export finished: {summary}");
    determine_exit_outcome(&summary)
}

fn build_runner(
    args: &Args,
    client: ApiClient,
    cancel: CancellationToken,
    output_dir: &Path,
) -> ExportRunner {
    let config =
        ExportConfig::from_delay(Duration::from_millis(args.delay)).with_poll_budget(args.poll_budget);
    ExportRunner::new(client, config, DownloadResumer::new(output_dir)).with_cancellation(cancel)
}

fn gateway_config(args: &Args) -> GatewayConfig {
    let mut config = GatewayConfig::new(args.base_url.clone())
        .with_request_timeout(Duration::from_secs(args.timeout_secs))
        .with_min_request_interval(Duration::from_millis(args.min_interval));
    if let Some(token) = &args.token {
        config = config.with_access_token(token.clone());
    }
    if let Some(proxy) = &args.proxy {
        config = config.with_proxy(proxy.clone());
    }
    config
}

fn show_progress(args: &Args) -> bool {
    progress::should_show_progress(
        io::stderr().is_terminal(),
        args.quiet,
        progress::is_dumb_terminal(),
    )
}
