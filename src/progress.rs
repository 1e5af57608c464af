//! Progress bar for export runs.

use indicatif::{ProgressBar, ProgressStyle};
use mixamo_core::run::{ItemOutcome, ProgressObserver};

/// Renders run progress as an `indicatif` bar on stderr.
///
/// A hidden bar is used when output is not interactive, so the observer can
/// always be registered.
pub(crate) struct BarObserver {
    bar: ProgressBar,
}

impl BarObserver {
    pub(crate) fn new(visible: bool) -> Self {
        let bar = if visible {
            ProgressBar::new(0)
        } else {
            ProgressBar::hidden()
        };
        bar.set_style(
            ProgressStyle::with_template("{bar:30} {pos}/{len} {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { bar }
    }

    pub(crate) fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressObserver for BarObserver {
    fn on_total(&self, total: usize) {
        self.bar.set_length(total as u64);
    }

    fn on_progress(&self, completed: usize, _total: usize) {
        self.bar.set_position(completed as u64);
    }

    fn on_item_result(&self, item_id: &str, outcome: &ItemOutcome) {
        let status = match outcome {
            ItemOutcome::Skipped { .. } => "already present".to_string(),
            ItemOutcome::Succeeded { bytes, .. } => format!("saved ({bytes} bytes)"),
            ItemOutcome::Failed { reason } => format!("failed: {reason}"),
        };
        self.bar.set_message(format!("{item_id}: {status}"));
    }
}

pub(crate) fn is_dumb_terminal() -> bool {
    std::env::var("TERM")
        .map(|value| value.eq_ignore_ascii_case("dumb"))
        .unwrap_or(false)
}

/// Whether to draw the bar: interactive stderr, not quiet, not a dumb terminal.
pub(crate) fn should_show_progress(stderr_is_terminal: bool, quiet: bool, dumb: bool) -> bool {
    stderr_is_terminal && !quiet && !dumb
}
