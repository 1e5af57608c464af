//! Export job lifecycle.
//!
//! ```text
//! Submitted ──► Processing ──► Completed
//!     │              ├───────► Failed
//!     │              └───────► TimedOut
//!     ├──────────────────────► Failed    (rejected / repeated 429 / transport)
//!     └──────────────────────► TimedOut  (submission timed out)
//! ```
//!
//! Completed, Failed, and TimedOut are terminal.

use std::fmt;

use thiserror::Error;

use crate::api::ExportRequest;

/// State of an export job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Payload built and being submitted.
    Submitted,
    /// Accepted by the server; polling the monitor.
    Processing,
    /// Finished with a result location.
    Completed,
    /// Rejected or failed remotely.
    Failed,
    /// Poll budget (or submission timeout) exhausted.
    TimedOut,
}

impl JobState {
    /// Returns true for Completed, Failed, and TimedOut.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::TimedOut)
    }

    /// Returns true if `self -> next` is a legal transition.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Submitted, Self::Processing | Self::Failed | Self::TimedOut)
                | (Self::Processing, Self::Completed | Self::Failed | Self::TimedOut)
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Submitted => "submitted",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::TimedOut => "timed out",
        };
        f.write_str(name)
    }
}

/// Why a job ended in [`JobState::Failed`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobFailure {
    /// The submission was rate limited twice in a row.
    #[error("export submission rate limited after retry")]
    RateLimited,
    /// The submission was answered with a status other than 200/202/429.
    #[error("export submission rejected with HTTP {status}")]
    Rejected {
        /// The HTTP status code.
        status: u16,
    },
    /// The submission could not be delivered.
    #[error("export submission failed: {reason}")]
    Transport {
        /// Transport error description.
        reason: String,
    },
    /// The monitor reported `failed`.
    #[error("export job failed on the server")]
    RemoteFailed,
    /// The monitor reported `completed` without a result URL.
    #[error("export job completed without a result location")]
    MissingResult,
}

/// Rejected state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal export job transition {from} -> {to}")]
pub struct InvalidTransition {
    /// Current state.
    pub from: JobState,
    /// Requested state.
    pub to: JobState,
}

/// One export attempt for one item.
#[derive(Debug, Clone)]
pub struct ExportJob {
    item_id: String,
    payload: ExportRequest,
    state: JobState,
    polls: u32,
    result_location: Option<String>,
    failure: Option<JobFailure>,
}

impl ExportJob {
    /// Creates a job in [`JobState::Submitted`].
    #[must_use]
    pub fn new(item_id: impl Into<String>, payload: ExportRequest) -> Self {
        Self {
            item_id: item_id.into(),
            payload,
            state: JobState::Submitted,
            polls: 0,
            result_location: None,
            failure: None,
        }
    }

    /// Identifier of the item being exported.
    #[must_use]
    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    /// The submitted payload.
    #[must_use]
    pub fn payload(&self) -> &ExportRequest {
        &self.payload
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> JobState {
        self.state
    }

    /// Poll cycles consumed so far.
    #[must_use]
    pub fn polls(&self) -> u32 {
        self.polls
    }

    /// Result URL, set only once Completed.
    #[must_use]
    pub fn result_location(&self) -> Option<&str> {
        self.result_location.as_deref()
    }

    /// Failure cause, set only once Failed.
    #[must_use]
    pub fn failure(&self) -> Option<&JobFailure> {
        self.failure.as_ref()
    }

    /// Counts one poll cycle.
    pub fn record_poll(&mut self) {
        self.polls += 1;
    }

    /// Submitted -> Processing.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] from any other state.
    pub fn begin_processing(&mut self) -> Result<(), InvalidTransition> {
        self.transition(JobState::Processing)
    }

    /// Processing -> Completed with the result URL.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] from any other state.
    pub fn complete(&mut self, location: impl Into<String>) -> Result<(), InvalidTransition> {
        self.transition(JobState::Completed)?;
        self.result_location = Some(location.into());
        Ok(())
    }

    /// Submitted/Processing -> Failed.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] from a terminal state.
    pub fn fail(&mut self, failure: JobFailure) -> Result<(), InvalidTransition> {
        self.transition(JobState::Failed)?;
        self.failure = Some(failure);
        Ok(())
    }

    /// Submitted/Processing -> TimedOut.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] from a terminal state.
    pub fn time_out(&mut self) -> Result<(), InvalidTransition> {
        self.transition(JobState::TimedOut)
    }

    fn transition(&mut self, next: JobState) -> Result<(), InvalidTransition> {
        if !self.state.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }
}
