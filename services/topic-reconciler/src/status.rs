//! Maps the result of a run onto the process exit status.

use std::process::ExitCode;

use shared::dto::ReconciliationOutcome;
use shared::error::{AppError, GatewayError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    /// Names of the topics that could not be created.
    TopicsFailed(Vec<String>),
    /// Listing or the create call failed as a whole.
    Aborted(String),
    InvalidConfig(String),
    Cancelled,
}

impl RunStatus {
    pub fn from_run(result: &Result<ReconciliationOutcome, GatewayError>) -> Self {
        match result {
            Ok(outcome) => Self::from_outcome(outcome),
            Err(err) => Self::Aborted(err.to_string()),
        }
    }

    pub fn from_outcome(outcome: &ReconciliationOutcome) -> Self {
        let failed: Vec<String> = outcome.failures().map(|(n, _)| n.to_string()).collect();
        if failed.is_empty() {
            Self::Success
        } else {
            Self::TopicsFailed(failed)
        }
    }

    /// Settings and desired-topic problems are configuration errors; a
    /// gateway that cannot be set up aborts the run.
    pub fn from_app_error(err: &AppError) -> Self {
        match err {
            AppError::Config(_) | AppError::InvalidSpec(_) => Self::InvalidConfig(err.to_string()),
            AppError::Gateway(_) => Self::Aborted(err.to_string()),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::Success => 0,
            Self::TopicsFailed(_) => 1,
            Self::Aborted(_) => 2,
            Self::InvalidConfig(_) => 3,
            Self::Cancelled => 130,
        }
    }

    /// Line printed to stderr on a non-zero exit.
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Success => None,
            Self::TopicsFailed(names) => {
                Some(format!("failed to create topics: {}", names.join(", ")))
            }
            Self::Aborted(reason) => Some(format!("reconciliation aborted: {reason}")),
            Self::InvalidConfig(reason) => Some(format!("invalid configuration: {reason}")),
            Self::Cancelled => Some(
                "reconciliation cancelled; list the broker again before retrying".to_string(),
            ),
        }
    }
}

impl From<RunStatus> for ExitCode {
    fn from(status: RunStatus) -> Self {
        ExitCode::from(status.code())
    }
}
