//! Shared types for the session core.
//!
//! These carry no I/O handles. They describe what happened in a session and
//! are returned to callers and tests.

use std::fmt;
use std::path::PathBuf;

/// States of the interactive controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingTask,
    Planning,
    AwaitingApproval,
    Executing,
    AwaitingOutcome,
    /// The user confirmed the task succeeded.
    Done,
    /// The user declined without feedback, input ended, or the iteration cap
    /// was reached.
    Cancelled,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AwaitingTask => "awaiting_task",
            Self::Planning => "planning",
            Self::AwaitingApproval => "awaiting_approval",
            Self::Executing => "executing",
            Self::AwaitingOutcome => "awaiting_outcome",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Plan and code produced by one planning round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Proposal {
    pub plan: String,
    /// Extracted code; empty when nothing code-like was found.
    pub code: String,
}

/// Result of writing and running one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    /// File name relative to the session working directory.
    pub file_name: String,
    pub path: PathBuf,
}

/// Summary of a finished session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    /// Terminal state: [`SessionState::Done`] or [`SessionState::Cancelled`].
    pub state: SessionState,
    /// Number of planning rounds started.
    pub iterations: u32,
    /// Number of artifacts executed.
    pub executions: u32,
    pub last_artifact: Option<PathBuf>,
}
