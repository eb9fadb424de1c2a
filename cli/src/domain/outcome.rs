//! Terminal outcome of one dump orchestration run.

use std::fmt;

use serde::Serialize;

use crate::domain::error::ResolveError;

/// Why a run ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum FailureKind {
    /// Required identity missing or malformed; nothing was run remotely.
    InvalidInput(String),
    /// The target pod (or a usable container in it) does not exist.
    NotFound(String),
    /// A port call failed at the channel level or timed out.
    Transport { step: String, message: String },
    /// External cancellation was honored.
    Cancelled,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Self::NotFound(msg) => write!(f, "not found: {msg}"),
            Self::Transport { step, message } => write!(f, "{step} failed: {message}"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

impl From<ResolveError> for FailureKind {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::InvalidInput(msg) => Self::InvalidInput(msg),
            ResolveError::NotFound(msg) => Self::NotFound(msg),
            ResolveError::Transport(message) => Self::Transport {
                step: "validating".to_string(),
                message,
            },
        }
    }
}

/// Result of a dump run. Created once by the terminal transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum DumpOutcome {
    Success { log_contents: String },
    Timeout { attempts_made: u32 },
    Unsupported { reason: String },
    Failed { cause: FailureKind },
}

impl DumpOutcome {
    #[must_use]
    pub fn failed(cause: FailureKind) -> Self {
        Self::Failed { cause }
    }

    #[must_use]
    pub fn cancelled() -> Self {
        Self::Failed {
            cause: FailureKind::Cancelled,
        }
    }

    /// Process exit code for this outcome. Every class gets its own code so
    /// callers can tell "never ran" from "ran but undetermined" from "failed".
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Success { .. } => 0,
            Self::Failed {
                cause: FailureKind::Transport { .. },
            } => 1,
            Self::Failed {
                cause: FailureKind::InvalidInput(_),
            } => 3,
            Self::Failed {
                cause: FailureKind::NotFound(_),
            } => 4,
            Self::Unsupported { .. } => 5,
            Self::Timeout { .. } => 6,
            Self::Failed {
                cause: FailureKind::Cancelled,
            } => 130,
        }
    }

    /// Short machine-readable label, used in logs and JSON error codes.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::Timeout { .. } => "timeout",
            Self::Unsupported { .. } => "unsupported",
            Self::Failed { cause } => match cause {
                FailureKind::InvalidInput(_) => "invalid_input",
                FailureKind::NotFound(_) => "not_found",
                FailureKind::Transport { .. } => "transport",
                FailureKind::Cancelled => "cancelled",
            },
        }
    }
}
