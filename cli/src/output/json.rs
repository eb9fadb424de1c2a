//! JSON output helpers.
//!
//! Every `--json` code path prints exactly one pretty-printed object on stdout.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::domain::DumpOutcome;

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Report wrapping a dump outcome with its exit code and completion time.
#[derive(Serialize)]
struct OutcomeReport<'a> {
    #[serde(flatten)]
    outcome: &'a DumpOutcome,
    exit_code: u8,
    finished_at: String,
}

/// Format a dump outcome.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_outcome(outcome: &DumpOutcome) -> Result<String> {
    let report = OutcomeReport {
        outcome,
        exit_code: outcome.exit_code(),
        finished_at: chrono::Utc::now().to_rfc3339(),
    };
    serde_json::to_string_pretty(&report).context("JSON serialization failed")
}
