//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use std::time::Duration;

use thiserror::Error;

// ── Port errors ───────────────────────────────────────────────────────────────

/// Failure reported by a remote port (directory, exec, transfer).
#[derive(Debug, Error)]
pub enum PortError {
    #[error("pod '{pod}' not found in namespace '{namespace}'")]
    NotFound { namespace: String, pod: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("remote command exited with code {code:?}: {stderr}")]
    NonZeroExit { code: Option<i32>, stderr: String },

    #[error("call timed out after {}s", .0.as_secs())]
    TimedOut(Duration),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

// ── Resolution errors ─────────────────────────────────────────────────────────

/// Errors raised while turning operator input into a `DumpTarget`.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error("pod lookup failed: {0}")]
    Transport(String),
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration key/value validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown setting: {key}\n\nValid settings: {valid}")]
    UnknownKey { key: String, valid: String },

    #[error("Invalid value for {key}: {value}\n\n{expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: String,
    },
}
