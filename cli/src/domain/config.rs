//! Domain types and validators for procdump configuration.
//!
//! Pure functions only — no I/O, no async, no filesystem access.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

// ── Constants ────────────────────────────────────────────────────────────────

pub const VALID_CONFIG_KEYS: &[&str] = &[
    "poll.attempts",
    "poll.interval_secs",
    "timeouts.lookup_secs",
    "timeouts.exec_secs",
    "timeouts.transfer_secs",
    "timeouts.poll_read_secs",
    "script.local_path",
    "script.remote_path",
    "script.invoke_path",
    "artifact.remote_path",
    "kubectl.binary",
    "kubectl.context",
];

const NUMERIC_KEYS: &[&str] = &[
    "poll.attempts",
    "poll.interval_secs",
    "timeouts.lookup_secs",
    "timeouts.exec_secs",
    "timeouts.transfer_secs",
    "timeouts.poll_read_secs",
];

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.procdump/config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DumpConfig {
    pub poll: PollConfig,
    pub timeouts: TimeoutConfig,
    pub script: ScriptConfig,
    pub artifact: ArtifactConfig,
    pub kubectl: KubectlConfig,
}

/// Completion polling bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Maximum number of artifact reads.
    pub attempts: u32,
    /// Delay between two empty reads.
    pub interval_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            attempts: 20,
            interval_secs: 2,
        }
    }
}

/// Per-call bounds for remote round trips.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub lookup_secs: u64,
    pub exec_secs: u64,
    pub transfer_secs: u64,
    pub poll_read_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            lookup_secs: 30,
            exec_secs: 60,
            transfer_secs: 120,
            poll_read_secs: 30,
        }
    }
}

/// Where the dump-driver script comes from and where it lands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptConfig {
    /// Script on the local filesystem.
    pub local_path: String,
    /// Copy destination inside the container.
    pub remote_path: String,
    /// Path used to invoke the staged script from PowerShell.
    pub invoke_path: String,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            local_path: "/run-dump.ps1".to_string(),
            remote_path: "run-dump.ps1".to_string(),
            invoke_path: r"C:\run-dump.ps1".to_string(),
        }
    }
}

/// The completion artifact written by the dump script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    pub remote_path: String,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            remote_path: "log.txt".to_string(),
        }
    }
}

/// How the kubectl adapter is invoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KubectlConfig {
    pub binary: String,
    /// Kubeconfig context; `None` uses the current context (or in-cluster config).
    pub context: Option<String>,
}

impl Default for KubectlConfig {
    fn default() -> Self {
        Self {
            binary: "kubectl".to_string(),
            context: None,
        }
    }
}

// ── Runtime settings ─────────────────────────────────────────────────────────

/// Durations and paths the orchestrator works with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpSettings {
    pub poll_attempts: u32,
    pub poll_interval: Duration,
    pub lookup_timeout: Duration,
    pub exec_timeout: Duration,
    pub transfer_timeout: Duration,
    pub poll_read_timeout: Duration,
    pub script_local_path: String,
    pub script_remote_path: String,
    pub script_invoke_path: String,
    pub artifact_path: String,
}

impl From<&DumpConfig> for DumpSettings {
    fn from(config: &DumpConfig) -> Self {
        Self {
            poll_attempts: config.poll.attempts.max(1),
            poll_interval: Duration::from_secs(config.poll.interval_secs),
            lookup_timeout: Duration::from_secs(config.timeouts.lookup_secs),
            exec_timeout: Duration::from_secs(config.timeouts.exec_secs),
            transfer_timeout: Duration::from_secs(config.timeouts.transfer_secs),
            poll_read_timeout: Duration::from_secs(config.timeouts.poll_read_secs),
            script_local_path: config.script.local_path.clone(),
            script_remote_path: config.script.remote_path.clone(),
            script_invoke_path: config.script.invoke_path.clone(),
            artifact_path: config.artifact.remote_path.clone(),
        }
    }
}

impl Default for DumpSettings {
    fn default() -> Self {
        Self::from(&DumpConfig::default())
    }
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates a configuration key against the whitelist.
///
/// # Errors
///
/// Returns an error if the key is not in the allowed list.
pub fn validate_config_key(key: &str) -> Result<()> {
    if !VALID_CONFIG_KEYS.contains(&key) {
        return Err(ConfigError::UnknownKey {
            key: key.to_string(),
            valid: VALID_CONFIG_KEYS.join(", "),
        }
        .into());
    }
    Ok(())
}

/// Validates a configuration value for the given key.
///
/// # Errors
///
/// Returns an error if the value is not valid for the key.
pub fn validate_config_value(key: &str, value: &str) -> Result<()> {
    if NUMERIC_KEYS.contains(&key) {
        let parsed: Option<u64> = value.parse().ok();
        if !matches!(parsed, Some(n) if n > 0) {
            return Err(invalid(key, value, "Expected a positive integer"));
        }
        if key == "poll.attempts" && value.parse::<u32>().is_err() {
            return Err(invalid(key, value, "Expected a positive integer"));
        }
        return Ok(());
    }
    if key != "kubectl.context" && value.trim().is_empty() {
        return Err(invalid(key, value, "Expected a non-empty value"));
    }
    Ok(())
}

/// Apply a validated key/value pair to `config`.
///
/// An empty `kubectl.context` clears the override.
///
/// # Errors
///
/// Returns an error if the key is unknown or the value does not validate.
pub fn apply_config_value(config: &mut DumpConfig, key: &str, value: &str) -> Result<()> {
    validate_config_key(key)?;
    validate_config_value(key, value)?;

    let secs = || value.parse::<u64>().map_err(anyhow::Error::from);
    match key {
        "poll.attempts" => config.poll.attempts = value.parse()?,
        "poll.interval_secs" => config.poll.interval_secs = secs()?,
        "timeouts.lookup_secs" => config.timeouts.lookup_secs = secs()?,
        "timeouts.exec_secs" => config.timeouts.exec_secs = secs()?,
        "timeouts.transfer_secs" => config.timeouts.transfer_secs = secs()?,
        "timeouts.poll_read_secs" => config.timeouts.poll_read_secs = secs()?,
        "script.local_path" => config.script.local_path = value.to_string(),
        "script.remote_path" => config.script.remote_path = value.to_string(),
        "script.invoke_path" => config.script.invoke_path = value.to_string(),
        "artifact.remote_path" => config.artifact.remote_path = value.to_string(),
        "kubectl.binary" => config.kubectl.binary = value.to_string(),
        "kubectl.context" => {
            config.kubectl.context = (!value.trim().is_empty()).then(|| value.to_string());
        }
        _ => anyhow::bail!("Unknown setting: {key}"),
    }
    Ok(())
}

fn invalid(key: &str, value: &str, expected: &str) -> anyhow::Error {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        expected: expected.to_string(),
    }
    .into()
}

// ── Unit tests ───────────────────────────────────────────────────────────────
