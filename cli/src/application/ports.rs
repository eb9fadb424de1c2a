//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` — never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};
use std::process::Output;

use anyhow::Result;

use crate::domain::{DumpConfig, PortError, RemoteCommandSpec, UnitMetadata, UnitRef};

// ── Value Types ───────────────────────────────────────────────────────────────

/// Captured output of a remote command. Streams that were not requested
/// for capture are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
}

// ── Remote Port Traits ────────────────────────────────────────────────────────

/// Pod metadata lookup.
#[allow(async_fn_in_trait)]
pub trait UnitDirectory {
    /// Fetch a fresh snapshot of the pod.
    ///
    /// # Errors
    ///
    /// `PortError::NotFound` when the pod does not exist, any other variant
    /// when the lookup itself failed.
    async fn get_unit(&self, namespace: &str, pod: &str) -> Result<UnitMetadata, PortError>;
}

/// Command execution inside a container.
#[allow(async_fn_in_trait)]
pub trait RemoteExec {
    /// Run `spec` in the container and wait for it to exit.
    ///
    /// # Errors
    ///
    /// `PortError::NonZeroExit` when the command ran but failed, any other
    /// variant when the channel failed.
    async fn run(&self, unit: UnitRef<'_>, spec: &RemoteCommandSpec)
    -> Result<ExecOutput, PortError>;
}

/// Host-to-container file transfer.
#[allow(async_fn_in_trait)]
pub trait RemoteTransfer {
    /// Copy a local file to `remote` inside the container.
    ///
    /// # Errors
    ///
    /// Returns an error if the local file cannot be read or the copy fails.
    async fn copy_into(&self, unit: UnitRef<'_>, local: &Path, remote: &str)
    -> Result<(), PortError>;
}

/// Composite trait — any type implementing all three remote ports.
pub trait RemoteCluster: UnitDirectory + RemoteExec + RemoteTransfer {}

/// Blanket implementation: any type implementing all three sub-traits is a `RemoteCluster`.
impl<T> RemoteCluster for T where T: UnitDirectory + RemoteExec + RemoteTransfer {}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: std::time::Duration,
    ) -> Result<Output>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait — no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
    /// Surface raw remote output (e.g. a process listing) to the operator.
    fn diagnostic(&self, title: &str, body: &str);
}

// ── Config Port ───────────────────────────────────────────────────────────────

/// Abstracts loading and saving the tuning configuration.
pub trait ConfigStore {
    /// Load the configuration, falling back to defaults when absent.
    fn load(&self) -> Result<DumpConfig>;
    /// Persist the configuration.
    fn save(&self, config: &DumpConfig) -> Result<()>;
    /// Location of the configuration file.
    fn path(&self) -> Result<PathBuf>;
}
