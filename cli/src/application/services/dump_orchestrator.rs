//! Application service — the process dump state machine.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! All I/O is routed through the injected `RemoteCluster`.
//!
//! ```text
//! Validating → Listing → AwaitingTargetSelection → Staging → Triggering → Polling → Terminal
//! ```
//!
//! Every transition checks the cancellation token first, and remote calls in
//! Staging, Triggering and Polling are abandoned as soon as it fires. Only
//! Listing tolerates failure; every other failing step goes straight to
//! Terminal.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::application::ports::{ProgressReporter, RemoteCluster};
use crate::application::services::bounded;
use crate::application::services::leases::{LeaseKey, TargetLease, TargetLeases};
use crate::application::services::process_lister::list_processes;
use crate::application::services::target_resolver::resolve_target;
use crate::domain::command::{artifact_read_command, trigger_command};
use crate::domain::{
    DumpOutcome, DumpRequest, DumpSettings, DumpTarget, FailureKind, GuestOs, PortError,
    ProcessSelector,
};

/// Reason reported when a Windows target has neither a process id nor a name.
pub const NO_PROCESS_SELECTOR: &str = "no process selector";

/// Reason reported for Linux targets.
pub const LINUX_UNSUPPORTED: &str = "dump collection is not supported for linux containers";

/// States of one orchestration run. Each state owns what it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DumpState {
    Validating,
    Listing(DumpTarget),
    AwaitingTargetSelection(DumpTarget),
    Staging(DumpTarget, ProcessSelector),
    Triggering(DumpTarget, ProcessSelector),
    Polling(DumpTarget),
    Terminal(DumpOutcome),
}

impl DumpState {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::Listing(_) => "listing",
            Self::AwaitingTargetSelection(_) => "awaiting_target_selection",
            Self::Staging(..) => "staging",
            Self::Triggering(..) => "triggering",
            Self::Polling(_) => "polling",
            Self::Terminal(_) => "terminal",
        }
    }
}

/// Drives one dump request end to end.
pub struct DumpOrchestrator<'a, C: RemoteCluster, R: ProgressReporter> {
    cluster: &'a C,
    reporter: &'a R,
    settings: &'a DumpSettings,
    cancel: CancellationToken,
    leases: Option<&'a TargetLeases>,
}

impl<'a, C: RemoteCluster, R: ProgressReporter> DumpOrchestrator<'a, C, R> {
    pub fn new(cluster: &'a C, reporter: &'a R, settings: &'a DumpSettings) -> Self {
        Self {
            cluster,
            reporter,
            settings,
            cancel: CancellationToken::new(),
            leases: None,
        }
    }

    /// Honor `token` at every transition and polling iteration.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Serialize Staging through Polling against other runs sharing `leases`.
    #[must_use]
    pub fn with_leases(mut self, leases: &'a TargetLeases) -> Self {
        self.leases = Some(leases);
        self
    }

    /// Run the workflow to its terminal state.
    ///
    /// Never fails: every error becomes a `DumpOutcome`. Cancellation does not
    /// roll back a dump that was already triggered remotely.
    pub async fn run(&self, request: &DumpRequest) -> DumpOutcome {
        let mut state = DumpState::Validating;
        let mut lease: Option<TargetLease> = None;

        loop {
            if self.cancel.is_cancelled() && !matches!(state, DumpState::Terminal(_)) {
                tracing::warn!(state = state.name(), "cancelled");
                state = DumpState::Terminal(DumpOutcome::cancelled());
            }
            tracing::debug!(state = state.name(), "entering state");

            state = match state {
                DumpState::Validating => self.validate(request).await,
                DumpState::Listing(target) => self.list(target).await,
                DumpState::AwaitingTargetSelection(target) => self.select(target),
                DumpState::Staging(target, selector) => match self.lease(&target).await {
                    Ok(held) => {
                        lease = held;
                        self.stage(target, selector).await
                    }
                    Err(cause) => DumpState::Terminal(DumpOutcome::failed(cause)),
                },
                DumpState::Triggering(target, selector) => self.trigger(target, &selector).await,
                DumpState::Polling(target) => DumpState::Terminal(self.poll(&target).await),
                DumpState::Terminal(outcome) => {
                    drop(lease);
                    tracing::info!(outcome = outcome.label(), "dump run finished");
                    return outcome;
                }
            };
        }
    }

    async fn validate(&self, request: &DumpRequest) -> DumpState {
        self.reporter.step("validating target pod...");
        match resolve_target(request, self.cluster, self.settings.lookup_timeout).await {
            Ok(target) => {
                self.reporter.success(&format!(
                    "found pod {} in namespace {} (container {}, {})",
                    target.unit_name, target.namespace, target.container_name, target.guest_os
                ));
                DumpState::Listing(target)
            }
            Err(err) => DumpState::Terminal(DumpOutcome::failed(err.into())),
        }
    }

    async fn list(&self, target: DumpTarget) -> DumpState {
        self.reporter.step(&format!(
            "getting process list of pod({})/container({})...",
            target.unit_name, target.container_name
        ));
        match list_processes(self.cluster, &target, self.settings.exec_timeout).await {
            Ok(listing) => self.reporter.diagnostic("process list", &listing),
            Err(err) => {
                tracing::warn!(error = %err, "process listing failed, continuing");
                self.reporter.warn(&format!("could not list processes: {err}"));
            }
        }
        DumpState::AwaitingTargetSelection(target)
    }

    fn select(&self, target: DumpTarget) -> DumpState {
        if target.guest_os == GuestOs::Linux {
            self.reporter.warn("dump in linux containers is not supported");
            return unsupported(LINUX_UNSUPPORTED);
        }
        match target.selector() {
            Some(selector) => DumpState::Staging(target, selector),
            None => {
                self.reporter.warn(
                    "no target process: set --process-id (PROCESS_ID) or --process-name (PROCESS_NAME)",
                );
                unsupported(NO_PROCESS_SELECTOR)
            }
        }
    }

    /// Take the target lease when a registry is configured. Waiting is
    /// cancellable.
    async fn lease(&self, target: &DumpTarget) -> Result<Option<TargetLease>, FailureKind> {
        let Some(leases) = self.leases else {
            return Ok(None);
        };
        tokio::select! {
            () = self.cancel.cancelled() => Err(FailureKind::Cancelled),
            lease = leases.acquire(LeaseKey::from(target)) => Ok(Some(lease)),
        }
    }

    /// Bound `call` by `limit`. `None` when cancellation fires first.
    async fn guarded<T>(
        &self,
        limit: Duration,
        call: impl Future<Output = Result<T, PortError>>,
    ) -> Option<Result<T, PortError>> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => {
                tracing::warn!("cancelled during remote call");
                None
            }
            result = bounded(limit, call) => Some(result),
        }
    }

    async fn stage(&self, target: DumpTarget, selector: ProcessSelector) -> DumpState {
        let settings = self.settings;
        self.reporter.step(&format!(
            "staging {} to {}...",
            settings.script_local_path, settings.script_remote_path
        ));
        let copy = self.cluster.copy_into(
            target.unit_ref(),
            Path::new(&settings.script_local_path),
            &settings.script_remote_path,
        );
        match self.guarded(settings.transfer_timeout, copy).await {
            None => DumpState::Terminal(DumpOutcome::cancelled()),
            Some(Ok(())) => DumpState::Triggering(target, selector),
            Some(Err(err)) => transport_failure("staging", &err),
        }
    }

    async fn trigger(&self, target: DumpTarget, selector: &ProcessSelector) -> DumpState {
        let spec = trigger_command(&self.settings.script_invoke_path, selector);
        self.reporter.step("start dump...");
        tracing::info!(unit = %target.unit_ref(), argv = ?spec.argv, "triggering dump");
        match self
            .guarded(
                self.settings.exec_timeout,
                self.cluster.run(target.unit_ref(), &spec),
            )
            .await
        {
            None => DumpState::Terminal(DumpOutcome::cancelled()),
            Some(Ok(_)) => DumpState::Polling(target),
            Some(Err(err)) => transport_failure("triggering", &err),
        }
    }

    /// Read the artifact up to `poll_attempts` times, `poll_interval` apart.
    ///
    /// A read that fails, times out or yields only whitespace counts as
    /// "not written yet". The first read with any other content is returned
    /// byte for byte.
    async fn poll(&self, target: &DumpTarget) -> DumpOutcome {
        let spec = artifact_read_command(&self.settings.artifact_path);
        let bound = self.settings.poll_attempts;
        self.reporter.step("waiting for dump to complete...");

        for attempt in 1..=bound {
            if self.cancel.is_cancelled() {
                return DumpOutcome::cancelled();
            }
            let Some(read) = self
                .guarded(
                    self.settings.poll_read_timeout,
                    self.cluster.run(target.unit_ref(), &spec),
                )
                .await
            else {
                return DumpOutcome::cancelled();
            };
            match read {
                Ok(output) if !output.stdout.trim().is_empty() => {
                    self.reporter.success("dump uploaded");
                    return DumpOutcome::Success {
                        log_contents: output.stdout,
                    };
                }
                Ok(_) => tracing::debug!(attempt, bound, "artifact empty"),
                Err(err) => tracing::debug!(attempt, bound, error = %err, "artifact not readable"),
            }
            if attempt < bound {
                tokio::select! {
                    () = self.cancel.cancelled() => return DumpOutcome::cancelled(),
                    () = tokio::time::sleep(self.settings.poll_interval) => {}
                }
            }
        }
        self.reporter.warn(&format!("no dump artifact after {bound} attempts"));
        DumpOutcome::Timeout {
            attempts_made: bound,
        }
    }
}

fn unsupported(reason: &str) -> DumpState {
    DumpState::Terminal(DumpOutcome::Unsupported {
        reason: reason.to_string(),
    })
}

fn transport_failure(step: &str, err: &PortError) -> DumpState {
    tracing::error!(step, error = %err, "step failed");
    DumpState::Terminal(DumpOutcome::failed(FailureKind::Transport {
        step: step.to_string(),
        message: err.to_string(),
    }))
}
