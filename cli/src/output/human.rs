//! Human-readable terminal renderer.

use crate::domain::{DumpConfig, DumpOutcome, FailureKind};
use crate::output::OutputContext;

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the terminal outcome of a dump run.
    ///
    /// Success prints the artifact contents verbatim on stdout even when
    /// `quiet`, since that is the product of the run.
    pub fn render_outcome(&self, outcome: &DumpOutcome) {
        match outcome {
            DumpOutcome::Success { log_contents } => {
                self.ctx.success("Dump Uploaded");
                print!("{log_contents}");
                if !log_contents.ends_with('\n') {
                    println!();
                }
            }
            DumpOutcome::Timeout { attempts_made } => {
                self.ctx.error(&format!(
                    "dump did not finish: no artifact after {attempts_made} attempts"
                ));
                self.ctx
                    .info("The dump may still complete in the container; check the artifact path.");
            }
            DumpOutcome::Unsupported { reason } => {
                self.ctx.error(reason);
            }
            DumpOutcome::Failed { cause } => {
                self.ctx.error(&cause.to_string());
                if let Some(hint) = failure_hint(cause) {
                    self.ctx.info(hint);
                }
            }
        }
    }

    /// Render a raw process listing.
    pub fn render_processes(&self, listing: &str) {
        print!("{listing}");
        if !listing.is_empty() && !listing.ends_with('\n') {
            println!();
        }
    }

    /// Render the effective configuration.
    pub fn render_config(&self, config: &DumpConfig, path: &str) {
        self.ctx.header("Configuration");
        self.ctx.kv("file:", path);
        println!();
        self.ctx.kv("poll.attempts:", &config.poll.attempts.to_string());
        self.ctx
            .kv("poll.interval_secs:", &config.poll.interval_secs.to_string());
        self.ctx
            .kv("timeouts.lookup_secs:", &config.timeouts.lookup_secs.to_string());
        self.ctx
            .kv("timeouts.exec_secs:", &config.timeouts.exec_secs.to_string());
        self.ctx.kv(
            "timeouts.transfer_secs:",
            &config.timeouts.transfer_secs.to_string(),
        );
        self.ctx.kv(
            "timeouts.poll_read_secs:",
            &config.timeouts.poll_read_secs.to_string(),
        );
        self.ctx.kv("script.local_path:", &config.script.local_path);
        self.ctx.kv("script.remote_path:", &config.script.remote_path);
        self.ctx.kv("script.invoke_path:", &config.script.invoke_path);
        self.ctx
            .kv("artifact.remote_path:", &config.artifact.remote_path);
        self.ctx.kv("kubectl.binary:", &config.kubectl.binary);
        self.ctx.kv(
            "kubectl.context:",
            config.kubectl.context.as_deref().unwrap_or("(current)"),
        );
    }

    /// Render the CLI version information.
    pub fn render_version(&self, version: &str) {
        if self.ctx.quiet {
            return;
        }
        println!("procdump {version}");
    }
}

fn failure_hint(cause: &FailureKind) -> Option<&'static str> {
    match cause {
        FailureKind::InvalidInput(_) => {
            Some("Set --pod (POD_NAME) and either --process-id or --process-name.")
        }
        FailureKind::NotFound(_) => Some("Check the namespace and pod name with: kubectl get pods"),
        FailureKind::Transport { .. } => Some("Run with -v for kubectl diagnostics."),
        FailureKind::Cancelled => None,
    }
}
