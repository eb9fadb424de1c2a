//! `procdump dump` — run the dump workflow against one container.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use clap::builder::FalseyValueParser;

use crate::app::AppContext;
use crate::application::services::config_service;
use crate::application::services::dump_orchestrator::DumpOrchestrator;
use crate::application::services::leases::TargetLeases;
use crate::commands::TargetArgs;
use crate::domain::{DumpOutcome, DumpRequest, DumpSettings};
use crate::infra::kubectl::KubectlCluster;
use crate::infra::signals;
use crate::output::json;
use crate::output::reporter::TerminalReporter;

/// Arguments for the dump command.
#[derive(Args, Debug, Clone, Default)]
pub struct DumpArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Name of the process to dump
    #[arg(long, env = "PROCESS_NAME")]
    pub process_name: Option<String>,

    /// Id of the process to dump (wins over --process-name)
    #[arg(long, env = "PROCESS_ID")]
    pub process_id: Option<String>,

    /// Stay resident after reporting until SIGINT/SIGTERM
    #[arg(long, env = "HOLD_OPEN", value_parser = FalseyValueParser::new())]
    pub hold_open: bool,
}

impl DumpArgs {
    #[must_use]
    pub fn to_request(&self) -> DumpRequest {
        DumpRequest {
            process_name: self.process_name.clone().unwrap_or_default(),
            process_id: self.process_id.clone().unwrap_or_default(),
            ..self.target.to_request()
        }
    }
}

/// Run the dump command.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the outcome
/// cannot be rendered. Dump failures map to the exit code.
pub async fn run(app: &AppContext, args: DumpArgs) -> Result<ExitCode> {
    let config = config_service::load_config(&app.config_store)?;
    let settings = DumpSettings::from(&config);
    let cluster = KubectlCluster::default_runner(&config.kubectl);
    let cancel = signals::cancel_on_shutdown();
    let leases = TargetLeases::new();
    let request = args.to_request();

    let outcome = {
        let reporter = TerminalReporter::new(&app.output);
        DumpOrchestrator::new(&cluster, &reporter, &settings)
            .with_cancellation(cancel.clone())
            .with_leases(&leases)
            .run(&request)
            .await
    };
    render(app, &outcome)?;

    if args.hold_open && !cancel.is_cancelled() {
        signals::hold_open(&cancel).await;
    }
    Ok(ExitCode::from(outcome.exit_code()))
}

fn render(app: &AppContext, outcome: &DumpOutcome) -> Result<()> {
    if app.json() {
        println!("{}", json::format_outcome(outcome)?);
    } else {
        app.human().render_outcome(outcome);
    }
    Ok(())
}
