//! `procdump ps` — show the process list of one container.

use std::process::ExitCode;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::app::AppContext;
use crate::application::services::config_service;
use crate::application::services::process_lister::list_processes;
use crate::application::services::target_resolver::resolve_target;
use crate::commands::TargetArgs;
use crate::domain::{DumpOutcome, DumpSettings, DumpTarget, FailureKind, GuestOs};
use crate::infra::kubectl::KubectlCluster;
use crate::output::json;

#[derive(Serialize)]
struct ListingReport<'a> {
    namespace: &'a str,
    pod: &'a str,
    container: &'a str,
    os: GuestOs,
    processes: &'a str,
}

/// Run the ps command.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the output
/// cannot be serialized. Lookup and exec failures map to the exit code.
pub async fn run(app: &AppContext, args: &TargetArgs) -> Result<ExitCode> {
    let config = config_service::load_config(&app.config_store)?;
    let settings = DumpSettings::from(&config);
    let cluster = KubectlCluster::default_runner(&config.kubectl);

    let request = args.to_request();
    let target = match resolve_target(&request, &cluster, settings.lookup_timeout).await {
        Ok(target) => target,
        Err(err) => return fail(app, err.into()),
    };
    match list_processes(&cluster, &target, settings.exec_timeout).await {
        Ok(listing) => {
            render(app, &target, &listing)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => fail(
            app,
            FailureKind::Transport {
                step: "listing".to_string(),
                message: err.to_string(),
            },
        ),
    }
}

fn render(app: &AppContext, target: &DumpTarget, listing: &str) -> Result<()> {
    if app.json() {
        let report = ListingReport {
            namespace: &target.namespace,
            pod: &target.unit_name,
            container: &target.container_name,
            os: target.guest_os,
            processes: listing,
        };
        let out = serde_json::to_string_pretty(&report).context("JSON serialization failed")?;
        println!("{out}");
    } else {
        app.human().render_processes(listing);
    }
    Ok(())
}

fn fail(app: &AppContext, cause: FailureKind) -> Result<ExitCode> {
    let outcome = DumpOutcome::failed(cause);
    if app.json() {
        println!("{}", json::format_outcome(&outcome)?);
    } else {
        app.human().render_outcome(&outcome);
    }
    Ok(ExitCode::from(outcome.exit_code()))
}
