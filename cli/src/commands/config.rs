//! `procdump config` — show and set configuration values.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Subcommand;

use crate::app::AppContext;
use crate::application::ports::ConfigStore;
use crate::application::services::config_service;

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,
    /// Set configuration value
    Set {
        /// Configuration key (e.g. poll.attempts)
        key: String,
        /// Configuration value
        value: String,
    },
}

/// Run the config command.
///
/// # Errors
///
/// Returns an error if the key or value is invalid or the file cannot be
/// read or written.
pub fn run(app: &AppContext, cmd: ConfigCommand) -> Result<ExitCode> {
    match cmd {
        ConfigCommand::Show => show_config(app),
        ConfigCommand::Set { key, value } => set_config(app, &key, &value),
    }
}

fn show_config(app: &AppContext) -> Result<ExitCode> {
    let config = config_service::load_config(&app.config_store)?;
    let path = app.config_store.path()?;
    if app.json() {
        let obj = serde_json::json!({
            "path": path.display().to_string(),
            "config": config,
        });
        let out = serde_json::to_string_pretty(&obj).context("JSON serialization failed")?;
        println!("{out}");
    } else {
        app.human()
            .render_config(&config, &path.display().to_string());
    }
    Ok(ExitCode::SUCCESS)
}

fn set_config(app: &AppContext, key: &str, value: &str) -> Result<ExitCode> {
    config_service::set_config_value(&app.config_store, key, value)?;
    if app.json() {
        let obj = serde_json::json!({ "key": key, "value": value });
        let out = serde_json::to_string_pretty(&obj).context("JSON serialization failed")?;
        println!("{out}");
    } else {
        app.output.success(&format!("Set {key} = {value}"));
    }
    Ok(ExitCode::SUCCESS)
}
