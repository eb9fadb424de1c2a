//! Version command

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;

/// Run the version command.
///
/// # Errors
///
/// This function currently cannot fail but returns `Result` for
/// consistency with the other command handlers.
pub fn run(app: &AppContext) -> Result<ExitCode> {
    let version = env!("CARGO_PKG_VERSION");

    if app.json() {
        println!("{}", serde_json::json!({ "version": version }));
    } else {
        app.human().render_version(version);
    }
    Ok(ExitCode::SUCCESS)
}
