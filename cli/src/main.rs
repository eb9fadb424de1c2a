//! procdump - collect diagnostic dumps from processes in Windows containers

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use procdump_cli::cli::Cli;
use procdump_cli::output::json;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_directive())),
        )
        .with_writer(std::io::stderr)
        .init();

    let json_mode = cli.json;
    match cli.run().await {
        Ok(code) => code,
        Err(e) => {
            match json::format_error(&format!("{e:#}"), "error") {
                Ok(obj) if json_mode => println!("{obj}"),
                _ => eprintln!("Error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}
