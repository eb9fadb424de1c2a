//! Process listing in the guest's own dialect.
//!
//! Diagnostic only: the output is shown to the operator and never parsed.

use std::time::Duration;

use crate::application::ports::RemoteExec;
use crate::application::services::bounded;
use crate::domain::command::POWERSHELL;
use crate::domain::{DumpTarget, GuestOs, PortError, RemoteCommandSpec};

/// Listing command for `os`: `sh -c ps` or `powershell.exe Get-Process`.
#[must_use]
pub fn listing_command(os: GuestOs) -> RemoteCommandSpec {
    match os {
        GuestOs::Linux => RemoteCommandSpec::tty(["sh", "-c", "ps"]),
        GuestOs::Windows => RemoteCommandSpec::tty([POWERSHELL, "Get-Process"]),
    }
}

/// Run the listing command in the target container and return its raw stdout.
///
/// # Errors
///
/// Passes through exec port failures, including a timeout after `timeout`.
pub async fn list_processes(
    exec: &impl RemoteExec,
    target: &DumpTarget,
    timeout: Duration,
) -> Result<String, PortError> {
    let spec = listing_command(target.guest_os);
    let output = bounded(timeout, exec.run(target.unit_ref(), &spec)).await?;
    Ok(output.stdout)
}
