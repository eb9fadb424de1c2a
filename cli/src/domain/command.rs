//! Remote command specifications for the dump workflow.
//!
//! Pure builders: no I/O. The exec port decides how a spec reaches the
//! container.

use crate::domain::target::ProcessSelector;

/// Shell used for every Windows-side command.
pub const POWERSHELL: &str = "powershell.exe";

/// A command to run inside a container, with its stream wiring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCommandSpec {
    pub argv: Vec<String>,
    pub attach_stdin: bool,
    pub capture_stdout: bool,
    pub capture_stderr: bool,
    pub allocate_tty: bool,
}

impl RemoteCommandSpec {
    /// Non-interactive command on a pseudo-terminal with both output streams captured.
    #[must_use]
    pub fn tty<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            attach_stdin: false,
            capture_stdout: true,
            capture_stderr: true,
            allocate_tty: true,
        }
    }

    /// Drop stderr from the captured output.
    #[must_use]
    pub fn without_stderr(mut self) -> Self {
        self.capture_stderr = false;
        self
    }
}

/// Build the argument appended to the script invocation, e.g. `-ProcID 42`.
#[must_use]
pub fn selector_argument(selector: &ProcessSelector) -> String {
    match selector {
        ProcessSelector::Id(id) => format!("-ProcID {id}"),
        ProcessSelector::Name(name) => format!("-ProcName {name}"),
    }
}

/// Command launching the staged dump script against the selected process.
///
/// The script detaches the dump work itself; this call returns once it is
/// launched.
#[must_use]
pub fn trigger_command(invoke_path: &str, selector: &ProcessSelector) -> RemoteCommandSpec {
    let line = format!("{invoke_path} {}", selector_argument(selector));
    RemoteCommandSpec::tty([POWERSHELL.to_string(), line]).without_stderr()
}

/// Command reading the completion artifact written by the dump script.
#[must_use]
pub fn artifact_read_command(artifact_path: &str) -> RemoteCommandSpec {
    RemoteCommandSpec::tty([POWERSHELL.to_string(), format!("cat {artifact_path}")])
        .without_stderr()
}
