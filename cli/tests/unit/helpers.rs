//! Shared test helpers: output constructors and canned pod metadata.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::process::{ExitStatus, Output};

use procdump_cli::domain::{DumpRequest, UnitMetadata};

// ── Cross-platform ExitStatus construction ───────────────────────────────────

/// Build an `ExitStatus` from a logical exit code (0 = success, non-zero = failure).
///
/// On Unix the raw wait-status encodes the exit code in bits 8–15, so we shift.
/// On Windows `ExitStatusExt::from_raw` takes the exit code directly.
#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    #[allow(clippy::cast_sign_loss)]
    ExitStatus::from_raw(code as u32)
}

// ── Output constructors ──────────────────────────────────────────────────────

pub fn ok_output(stdout: &[u8]) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.to_vec(),
        stderr: Vec::new(),
    }
}

pub fn err_output(code: i32, stderr: &[u8]) -> Output {
    Output {
        status: exit_status(code),
        stdout: Vec::new(),
        stderr: stderr.to_vec(),
    }
}

// ── Domain fixtures ──────────────────────────────────────────────────────────

/// Pod with the given containers and an optional OS node-selector label.
pub fn pod(containers: &[&str], os_label: Option<(&str, &str)>) -> UnitMetadata {
    let mut node_selector = BTreeMap::new();
    if let Some((key, value)) = os_label {
        node_selector.insert(key.to_string(), value.to_string());
    }
    UnitMetadata {
        containers: containers.iter().map(ToString::to_string).collect(),
        node_selector,
    }
}

pub fn windows_pod() -> UnitMetadata {
    pod(&["app", "sidecar"], Some(("kubernetes.io/os", "windows")))
}

pub fn linux_pod() -> UnitMetadata {
    pod(&["app"], Some(("kubernetes.io/os", "linux")))
}

/// Request against `web-0` in `prod` with the given selectors.
pub fn request(process_id: &str, process_name: &str) -> DumpRequest {
    DumpRequest {
        namespace: "prod".to_string(),
        pod: "web-0".to_string(),
        container: String::new(),
        process_name: process_name.to_string(),
        process_id: process_id.to_string(),
    }
}
