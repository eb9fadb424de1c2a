//! Dump target identity: raw operator input, pod metadata, and the resolved target.
//!
//! Pure types and validation only. Resolution against a live cluster lives in
//! `application::services::target_resolver`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::domain::error::ResolveError;

/// Node-selector keys consulted for the guest OS, highest priority first.
pub const OS_LABEL_KEYS: &[&str] = &["beta.kubernetes.io/os", "kubernetes.io/os"];

/// Process ids are interpolated into a PowerShell command line; digits only.
pub static PROCESS_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[0-9]{1,10}$").expect("valid regex")
});

/// Process names as shown by `Get-Process` (no extension, no shell metacharacters).
pub static PROCESS_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[A-Za-z0-9._-]{1,128}$").expect("valid regex")
});

// ── Guest OS ──────────────────────────────────────────────────────────────────

/// Operating system of the target container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GuestOs {
    #[default]
    Linux,
    Windows,
}

impl GuestOs {
    /// Parse a node-selector OS label value. Returns `None` for unknown values.
    #[must_use]
    pub fn from_label(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "linux" => Some(Self::Linux),
            "windows" => Some(Self::Windows),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Windows => "windows",
        }
    }
}

impl fmt::Display for GuestOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Raw request ───────────────────────────────────────────────────────────────

/// Unresolved operator input. Every field may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DumpRequest {
    pub namespace: String,
    pub pod: String,
    pub container: String,
    pub process_name: String,
    pub process_id: String,
}

impl DumpRequest {
    /// Check everything that can be checked without talking to the cluster.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::InvalidInput` if the pod name is empty or a
    /// process selector contains characters that cannot be passed safely to
    /// the remote shell.
    pub fn validate(&self) -> Result<(), ResolveError> {
        if self.pod.trim().is_empty() {
            return Err(ResolveError::InvalidInput(
                "pod name cannot be empty (set --pod or POD_NAME)".to_string(),
            ));
        }
        let id = self.process_id.trim();
        if !id.is_empty() && !PROCESS_ID_RE.is_match(id) {
            return Err(ResolveError::InvalidInput(format!(
                "process id '{id}' must be a decimal number"
            )));
        }
        let name = self.process_name.trim();
        if !name.is_empty() && !PROCESS_NAME_RE.is_match(name) {
            return Err(ResolveError::InvalidInput(format!(
                "process name '{name}' may only contain letters, digits, '.', '_' and '-'"
            )));
        }
        Ok(())
    }
}

// ── Pod metadata ──────────────────────────────────────────────────────────────

/// Snapshot of a pod as reported by the unit directory. Never cached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitMetadata {
    /// Container names in the order the directory returned them.
    pub containers: Vec<String>,
    /// Node-selector labels of the pod spec.
    pub node_selector: BTreeMap<String, String>,
}

impl UnitMetadata {
    /// First OS label present, following [`OS_LABEL_KEYS`] priority.
    #[must_use]
    pub fn os_label(&self) -> Option<&str> {
        OS_LABEL_KEYS
            .iter()
            .find_map(|key| self.node_selector.get(*key))
            .map(String::as_str)
    }
}

// ── Resolved target ───────────────────────────────────────────────────────────

/// Which process inside the container to dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "by", content = "value")]
pub enum ProcessSelector {
    Id(String),
    Name(String),
}

/// A fully resolved dump target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DumpTarget {
    pub namespace: String,
    pub unit_name: String,
    pub container_name: String,
    pub guest_os: GuestOs,
    pub process_name: Option<String>,
    pub process_id: Option<String>,
}

impl DumpTarget {
    /// The process selector, if any. The id wins when both are present since a
    /// name may match several processes.
    #[must_use]
    pub fn selector(&self) -> Option<ProcessSelector> {
        match (&self.process_id, &self.process_name) {
            (Some(id), _) => Some(ProcessSelector::Id(id.clone())),
            (None, Some(name)) => Some(ProcessSelector::Name(name.clone())),
            (None, None) => None,
        }
    }

    /// Borrowed pod/container coordinates for port calls.
    #[must_use]
    pub fn unit_ref(&self) -> UnitRef<'_> {
        UnitRef {
            namespace: &self.namespace,
            pod: &self.unit_name,
            container: &self.container_name,
        }
    }
}

/// Coordinates of one container, as passed to exec and transfer ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitRef<'a> {
    pub namespace: &'a str,
    pub pod: &'a str,
    pub container: &'a str,
}

impl fmt::Display for UnitRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.namespace, self.pod, self.container)
    }
}

/// Turn an operator-supplied string into `None` when blank.
#[must_use]
pub fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
