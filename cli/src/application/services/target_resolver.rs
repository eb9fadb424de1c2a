//! Application service — turn raw operator input into a `DumpTarget`.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::time::Duration;

use crate::application::ports::UnitDirectory;
use crate::application::services::bounded;
use crate::domain::target::non_empty;
use crate::domain::{DumpRequest, DumpTarget, GuestOs, PortError, ResolveError};

/// Namespace used when the operator leaves it blank.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Resolve the pod, container, and guest OS the dump will run against.
///
/// Input is validated before the directory is queried, so a missing pod name
/// never causes a remote call. The pod is looked up fresh on every call.
///
/// # Errors
///
/// - `InvalidInput` for a blank pod, a malformed selector, or a container
///   that the pod does not have.
/// - `NotFound` when the pod does not exist or has no containers.
/// - `Transport` when the lookup fails or exceeds `lookup_timeout`.
pub async fn resolve_target(
    request: &DumpRequest,
    directory: &impl UnitDirectory,
    lookup_timeout: Duration,
) -> Result<DumpTarget, ResolveError> {
    request.validate()?;

    let namespace = non_empty(&request.namespace).unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
    let pod = request.pod.trim().to_string();

    let unit = match bounded(lookup_timeout, directory.get_unit(&namespace, &pod)).await {
        Ok(unit) => unit,
        Err(PortError::NotFound { .. }) => {
            tracing::warn!(namespace = %namespace, pod = %pod, "pod not found");
            return Err(ResolveError::NotFound(format!(
                "pod '{pod}' not found in namespace '{namespace}'"
            )));
        }
        Err(err) => return Err(ResolveError::Transport(err.to_string())),
    };
    tracing::info!(namespace = %namespace, pod = %pod, "found pod");

    let container_name = match non_empty(&request.container) {
        Some(requested) => {
            if !unit.containers.contains(&requested) {
                return Err(ResolveError::InvalidInput(format!(
                    "container '{requested}' not found in pod '{pod}' (available: {})",
                    unit.containers.join(", ")
                )));
            }
            requested
        }
        None => unit.containers.first().cloned().ok_or_else(|| {
            ResolveError::NotFound(format!("pod '{pod}' has no containers"))
        })?,
    };

    let guest_os = match unit.os_label() {
        Some(label) => GuestOs::from_label(label).unwrap_or_else(|| {
            tracing::warn!(pod = %pod, label, "unrecognised OS label, assuming linux");
            GuestOs::Linux
        }),
        None => {
            tracing::info!(pod = %pod, "no OS node selector on pod, assuming linux");
            GuestOs::Linux
        }
    };

    Ok(DumpTarget {
        namespace,
        unit_name: pod,
        container_name,
        guest_os,
        process_name: non_empty(&request.process_name),
        process_id: non_empty(&request.process_id),
    })
}
