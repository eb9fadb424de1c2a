//! Application services — use-case orchestration.
//!
//! Each service module implements a single use-case by composing domain logic
//! with port trait calls. Services import only from `crate::domain` and
//! `crate::application::ports` — never from `crate::infra`, `crate::commands`,
//! or `crate::output`.

pub mod config_service;
pub mod dump_orchestrator;
pub mod leases;
pub mod process_lister;
pub mod target_resolver;

use std::future::Future;
use std::time::Duration;

use crate::domain::PortError;

/// Bound a single port call by `limit`. Dropping the call on timeout also
/// drops whatever child process the adapter spawned for it.
pub(crate) async fn bounded<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, PortError>>,
) -> Result<T, PortError> {
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or(Err(PortError::TimedOut(limit)))
}
