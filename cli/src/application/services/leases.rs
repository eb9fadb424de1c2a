//! Per-target mutual exclusion for concurrent dump runs.
//!
//! Two runs against the same container would overwrite each other's staged
//! script and read each other's artifact, so a lease is held from Staging
//! until the run reaches Terminal.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OwnedMutexGuard;

use crate::domain::DumpTarget;

/// Identity a lease is keyed on. The remote script and artifact paths are
/// per container, so the process selector is deliberately not part of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LeaseKey {
    pub namespace: String,
    pub pod: String,
    pub container: String,
}

impl From<&DumpTarget> for LeaseKey {
    fn from(target: &DumpTarget) -> Self {
        Self {
            namespace: target.namespace.clone(),
            pod: target.unit_name.clone(),
            container: target.container_name.clone(),
        }
    }
}

/// Registry of per-target locks shared by all orchestrators in the process.
#[derive(Debug, Default)]
pub struct TargetLeases {
    slots: Mutex<HashMap<LeaseKey, Arc<tokio::sync::Mutex<()>>>>,
}

/// A held lease. Released on drop.
#[derive(Debug)]
pub struct TargetLease {
    key: LeaseKey,
    _guard: OwnedMutexGuard<()>,
}

impl TargetLease {
    #[must_use]
    pub fn key(&self) -> &LeaseKey {
        &self.key
    }
}

impl TargetLeases {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other run holds `key`, then take the lease.
    pub async fn acquire(&self, key: LeaseKey) -> TargetLease {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            // Only the map references an idle slot.
            slots.retain(|_, slot| Arc::strong_count(slot) > 1);
            Arc::clone(slots.entry(key.clone()).or_default())
        };
        let guard = slot.lock_owned().await;
        TargetLease { key, _guard: guard }
    }

    /// Whether some run currently holds (or waits for) the lease on `key`.
    #[must_use]
    pub fn is_held(&self, key: &LeaseKey) -> bool {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.get(key).is_some_and(|slot| slot.try_lock().is_err())
    }
}
