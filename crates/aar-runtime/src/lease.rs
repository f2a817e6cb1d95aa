//! Per-session exclusive lease: at most one turn in flight per session
//! at a time, backed by a map of per-session `tokio::sync::Mutex` guards.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Holds one lock per session id, created lazily on first use and never
/// removed — sessions are long-lived and the map entry is a handful of
/// bytes, so there is no eviction policy here.
#[derive(Default)]
pub struct SessionLeaseRegistry {
    leases: DashMap<String, Arc<Mutex<()>>>,
}

impl SessionLeaseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lease_for(&self, storage_id: &str) -> Arc<Mutex<()>> {
        self.leases.entry(storage_id.to_string()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    /// Blocks until the session's lease is free, then holds it for the
    /// lifetime of the returned guard. Used when `queue_busy_sessions` is
    /// enabled (the default).
    pub async fn acquire(&self, storage_id: &str) -> OwnedMutexGuard<()> {
        self.lease_for(storage_id).lock_owned().await
    }

    /// Returns `None` immediately if another turn already holds the
    /// session's lease. Used when queueing is disabled — the caller should
    /// surface `AarError::SessionBusy`.
    pub fn try_acquire(&self, storage_id: &str) -> Option<OwnedMutexGuard<()>> {
        self.lease_for(storage_id).try_lock_owned().ok()
    }
}
