//! Concurrent store of the latest snapshot per resource.
//!
//! One store is scoped to one orchestrator session and shared by `Arc` with every
//! component that needs it. Writes replace a resource's snapshot wholesale, so a
//! reader either sees the previous snapshot or the new one, never a mix.

use crate::types::{ResourceSnapshot, PID_PROPERTY};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Endpoint labels in order of preference: a stable externally reachable
/// endpoint beats a transient loopback port.
pub const PREFERRED_URL_LABELS: &[&str] = &["https-target-port", "https", "http-target-port", "http"];

/// Latest observed snapshot per resource name. Last writer wins per key.
#[derive(Debug, Default)]
pub struct ResourceSnapshotStore {
    snapshots: DashMap<String, Arc<ResourceSnapshot>>,
}

impl ResourceSnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot for `name`, or remove it when `snapshot` is `None`.
    pub fn store(&self, name: &str, snapshot: Option<ResourceSnapshot>) {
        match snapshot {
            Some(snapshot) => {
                debug!(resource = %name, state = %snapshot.run_state, "Storing snapshot");
                self.snapshots.insert(name.to_string(), Arc::new(snapshot));
            }
            None => {
                debug!(resource = %name, "Removing snapshot");
                self.snapshots.remove(name);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<ResourceSnapshot>> {
        self.snapshots.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Pid of the resource's executable. Zero means not yet known.
    pub fn get_pid(&self, name: &str) -> Option<u32> {
        let snapshot = self.get(name)?;
        let pid = snapshot.properties.get(PID_PROPERTY)?.as_i64()?;
        u32::try_from(pid).ok().filter(|pid| *pid != 0)
    }

    /// Best base URL for the resource, see [`PREFERRED_URL_LABELS`].
    pub fn get_preferred_url(&self, name: &str) -> Option<String> {
        let snapshot = self.get(name)?;
        PREFERRED_URL_LABELS.iter().find_map(|label| {
            snapshot
                .urls
                .iter()
                .find(|u| u.label == *label)
                .map(|u| u.url.clone())
        })
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.snapshots.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
