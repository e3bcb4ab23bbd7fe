//! OS process introspection capability.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};
use tracing::debug;

/// Identity of a running process. Pids get recycled, so the start time is part
/// of the identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessHandle {
    pub pid: u32,
    pub start_time: DateTime<Utc>,
}

/// A process as seen during enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub handle: ProcessHandle,
    pub name: String,
}

/// Read-only view of the host's process table.
///
/// Implementations answer `None` for anything they cannot determine (process
/// exited, access denied, unsupported platform) and never panic.
pub trait ProcessInspector: Send + Sync {
    /// Start time of a live process.
    fn start_time(&self, pid: u32) -> Option<DateTime<Utc>>;

    /// Parent pid as claimed by the OS. May name a recycled pid.
    fn parent_pid(&self, pid: u32) -> Option<u32>;

    /// All processes currently running on the host.
    fn processes(&self) -> Vec<ProcessInfo>;
}

/// Select the inspector for the current platform.
pub fn system_inspector() -> Arc<dyn ProcessInspector> {
    if sysinfo::IS_SUPPORTED_SYSTEM {
        Arc::new(SysinfoInspector::new())
    } else {
        debug!("Process introspection not supported on this platform");
        Arc::new(UnsupportedInspector)
    }
}

fn to_datetime(secs: u64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(i64::try_from(secs).ok()?, 0)
}

/// Inspector backed by `sysinfo` (Linux `/proc`, macOS `libproc`, Windows
/// `NtQueryInformationProcess`).
///
/// Each query refreshes the relevant part of the process table; nothing is
/// served from an earlier snapshot.
pub struct SysinfoInspector {
    system: Mutex<System>,
}

impl SysinfoInspector {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }

    fn with_process<T>(&self, pid: u32, f: impl FnOnce(&sysinfo::Process) -> Option<T>) -> Option<T> {
        let mut system = self.system.lock().ok()?;
        let pid = Pid::from_u32(pid);
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing(),
        );
        system.process(pid).and_then(f)
    }
}

impl Default for SysinfoInspector {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessInspector for SysinfoInspector {
    fn start_time(&self, pid: u32) -> Option<DateTime<Utc>> {
        self.with_process(pid, |p| to_datetime(p.start_time()))
    }

    fn parent_pid(&self, pid: u32) -> Option<u32> {
        self.with_process(pid, |p| p.parent().map(|parent| parent.as_u32()))
    }

    fn processes(&self) -> Vec<ProcessInfo> {
        let Ok(mut system) = self.system.lock() else {
            return Vec::new();
        };
        system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing(),
        );

        system
            .processes()
            .iter()
            // Linux lists threads as tasks parented to their owning process
            .filter(|(_, process)| process.thread_kind().is_none())
            .filter_map(|(pid, process)| {
                Some(ProcessInfo {
                    handle: ProcessHandle {
                        pid: pid.as_u32(),
                        start_time: to_datetime(process.start_time())?,
                    },
                    name: process.name().to_string_lossy().into_owned(),
                })
            })
            .collect()
    }
}

/// Inspector for platforms without process introspection: every answer is
/// "unknown".
pub struct UnsupportedInspector;

impl ProcessInspector for UnsupportedInspector {
    fn start_time(&self, _pid: u32) -> Option<DateTime<Utc>> {
        None
    }

    fn parent_pid(&self, _pid: u32) -> Option<u32> {
        None
    }

    fn processes(&self) -> Vec<ProcessInfo> {
        Vec::new()
    }
}
