//! In-memory process table for tests.

use super::{ProcessHandle, ProcessInfo, ProcessInspector};
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Mutex;

struct Entry {
    pid: u32,
    parent: Option<u32>,
    start_time: DateTime<Utc>,
    name: String,
}

/// Process table fed by the test. Enumeration follows insertion order.
#[derive(Default)]
pub(crate) struct FakeInspector {
    entries: Mutex<Vec<Entry>>,
}

pub(crate) fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

impl FakeInspector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add a process started `started` seconds after the test epoch.
    pub(crate) fn spawn(self, pid: u32, parent: Option<u32>, started: i64, name: &str) -> Self {
        self.entries.lock().unwrap().push(Entry {
            pid,
            parent,
            start_time: at(started),
            name: name.to_string(),
        });
        self
    }

    pub(crate) fn kill(&self, pid: u32) {
        self.entries.lock().unwrap().retain(|e| e.pid != pid);
    }

    pub(crate) fn handle(&self, pid: u32) -> ProcessHandle {
        ProcessHandle {
            pid,
            start_time: self.start_time(pid).unwrap(),
        }
    }
}

impl ProcessInspector for FakeInspector {
    fn start_time(&self, pid: u32) -> Option<DateTime<Utc>> {
        let entries = self.entries.lock().unwrap();
        entries.iter().find(|e| e.pid == pid).map(|e| e.start_time)
    }

    fn parent_pid(&self, pid: u32) -> Option<u32> {
        let entries = self.entries.lock().unwrap();
        entries.iter().find(|e| e.pid == pid).and_then(|e| e.parent)
    }

    fn processes(&self) -> Vec<ProcessInfo> {
        let entries = self.entries.lock().unwrap();
        entries
            .iter()
            .map(|e| ProcessInfo {
                handle: ProcessHandle {
                    pid: e.pid,
                    start_time: e.start_time,
                },
                name: e.name.clone(),
            })
            .collect()
    }
}
