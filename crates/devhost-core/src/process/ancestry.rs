//! Parent lookup and descendant search with pid-reuse detection.

use super::inspector::{system_inspector, ProcessHandle, ProcessInfo, ProcessInspector};
use std::sync::Arc;
use tracing::debug;

/// Upper bound on ancestry walks. Guards against cycles in a process table
/// that mutates while it is being read.
const MAX_ANCESTRY_DEPTH: usize = 512;

/// Resolves parent/child relationships between live processes.
///
/// Nothing is cached: the process tree changes continuously, so every call goes
/// back to the inspector.
#[derive(Clone)]
pub struct AncestryResolver {
    inspector: Arc<dyn ProcessInspector>,
}

impl AncestryResolver {
    pub fn new(inspector: Arc<dyn ProcessInspector>) -> Self {
        Self { inspector }
    }

    /// Resolver over the host's real process table.
    pub fn system() -> Self {
        Self::new(system_inspector())
    }

    /// Resolve a pid to a fresh handle.
    pub fn handle_of(&self, pid: u32) -> Option<ProcessHandle> {
        let start_time = self.inspector.start_time(pid)?;
        Some(ProcessHandle { pid, start_time })
    }

    /// Parent of `handle`, or `None` when it cannot be established.
    ///
    /// Returns `None` if `handle` no longer names the same process, or if the
    /// claimed parent started after it (the real parent exited and its pid was
    /// handed to an unrelated process).
    pub fn parent_of(&self, handle: &ProcessHandle) -> Option<ProcessHandle> {
        let current_start = self.inspector.start_time(handle.pid)?;
        if current_start != handle.start_time {
            debug!(pid = handle.pid, "Process identity changed since handle was taken");
            return None;
        }

        let parent_pid = self.inspector.parent_pid(handle.pid)?;
        if parent_pid == handle.pid {
            return None;
        }

        let candidate = self.handle_of(parent_pid)?;
        if candidate.start_time > handle.start_time {
            debug!(
                pid = handle.pid,
                parent_pid,
                "Parent pid was reused by a newer process"
            );
            return None;
        }

        Some(candidate)
    }

    /// Parent of a process known only by pid.
    pub fn parent_of_pid(&self, pid: u32) -> Option<ProcessHandle> {
        let handle = self.handle_of(pid)?;
        self.parent_of(&handle)
    }

    /// Chain from `pid` up to the furthest resolvable ancestor, leaf first.
    ///
    /// Empty when `pid` itself is not running.
    pub fn ancestry(&self, pid: u32) -> Vec<ProcessHandle> {
        let Some(leaf) = self.handle_of(pid) else {
            return Vec::new();
        };

        let mut chain = vec![leaf];
        let mut current = leaf;
        while chain.len() < MAX_ANCESTRY_DEPTH {
            let Some(parent) = self.parent_of(&current) else {
                break;
            };
            if chain.iter().any(|h| h.pid == parent.pid) {
                break;
            }
            chain.push(parent);
            current = parent;
        }
        chain
    }

    /// First process, in enumeration order, that descends from `root_pid` and
    /// satisfies `predicate`.
    ///
    /// If several descendants qualify, which one wins depends on the platform's
    /// enumeration order.
    pub fn find_descendant<F>(&self, root_pid: u32, predicate: F) -> Option<ProcessHandle>
    where
        F: Fn(&ProcessInfo) -> bool,
    {
        self.inspector
            .processes()
            .into_iter()
            .filter(|p| p.handle.pid != root_pid)
            .filter(|p| predicate(p))
            .find(|p| self.descends_from(&p.handle, root_pid))
            .map(|p| p.handle)
    }

    fn descends_from(&self, handle: &ProcessHandle, root_pid: u32) -> bool {
        let mut current = *handle;
        for _ in 0..MAX_ANCESTRY_DEPTH {
            match self.parent_of(&current) {
                Some(parent) if parent.pid == root_pid => return true,
                Some(parent) => current = parent,
                None => return false,
            }
        }
        false
    }
}
