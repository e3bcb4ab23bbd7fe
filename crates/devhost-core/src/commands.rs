//! Operator command visibility.
//!
//! Visibility is recomputed from the snapshot on every query; nothing here is
//! cached. Evaluating the debug command records the snapshot in the store,
//! which is how the store gets populated when the orchestrator only reports
//! state through visibility queries.

use crate::snapshot::ResourceSnapshotStore;
use crate::types::{ResourceSnapshot, RunState};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Commands this crate registers with the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandKind {
    Debug,
    GitPull,
}

impl CommandKind {
    pub const ALL: [CommandKind; 2] = [CommandKind::Debug, CommandKind::GitPull];

    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::Debug => "debug",
            CommandKind::GitPull => "git-pull",
        }
    }

    pub fn descriptor(&self) -> CommandDescriptor {
        match self {
            CommandKind::Debug => CommandDescriptor {
                name: self.name(),
                display_name: "Attach debugger",
                description: "Attach a debugger to the running application process",
                confirmation_message: None,
            },
            CommandKind::GitPull => CommandDescriptor {
                name: self.name(),
                display_name: "Git pull",
                description: "Pull the latest changes into the resource's working copy",
                confirmation_message: Some("Pull remote changes into the working copy?"),
            },
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CommandKind {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommandKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| crate::error::Error::Other(format!("Unknown command: {}", s)))
    }
}

/// Registration metadata for a command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandDescriptor {
    pub name: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub confirmation_message: Option<&'static str>,
}

/// How a command is presented for the current snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandVisibility {
    Enabled,
    Disabled,
    Hidden,
}

/// Maps snapshots to command visibility.
#[derive(Debug, Clone)]
pub struct CommandStateMachine {
    store: Arc<ResourceSnapshotStore>,
}

impl CommandStateMachine {
    pub fn new(store: Arc<ResourceSnapshotStore>) -> Self {
        Self { store }
    }

    pub fn visibility(&self, kind: CommandKind, snapshot: &ResourceSnapshot) -> CommandVisibility {
        match kind {
            CommandKind::Debug => self.debug_visibility(snapshot),
            CommandKind::GitPull => git_pull_visibility(snapshot),
        }
    }

    /// Enabled while running, hidden otherwise. Records `snapshot` in the store.
    pub fn debug_visibility(&self, snapshot: &ResourceSnapshot) -> CommandVisibility {
        self.store.store(&snapshot.name, Some(snapshot.clone()));

        if snapshot.run_state == RunState::Running {
            CommandVisibility::Enabled
        } else {
            CommandVisibility::Hidden
        }
    }
}

/// Pulling under a running process risks swapping binaries mid-execution, so
/// the command is only enabled while the resource is not running.
pub fn git_pull_visibility(snapshot: &ResourceSnapshot) -> CommandVisibility {
    if snapshot.run_state == RunState::Running {
        CommandVisibility::Disabled
    } else {
        CommandVisibility::Enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> (Arc<ResourceSnapshotStore>, CommandStateMachine) {
        let store = Arc::new(ResourceSnapshotStore::new());
        (store.clone(), CommandStateMachine::new(store))
    }

    #[test]
    fn test_running_resource() {
        let (_store, machine) = machine();
        let snapshot = ResourceSnapshot::new("api", RunState::Running);

        assert_eq!(
            machine.visibility(CommandKind::Debug, &snapshot),
            CommandVisibility::Enabled
        );
        assert_eq!(
            machine.visibility(CommandKind::GitPull, &snapshot),
            CommandVisibility::Disabled
        );
    }

    #[test]
    fn test_stopped_resource() {
        let (_store, machine) = machine();
        let snapshot = ResourceSnapshot::new("api", RunState::Stopped);

        assert_eq!(
            machine.visibility(CommandKind::Debug, &snapshot),
            CommandVisibility::Hidden
        );
        assert_eq!(
            machine.visibility(CommandKind::GitPull, &snapshot),
            CommandVisibility::Enabled
        );
    }

    #[test]
    fn test_other_states() {
        let (_store, machine) = machine();
        for state in [RunState::Starting, RunState::Failed, RunState::Unknown] {
            let snapshot = ResourceSnapshot::new("api", state);
            assert_eq!(machine.debug_visibility(&snapshot), CommandVisibility::Hidden);
            assert_eq!(git_pull_visibility(&snapshot), CommandVisibility::Enabled);
        }
    }

    #[test]
    fn test_debug_visibility_records_snapshot() {
        let (store, machine) = machine();
        let snapshot = ResourceSnapshot::new("api", RunState::Running).with_pid(99);

        machine.debug_visibility(&snapshot);
        assert_eq!(store.get_pid("api"), Some(99));

        // Re-evaluated, not cached
        let stopped = ResourceSnapshot::new("api", RunState::Stopped);
        assert_eq!(machine.debug_visibility(&stopped), CommandVisibility::Hidden);
        assert_eq!(store.get("api").unwrap().run_state, RunState::Stopped);
    }

    #[test]
    fn test_git_pull_visibility_leaves_store_alone() {
        let (store, machine) = machine();
        machine.visibility(CommandKind::GitPull, &ResourceSnapshot::new("api", RunState::Running));
        assert!(store.is_empty());
    }

    #[test]
    fn test_command_kind_names() {
        assert_eq!("debug".parse::<CommandKind>().unwrap(), CommandKind::Debug);
        assert_eq!("git-pull".parse::<CommandKind>().unwrap(), CommandKind::GitPull);
        assert!("deploy".parse::<CommandKind>().is_err());
        assert!(CommandKind::GitPull.descriptor().confirmation_message.is_some());
    }
}
