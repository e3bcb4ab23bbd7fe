//! Orchestrator-facing entry point.
//!
//! One `ResourceHost` per orchestrator session. It owns the snapshot store and
//! hands it to the components that need it:
//!
//! ```text
//! state change ──► ResourceSnapshotStore ──► CommandStateMachine (visibility)
//!                          │
//! command ─────────────────┴──► DebuggerAttachment / GitSyncEngine ──► result
//!
//! registration ──► SolutionGroupScheduler (once, before anything runs)
//! ```

use crate::commands::{CommandKind, CommandStateMachine, CommandVisibility};
use crate::config::DevhostConfig;
use crate::debugger::DebuggerAttachment;
use crate::error::{Error, Result};
use crate::git_sync::GitSyncEngine;
use crate::process::AncestryResolver;
use crate::scheduler::SolutionGroupScheduler;
use crate::snapshot::ResourceSnapshotStore;
use crate::types::{CommandResult, HealthCheckResult, ResourceSnapshot};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Session-scoped facade over the core components.
pub struct ResourceHost {
    store: Arc<ResourceSnapshotStore>,
    commands: CommandStateMachine,
    debugger: DebuggerAttachment,
    git: GitSyncEngine,
    scheduler: Mutex<SolutionGroupScheduler>,
}

impl ResourceHost {
    pub fn new(resolver: AncestryResolver, git: GitSyncEngine, config: &DevhostConfig) -> Self {
        let store = Arc::new(ResourceSnapshotStore::new());
        Self {
            commands: CommandStateMachine::new(Arc::clone(&store)),
            debugger: DebuggerAttachment::new(
                Arc::clone(&store),
                resolver,
                config.debugger.clone(),
            ),
            git,
            scheduler: Mutex::new(SolutionGroupScheduler::new()),
            store,
        }
    }

    /// Host for `config` over the real process table, syncing `default_dir`
    /// unless the config names a working copy.
    pub fn from_config(config: &DevhostConfig, default_dir: &Path) -> Self {
        Self::new(
            AncestryResolver::system(),
            GitSyncEngine::from_config(&config.git, default_dir),
            config,
        )
    }

    pub fn store(&self) -> &Arc<ResourceSnapshotStore> {
        &self.store
    }

    /// State-change notification. `None` tears the resource down.
    pub fn on_state_change(&self, name: &str, snapshot: Option<ResourceSnapshot>) {
        self.store.store(name, snapshot);
    }

    pub fn command_visibility(&self, kind: CommandKind, snapshot: &ResourceSnapshot) -> CommandVisibility {
        self.commands.visibility(kind, snapshot)
    }

    pub async fn execute_command(
        &self,
        kind: CommandKind,
        name: &str,
        cancel: &CancellationToken,
    ) -> CommandResult {
        info!(command = %kind, resource = %name, "Executing command");
        match kind {
            CommandKind::Debug => self.debugger.attach(name, cancel).await,
            CommandKind::GitPull => self.git.pull(cancel).await,
        }
    }

    pub async fn check_health(&self, cancel: &CancellationToken) -> HealthCheckResult {
        self.git.fetch_and_check_status(cancel).await
    }

    /// Register a resource, returning the group peers it must wait for.
    pub fn register_resource(&self, name: &str, group: Option<&str>) -> Result<Vec<String>> {
        let mut scheduler = self
            .scheduler
            .lock()
            .map_err(|_| Error::Other("Scheduler lock poisoned".into()))?;
        scheduler.register(name, group)
    }
}
