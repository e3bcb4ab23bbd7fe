//! devhost-core - Core library for devhost
//!
//! Lifecycle visibility and control of a development-mode application launched
//! by an orchestrator:
//!
//! - **process**: Process ancestry with pid-reuse detection
//! - **snapshot**: Concurrent store of the latest resource snapshots
//! - **commands**: Operator command visibility
//! - **debugger**: Debugger attachment (URL callback or process attach)
//! - **git_sync**: Git fetch/status/pull and working copy health
//! - **scheduler**: Solution group wait-edges
//! - **host**: Session-scoped facade used by the orchestrator

pub mod commands;
pub mod config;
pub mod debugger;
pub mod error;
pub mod git_sync;
pub mod host;
pub mod process;
pub mod scheduler;
pub mod snapshot;
pub mod types;

// Re-export commonly used types
pub use config::DevhostConfig;
pub use error::{Error, Result};
pub use host::ResourceHost;
pub use snapshot::ResourceSnapshotStore;
pub use types::{CommandResult, HealthCheckResult, HealthStatus, ResourceSnapshot, RunState};
