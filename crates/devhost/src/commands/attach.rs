//! Debugger attachment.

use anyhow::{bail, Result};
use colored::Colorize;
use devhost_core::commands::{CommandKind, CommandVisibility};
use devhost_core::{DevhostConfig, ResourceHost, ResourceSnapshot, RunState};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cli::AttachArgs;

/// Seed the snapshot the orchestrator would have published, then run the
/// configured strategy against it.
pub async fn execute(args: AttachArgs, config: &DevhostConfig, cancel: &CancellationToken) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let host = ResourceHost::from_config(config, &cwd);

    let snapshot = seed_snapshot(&args);
    debug!(resource = %args.resource, pid = ?args.pid, url = ?args.url, "Seeded snapshot");
    if host.command_visibility(CommandKind::Debug, &snapshot) != CommandVisibility::Enabled {
        bail!("{} is not running", args.resource);
    }

    let result = host
        .execute_command(CommandKind::Debug, &args.resource, cancel)
        .await;
    if !result.success {
        bail!(result.error_message.unwrap_or_default());
    }

    println!(
        "{}",
        format!("✓ Debugger attached to {}", args.resource).green()
    );
    Ok(())
}

fn seed_snapshot(args: &AttachArgs) -> ResourceSnapshot {
    let mut snapshot = ResourceSnapshot::new(&args.resource, RunState::Running);
    if let Some(pid) = args.pid {
        snapshot = snapshot.with_pid(pid);
    }
    if let Some(url) = &args.url {
        snapshot = snapshot.with_url("http", url);
    }
    snapshot
}
