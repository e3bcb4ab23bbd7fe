//! Working copy sync commands.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use devhost_core::git_sync::GitSyncEngine;
use devhost_core::{DevhostConfig, HealthStatus};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use crate::cli::GitCommand;

pub async fn execute(cmd: GitCommand, config: &DevhostConfig, cancel: &CancellationToken) -> Result<()> {
    match cmd {
        GitCommand::Status { dir } => status(engine(config, dir)?, cancel).await,
        GitCommand::Pull { dir } => pull(engine(config, dir)?, cancel).await,
    }
}

/// An explicit `--dir` wins over `git.working_dir`, which wins over the cwd.
fn engine(config: &DevhostConfig, dir: Option<PathBuf>) -> Result<GitSyncEngine> {
    match dir {
        Some(dir) => Ok(GitSyncEngine::new(dir).with_program(&config.git.program)),
        None => {
            let cwd = std::env::current_dir().context("reading current directory")?;
            Ok(GitSyncEngine::from_config(&config.git, &cwd))
        }
    }
}

async fn status(engine: GitSyncEngine, cancel: &CancellationToken) -> Result<()> {
    println!(
        "{}",
        format!("Working copy: {}", engine.working_dir().display()).cyan().bold()
    );
    println!("{}", "─".repeat(50));

    let (health, counts) = engine.fetch_and_status(cancel).await;
    let verdict = match health.status {
        HealthStatus::Healthy => "✓ up to date".green(),
        HealthStatus::Unhealthy => format!("✗ {}", health.description.as_deref().unwrap_or("unhealthy")).red(),
        HealthStatus::Unknown => format!("○ {}", health.description.as_deref().unwrap_or("unknown")).yellow(),
    };
    println!("  Health: {}", verdict);

    match counts {
        Some(counts) if counts.has_remote_branch => {
            println!("  Ahead:  {}", counts.ahead);
            println!("  Behind: {}", counts.behind);
        }
        Some(_) => println!("  Upstream: {}", "none".yellow()),
        None => {}
    }

    Ok(())
}

async fn pull(engine: GitSyncEngine, cancel: &CancellationToken) -> Result<()> {
    let result = engine.pull(cancel).await;
    let message = result.error_message.unwrap_or_default();

    if !result.success {
        bail!(message);
    }

    println!("{}", "✓ Pulled".green());
    if !message.is_empty() {
        for line in message.lines() {
            println!("  {}", line.dimmed());
        }
    }
    Ok(())
}
