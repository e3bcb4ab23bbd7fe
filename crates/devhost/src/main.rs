//! devhost - development application host CLI
//!
//! Exposes the devhost-core components to a terminal: process ancestry,
//! git working copy sync, debugger attachment and solution group planning.

use anyhow::{Context, Result};
use clap::Parser;
use devhost_core::DevhostConfig;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cli;
mod commands;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("devhost=info".parse()?))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => DevhostConfig::load_from(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => DevhostConfig::load().context("loading config")?,
    };

    // Ctrl-C cancels whatever is in flight
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    match cli.command {
        Commands::Ancestry { pid, json } => commands::ancestry::execute(pid, json),
        Commands::FindWorker { root_pid, exclude } => {
            commands::ancestry::find_worker(root_pid, exclude, &config)
        }
        Commands::Git(cmd) => commands::git::execute(cmd, &config, &cancel).await,
        Commands::Attach(args) => commands::attach::execute(args, &config, &cancel).await,
        Commands::Plan => commands::plan::execute(&config),
        Commands::Doctor => commands::doctor::execute(&config),
        Commands::Version => {
            println!("devhost {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
