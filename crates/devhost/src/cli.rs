//! CLI argument definitions using clap derive macros.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Development application host
///
/// Inspect processes, sync the working copy and attach debuggers.
#[derive(Parser, Debug)]
#[command(name = "devhost")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (overrides DEVHOST_CONFIG and the default location)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the verified parent chain of a process
    Ancestry {
        /// Process to start from
        pid: u32,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Find the first descendant of a launcher that is not itself a launcher
    FindWorker {
        /// Launcher pid
        root_pid: u32,

        /// Process names to skip (defaults to the configured launcher names)
        #[arg(long = "exclude", value_delimiter = ',')]
        exclude: Vec<String>,
    },

    /// Working copy sync
    #[command(subcommand)]
    Git(GitCommand),

    /// Attach a debugger to a resource
    Attach(AttachArgs),

    /// Show the start order implied by solution groups
    Plan,

    /// Run diagnostics
    Doctor,

    /// Show version
    Version,
}

// ─────────────────────────────────────────────────────────────────────────────
// Git Commands
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Subcommand, Debug)]
pub enum GitCommand {
    /// Fetch and report ahead/behind counts
    Status {
        /// Working copy (defaults to git.working_dir or the current directory)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Pull the current branch
    Pull {
        /// Working copy (defaults to git.working_dir or the current directory)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Attach
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct AttachArgs {
    /// Resource name
    pub resource: String,

    /// Launcher pid reported for the resource
    #[arg(long)]
    pub pid: Option<u32>,

    /// Endpoint URL published by the resource (label `http`)
    #[arg(long)]
    pub url: Option<String>,
}
