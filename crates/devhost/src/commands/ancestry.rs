//! Process ancestry inspection.

use anyhow::{bail, Result};
use colored::Colorize;
use devhost_core::config::{DebuggerConfig, DevhostConfig};
use devhost_core::debugger::is_launcher;
use devhost_core::process::{AncestryResolver, ProcessHandle};

pub fn execute(pid: u32, json: bool) -> Result<()> {
    let resolver = AncestryResolver::system();
    let chain = resolver.ancestry(pid);
    if chain.is_empty() {
        bail!("process {} is not running", pid);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&chain)?);
        return Ok(());
    }

    println!("{}", format!("Ancestry of {}", pid).cyan().bold());
    println!("{}", "─".repeat(50));
    for (depth, handle) in chain.iter().enumerate() {
        print_handle(depth, handle);
    }
    Ok(())
}

pub fn find_worker(root_pid: u32, exclude: Vec<String>, config: &DevhostConfig) -> Result<()> {
    let exclude = if exclude.is_empty() {
        configured_launchers(config)
    } else {
        exclude
    };

    let resolver = AncestryResolver::system();
    match resolver.find_descendant(root_pid, |p| !is_launcher(p, &exclude)) {
        Some(worker) => {
            println!("{}", worker.pid);
            Ok(())
        }
        None => bail!(devhost_core::Error::NoChildProcessFound),
    }
}

fn configured_launchers(config: &DevhostConfig) -> Vec<String> {
    match &config.debugger {
        DebuggerConfig::Attach {
            launcher_process_names,
            ..
        } => launcher_process_names.clone(),
        DebuggerConfig::Url { .. } => Vec::new(),
    }
}

fn print_handle(depth: usize, handle: &ProcessHandle) {
    let marker = if depth == 0 { "●" } else { "↑" };
    println!(
        "  {}{} {}  {}",
        "  ".repeat(depth),
        marker,
        handle.pid.to_string().bold(),
        handle.start_time.format("%Y-%m-%d %H:%M:%S").to_string().dimmed()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_launchers_follow_strategy() {
        let config = DevhostConfig::default();
        assert_eq!(configured_launchers(&config), vec!["dotnet"]);

        let config = DevhostConfig {
            debugger: DebuggerConfig::Url {
                path: "/debug".into(),
            },
            ..Default::default()
        };
        assert!(configured_launchers(&config).is_empty());
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_ancestry_of_self_succeeds() {
        assert!(execute(std::process::id(), true).is_ok());
    }
}
