//! Diagnostics command.

use anyhow::Result;
use colored::Colorize;
use devhost_core::config::{DebuggerConfig, DevhostConfig};

pub fn execute(config: &DevhostConfig) -> Result<()> {
    println!("{}", "devhost Doctor".cyan().bold());
    println!("{}", "─".repeat(50));
    println!();

    let mut issues = Vec::new();

    // Check git
    print!("  git ({}): ", config.git.program);
    match which::which(&config.git.program) {
        Ok(path) => println!("{}", format!("✓ {}", path.display()).green()),
        Err(_) => {
            println!("{}", "✗ not found".red());
            issues.push(format!("{} is not on PATH", config.git.program));
        }
    }

    // Check working copy
    if let Some(dir) = &config.git.working_dir {
        print!("  Working copy: ");
        if dir.join(".git").exists() {
            println!("{}", "✓ repository".green());
        } else {
            println!("{}", "✗ not a git repository".red());
            issues.push(format!("{} is not a git repository", dir.display()));
        }
    }

    // Check debugger
    match &config.debugger {
        DebuggerConfig::Url { path } => {
            println!("  Debugger: {}", format!("url strategy ({})", path).green());
        }
        DebuggerConfig::Attach { program, .. } => {
            print!("  Debugger ({}): ", program);
            match which::which(program) {
                Ok(_) => println!("{}", "✓ installed".green()),
                Err(_) => {
                    println!("{}", "✗ not found".red());
                    issues.push(format!("debugger {} is not installed", program));
                }
            }
        }
    }

    // Check process introspection
    print!("  Process introspection: ");
    if sysinfo_supported() {
        println!("{}", "✓ supported".green());
    } else {
        println!("{}", "○ unsupported (debug attach disabled)".yellow());
    }

    // Check config file
    print!("  Config file: ");
    let config_path = DevhostConfig::config_path();
    if config_path.exists() {
        println!("{}", "✓ exists".green());
    } else {
        println!("{}", "○ not found (using defaults)".yellow());
    }

    // Summary
    println!();
    if issues.is_empty() {
        println!("{}", "✓ All checks passed".green().bold());
    } else {
        println!("{}", format!("✗ {} issue(s) found:", issues.len()).red().bold());
        for issue in &issues {
            println!("  • {}", issue);
        }
    }

    Ok(())
}

fn sysinfo_supported() -> bool {
    devhost_core::process::AncestryResolver::system()
        .handle_of(std::process::id())
        .is_some()
}
