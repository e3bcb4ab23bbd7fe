//! Solution group start plan.

use anyhow::Result;
use colored::Colorize;
use devhost_core::scheduler::SolutionGroupScheduler;
use devhost_core::DevhostConfig;

pub fn execute(config: &DevhostConfig) -> Result<()> {
    if config.resources.is_empty() {
        println!("{}", "No resources configured".yellow());
        return Ok(());
    }

    let scheduler = build(config)?;

    println!("{}", "Start plan".cyan().bold());
    println!("{}", "─".repeat(50));
    for name in scheduler.registered() {
        let waits = scheduler.waits_for(name);
        if waits.is_empty() {
            println!("  {}", name.bold());
        } else {
            println!("  {} {} {}", name.bold(), "waits for".dimmed(), waits.join(", "));
        }
    }
    Ok(())
}

fn build(config: &DevhostConfig) -> Result<SolutionGroupScheduler> {
    let mut scheduler = SolutionGroupScheduler::new();
    for entry in &config.resources {
        scheduler.register(&entry.name, entry.solution_group.as_deref())?;
    }
    Ok(scheduler)
}
