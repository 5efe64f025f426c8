//! `coracle ps` — List recorded containers.

use clap::Args;
use coracle_common::config::CoracleConfig;
use coracle_common::types::ContainerStatus;
use coracle_runtime::record::list_containers;

/// Arguments for the `ps` command.
#[derive(Args, Debug)]
pub struct PsArgs {
    /// Show all containers (including stopped and exited).
    #[arg(short, long)]
    pub all: bool,
}

/// Executes the `ps` command.
///
/// # Errors
///
/// Returns an error if the containers directory cannot be enumerated.
pub fn execute(args: PsArgs, config: &CoracleConfig) -> anyhow::Result<()> {
    let containers =
        list_containers(&config.containers_dir()).map_err(|e| anyhow::anyhow!("{e}"))?;

    let filtered: Vec<_> = if args.all {
        containers
    } else {
        containers
            .into_iter()
            .filter(|c| c.status == ContainerStatus::Running)
            .collect()
    };

    if filtered.is_empty() {
        println!("No containers found.");
        return Ok(());
    }

    println!(
        "{:<12} {:<16} {:<8} {:<10} {:<24} {:<20}",
        "ID", "NAME", "PID", "STATUS", "COMMAND", "CREATED"
    );
    for c in &filtered {
        println!(
            "{:<12} {:<16} {:<8} {:<10} {:<24} {:<20}",
            c.id,
            c.name,
            if c.pid.is_empty() { "-" } else { c.pid.as_str() },
            c.status,
            c.command,
            c.created_time
        );
    }

    Ok(())
}
