//! `coracle rm` — Remove a stopped container's record.

use clap::Args;
use coracle_common::config::CoracleConfig;
use coracle_runtime::container::remove_container;

/// Arguments for the `rm` command.
#[derive(Args, Debug)]
pub struct RmArgs {
    /// Container name.
    pub container: String,
}

/// Executes the `rm` command.
///
/// # Errors
///
/// Returns an error if the container is unknown or still running.
pub fn execute(args: RmArgs, config: &CoracleConfig) -> anyhow::Result<()> {
    remove_container(&config.containers_dir(), &args.container)
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    println!("{}", args.container);
    Ok(())
}
