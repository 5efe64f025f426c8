//! `coracle stop` — Stop a running container.

use clap::Args;
use coracle_common::config::CoracleConfig;
use coracle_runtime::container::stop_container;

/// Arguments for the `stop` command.
#[derive(Args, Debug)]
pub struct StopArgs {
    /// Container name.
    pub container: String,
}

/// Executes the `stop` command.
///
/// # Errors
///
/// Returns an error if the container is unknown or cannot be signalled.
pub fn execute(args: StopArgs, config: &CoracleConfig) -> anyhow::Result<()> {
    stop_container(&config.containers_dir(), &args.container)
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    println!("{}", args.container);
    Ok(())
}
