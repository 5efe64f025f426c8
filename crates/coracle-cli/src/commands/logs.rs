//! `coracle logs` — View a container's log.

use clap::Args;
use coracle_common::config::CoracleConfig;
use coracle_runtime::logs::read_container_log;

/// Arguments for the `logs` command.
#[derive(Args, Debug)]
pub struct LogsArgs {
    /// Container name.
    pub container: String,
}

/// Executes the `logs` command.
///
/// # Errors
///
/// Returns an error if the container has no log file.
pub fn execute(args: LogsArgs, config: &CoracleConfig) -> anyhow::Result<()> {
    let content = read_container_log(&config.containers_dir(), &args.container)
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    print!("{content}");
    Ok(())
}
