//! `coracle init` — Hidden in-container entry point.
//!
//! Never invoked by users directly: the launcher execs
//! `/proc/self/exe init` inside the fresh namespaces.

use clap::Args;

/// Arguments for the `init` command (none).
#[derive(Args, Debug)]
pub struct InitArgs {}

/// Executes the `init` command.
///
/// # Errors
///
/// Returns an error if in-namespace setup or the final exec fails; on
/// success this never returns.
pub fn execute(_args: InitArgs) -> anyhow::Result<()> {
    coracle_runtime::init::init_container().map_err(|e| anyhow::anyhow!("{e}"))
}
