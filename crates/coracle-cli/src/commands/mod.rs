//! CLI command definitions and dispatch.

pub mod init;
pub mod logs;
pub mod ps;
pub mod rm;
pub mod run;
pub mod stop;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use coracle_common::config::CoracleConfig;

/// Coracle — daemon-less minimal container runtime.
#[derive(Parser, Debug)]
#[command(name = "coracle", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Base directory for runtime state.
    #[arg(long, global = true)]
    pub run_dir: Option<PathBuf>,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Launch a container process.
    Run(run::RunArgs),
    /// Internal container init entry point (invoked via /proc/self/exe).
    #[command(hide = true)]
    Init(init::InitArgs),
    /// List recorded containers.
    Ps(ps::PsArgs),
    /// View a container's log.
    Logs(logs::LogsArgs),
    /// Stop a running container.
    Stop(stop::StopArgs),
    /// Remove a stopped container's record.
    Rm(rm::RmArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = cli
        .run_dir
        .map_or_else(CoracleConfig::default, CoracleConfig::with_run_dir);
    match cli.command {
        Command::Run(args) => run::execute(args, &config),
        Command::Init(args) => init::execute(args),
        Command::Ps(args) => ps::execute(args, &config),
        Command::Logs(args) => logs::execute(args, &config),
        Command::Stop(args) => stop::execute(args, &config),
        Command::Rm(args) => rm::execute(args, &config),
    }
}
