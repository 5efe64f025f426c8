//! # coracle — Coracle CLI
//!
//! Daemon-less minimal container runtime. Single binary for launching,
//! listing, and managing isolated processes.

mod commands;

use clap::Parser;

use crate::commands::Cli;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    commands::execute(cli)
}
