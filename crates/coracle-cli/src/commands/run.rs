//! `coracle run` — Launch a container.

use clap::Args;
use coracle_common::config::CoracleConfig;
use coracle_common::types::ResourceLimits;
use coracle_runtime::run::{RunOptions, run_container};

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Run detached: return immediately instead of waiting.
    #[arg(short, long)]
    pub detach: bool,

    /// Memory limit, e.g. "128MiB" or "256MB".
    #[arg(short = 'm', long)]
    pub memory: Option<String>,

    /// CPU shares (relative weight under contention).
    #[arg(long = "cpushare")]
    pub cpu_shares: Option<u64>,

    /// CPU cores the container may run on, e.g. "0-1,3".
    #[arg(long = "cpuset")]
    pub cpuset: Option<String>,

    /// Volume specification for the rootfs collaborator (host:container).
    #[arg(short = 'v', long)]
    pub volume: Option<String>,

    /// Container name; defaults to a placeholder when omitted.
    #[arg(long)]
    pub name: Option<String>,

    /// Image to launch the container from.
    pub image: String,

    /// Command to run inside the container.
    #[arg(required = true, trailing_var_arg = true)]
    pub command: Vec<String>,
}

/// Executes the `run` command.
///
/// # Errors
///
/// Returns an error if a limit string is malformed or the launch fails.
pub fn execute(args: RunArgs, config: &CoracleConfig) -> anyhow::Result<()> {
    let memory_bytes = match args.memory.as_deref() {
        None => None,
        Some(s) => Some(
            parse_memory(s).ok_or_else(|| anyhow::anyhow!("invalid memory limit: {s}"))?,
        ),
    };

    let opts = RunOptions {
        tty: !args.detach,
        argv: args.command,
        limits: ResourceLimits {
            memory_bytes,
            cpu_shares: args.cpu_shares,
            cpuset_cpus: args.cpuset,
        },
        name: args.name,
        image: args.image,
        volume: args.volume,
    };

    run_container(config, opts).map_err(|e| anyhow::anyhow!("{e}"))
}

/// Parses memory strings like "128MiB", "256MB", "1g", or "1048576" into
/// bytes.
#[allow(clippy::option_if_let_else)]
fn parse_memory(s: &str) -> Option<u64> {
    let s = s.trim();
    let (num_str, multiplier) = if let Some(n) = s.strip_suffix("GiB") {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = s.strip_suffix("GB") {
        (n, 1_000_000_000)
    } else if let Some(n) = s.strip_suffix("MiB") {
        (n, 1024 * 1024)
    } else if let Some(n) = s.strip_suffix("MB") {
        (n, 1_000_000)
    } else if let Some(n) = s.strip_suffix("KiB") {
        (n, 1024)
    } else if let Some(n) = s.strip_suffix("KB") {
        (n, 1000)
    } else if let Some(n) = s.strip_suffix(['g', 'G']) {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = s.strip_suffix(['m', 'M']) {
        (n, 1024 * 1024)
    } else if let Some(n) = s.strip_suffix(['k', 'K']) {
        (n, 1024)
    } else {
        (s, 1)
    };
    num_str.trim().parse::<u64>().ok().map(|n| n * multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_memory_mib() {
        assert_eq!(parse_memory("128MiB"), Some(128 * 1024 * 1024));
    }

    #[test]
    fn parse_memory_docker_style_suffix() {
        assert_eq!(parse_memory("100m"), Some(100 * 1024 * 1024));
        assert_eq!(parse_memory("1g"), Some(1024 * 1024 * 1024));
    }

    #[test]
    fn parse_memory_plain_bytes() {
        assert_eq!(parse_memory("1048576"), Some(1_048_576));
    }

    #[test]
    fn parse_memory_invalid() {
        assert_eq!(parse_memory("abc"), None);
    }
}
