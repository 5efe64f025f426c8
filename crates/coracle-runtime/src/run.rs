//! The orchestration sequence behind `coracle run`.
//!
//! Composes the launcher, cgroup manager, and metadata recorder:
//! spawn, enlist the pid into the resource controllers, record metadata,
//! then release the command so user code never runs un-enlisted.

use coracle_common::config::CoracleConfig;
use coracle_common::error::{CoracleError, Result};
use coracle_common::types::ResourceLimits;
use coracle_core::cgroup::CgroupManager;

use std::path::Path;

use crate::launcher::{InitPipe, new_parent_process};
use crate::record;

/// Everything a single `run` invocation needs.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Attached mode: block on the container and clean up its record when
    /// it exits. Detached containers return immediately.
    pub tty: bool,
    /// Command line to hand to the container init process.
    pub argv: Vec<String>,
    /// Resource limits for the container's cgroup.
    pub limits: ResourceLimits,
    /// User-supplied container name; empty means the default placeholder.
    pub name: Option<String>,
    /// Image the rootfs collaborator assembles the container from.
    pub image: String,
    /// Optional volume specification for the rootfs collaborator.
    pub volume: Option<String>,
}

/// Launches one container to completion (attached) or to hand-off
/// (detached).
///
/// The cgroup is destroyed on every exit path; limit failures degrade to
/// warnings so the container still runs, just less constrained.
///
/// # Errors
///
/// Returns an error on setup or metadata persistence failure. The
/// container process itself may already be running when a later step
/// fails; it is not reaped here.
pub fn run_container(config: &CoracleConfig, opts: RunOptions) -> Result<()> {
    if opts.argv.is_empty() {
        return Err(CoracleError::Config {
            message: "no container command given".into(),
        });
    }

    let containers_dir = config.containers_dir();
    // Resolve the effective name up front so the detached log file and the
    // metadata record land in the same directory.
    let name = opts
        .name
        .clone()
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| coracle_common::constants::DEFAULT_CONTAINER_NAME.to_string());

    let (mut parent, init_pipe) = new_parent_process(
        opts.tty,
        &name,
        &opts.image,
        opts.volume.as_deref(),
        &containers_dir,
    )?;
    let pid = parent.start()?;
    let raw_pid = u32::try_from(pid.as_raw()).map_err(|_| CoracleError::Setup {
        message: format!("clone returned invalid pid {pid}"),
    })?;
    tracing::info!(
        pid = raw_pid,
        image = parent.image(),
        volume = ?parent.volume(),
        tty = opts.tty,
        "container process started"
    );

    // Dropped (and therefore destroyed) on every exit path below.
    let cgroup = CgroupManager::new(&config.cgroup_name);
    let limits = if opts.limits.is_empty() {
        config.default_limits.clone()
    } else {
        opts.limits.clone()
    };
    for failure in cgroup.set(&limits) {
        tracing::warn!(%failure, "resource limit not applied");
    }
    for failure in cgroup.apply(raw_pid) {
        tracing::warn!(%failure, "cgroup enlistment incomplete");
    }

    let name = record::record_container_info(&containers_dir, raw_pid, &opts.argv, &name)?;

    // Limits and metadata are in place: release the command.
    release_command(&containers_dir, &name, init_pipe, &opts.argv)?;

    if opts.tty {
        // The record comes down whether or not the wait itself succeeds.
        let waited = parent.wait();
        record::delete_container_info(&containers_dir, &name);
        let code = waited?;
        tracing::info!(name = %name, code, "container exited");
    }
    Ok(())
}

/// Delivers the startup command, tearing the just-written metadata record
/// (and with it the detached log directory) back down if delivery fails,
/// so no half-launched container stays recorded.
fn release_command(
    containers_dir: &Path,
    name: &str,
    init_pipe: InitPipe,
    argv: &[String],
) -> Result<()> {
    if let Err(e) = init_pipe.send_command(argv) {
        record::delete_container_info(containers_dir, name);
        return Err(e);
    }
    Ok(())
}
