//! Mount setup performed by the container init process.
//!
//! Runs inside the freshly created mount namespace, before the user
//! command is executed.

use coracle_common::error::{CoracleError, Result};

/// Marks the whole mount tree private so mounts made inside the container
/// do not propagate back to the host.
///
/// Required on hosts where `/` is mounted shared (systemd default).
///
/// # Errors
///
/// Returns an error if the `mount(2)` propagation change fails.
#[cfg(target_os = "linux")]
pub fn make_mounts_private() -> Result<()> {
    use nix::mount::{MsFlags, mount};

    mount(
        None::<&str>,
        "/",
        None::<&str>,
        MsFlags::MS_PRIVATE | MsFlags::MS_REC,
        None::<&str>,
    )
    .map_err(|e| CoracleError::Setup {
        message: format!("making mounts private failed: {e}"),
    })?;
    tracing::debug!("mount propagation set to private");
    Ok(())
}

/// Mounts a fresh `/proc` so process inspection inside the container sees
/// only the container's own PID namespace.
///
/// # Errors
///
/// Returns an error if the `mount(2)` syscall fails.
#[cfg(target_os = "linux")]
pub fn mount_proc() -> Result<()> {
    use nix::mount::{MsFlags, mount};

    mount(
        Some("proc"),
        "/proc",
        Some("proc"),
        MsFlags::MS_NOEXEC | MsFlags::MS_NOSUID | MsFlags::MS_NODEV,
        None::<&str>,
    )
    .map_err(|e| CoracleError::Setup {
        message: format!("mounting /proc failed: {e}"),
    })?;
    tracing::debug!("/proc mounted");
    Ok(())
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error — mount namespaces require Linux.
#[cfg(not(target_os = "linux"))]
pub fn make_mounts_private() -> Result<()> {
    Err(CoracleError::Config {
        message: "Linux required for native container operations".into(),
    })
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error — mount namespaces require Linux.
#[cfg(not(target_os = "linux"))]
pub fn mount_proc() -> Result<()> {
    Err(CoracleError::Config {
        message: "Linux required for native container operations".into(),
    })
}
