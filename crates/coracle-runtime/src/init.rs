//! In-container init entry point.
//!
//! Runs as PID 1 inside the fresh namespaces after the parent execs
//! `/proc/self/exe init`. Performs the remaining in-namespace setup,
//! receives the user command over the one-shot pipe, and execs it —
//! replacing itself, so the user command becomes the container's PID 1.

use std::ffi::CString;
use std::io::Read;
use std::os::fd::FromRawFd;

use coracle_common::error::{CoracleError, Result};

use crate::launcher::INIT_PIPE_FD;

/// Completes container setup and hands control to the user command.
///
/// # Errors
///
/// Returns an error if the command pipe is empty or unreadable, mount
/// setup fails, or the command cannot be resolved or exec'd. On success
/// this function never returns.
pub fn init_container() -> Result<()> {
    let argv = read_init_command()?;
    tracing::info!(command = %argv.join(" "), "init received command");

    coracle_core::mount::make_mounts_private()?;
    coracle_core::mount::mount_proc()?;

    let exe = which::which(&argv[0]).map_err(|_| CoracleError::NotFound {
        kind: "executable",
        id: argv[0].clone(),
    })?;

    let c_exe = CString::new(exe.to_string_lossy().into_owned()).map_err(|_| {
        CoracleError::Config {
            message: format!("command path contains NUL: {}", exe.display()),
        }
    })?;
    let c_argv = argv
        .iter()
        .map(|arg| CString::new(arg.as_str()))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| CoracleError::Config {
            message: "command argument contains NUL".into(),
        })?;

    // Replaces this process; only returns on failure.
    let _ = nix::unistd::execv(&c_exe, &c_argv).map_err(|e| CoracleError::Setup {
        message: format!("exec of {} failed: {e}", exe.display()),
    })?;
    Ok(())
}

/// Reads the whole one-shot command message from fd 3 and splits it into
/// an argument vector.
fn read_init_command() -> Result<Vec<String>> {
    // SAFETY: the parent dup2'ed the pipe read end onto INIT_PIPE_FD
    // before exec; this process owns it exclusively.
    let mut pipe = unsafe { std::fs::File::from_raw_fd(INIT_PIPE_FD) };
    let mut message = String::new();
    let _ = pipe
        .read_to_string(&mut message)
        .map_err(|e| CoracleError::Setup {
            message: format!("reading init pipe failed: {e}"),
        })?;

    let argv: Vec<String> = message.split_whitespace().map(str::to_string).collect();
    if argv.is_empty() {
        return Err(CoracleError::Setup {
            message: "init pipe delivered no command".into(),
        });
    }
    Ok(argv)
}
