//! Stop and removal tooling for recorded containers.
//!
//! The run path only ever writes RUNNING records; these operations own the
//! transitions to STOPPED and the final removal of detached containers.

use std::path::Path;

use coracle_common::error::{CoracleError, Result};
use coracle_common::types::ContainerStatus;
use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;

use crate::record::{delete_container_info, get_container_record, write_record};

/// Stops a recorded container: SIGTERMs its pid and rewrites the record
/// as STOPPED with the pid cleared.
///
/// A pid that no longer exists is treated as already stopped.
///
/// # Errors
///
/// Returns an error if the record is missing or corrupt, the pid cannot
/// be parsed, signalling is denied, or the rewrite fails.
pub fn stop_container(root: &Path, name: &str) -> Result<()> {
    let mut record = get_container_record(root, name)?;

    if record.status == ContainerStatus::Running && !record.pid.is_empty() {
        let pid: i32 = record.pid.parse().map_err(|_| CoracleError::Config {
            message: format!("container {name} has invalid pid {:?}", record.pid),
        })?;
        match kill(Pid::from_raw(pid), Signal::SIGTERM) {
            Ok(()) => tracing::info!(name, pid, "sent SIGTERM"),
            Err(Errno::ESRCH) => tracing::info!(name, pid, "process already gone"),
            Err(e) => {
                return Err(CoracleError::PermissionDenied {
                    message: format!("signalling container {name} (pid {pid}) failed: {e}"),
                });
            }
        }
    }

    record.status = ContainerStatus::Stopped;
    record.pid = String::new();
    write_record(root, &record)?;
    tracing::info!(name, "container stopped");
    Ok(())
}

/// Removes the record of a container that is not running.
///
/// # Errors
///
/// Returns an error if the record is missing or the container is still
/// RUNNING (it must be stopped first).
pub fn remove_container(root: &Path, name: &str) -> Result<()> {
    let record = get_container_record(root, name)?;
    if record.status == ContainerStatus::Running {
        return Err(CoracleError::Config {
            message: format!("container {name} is running; stop it before removal"),
        });
    }
    delete_container_info(root, name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::record_container_info;

    #[test]
    fn stop_kills_the_recorded_process() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut child = std::process::Command::new("sleep")
            .arg("30")
            .spawn()
            .expect("spawn sleep");
        let name = record_container_info(dir.path(), child.id(), &["sleep".into(), "30".into()], "sleeper")
            .expect("record");

        stop_container(dir.path(), &name).expect("stop");

        let status = child.wait().expect("wait");
        assert!(!status.success(), "child should die from the signal");

        let record = get_container_record(dir.path(), &name).expect("reload");
        assert_eq!(record.status, ContainerStatus::Stopped);
        assert!(record.pid.is_empty());
    }

    #[test]
    fn stop_of_unknown_container_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = stop_container(dir.path(), "phantom").expect_err("missing");
        assert!(matches!(err, CoracleError::NotFound { .. }));
    }

    #[test]
    fn remove_refuses_running_containers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let name = record_container_info(dir.path(), 123_456, &["sh".into()], "busy")
            .expect("record");
        let err = remove_container(dir.path(), &name).expect_err("still running");
        assert!(matches!(err, CoracleError::Config { .. }));
    }

    #[test]
    fn remove_deletes_stopped_containers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut child = std::process::Command::new("sleep")
            .arg("30")
            .spawn()
            .expect("spawn sleep");
        let name = record_container_info(dir.path(), child.id(), &["sleep".into(), "30".into()], "done")
            .expect("record");
        stop_container(dir.path(), &name).expect("stop");
        let _ = child.wait();

        remove_container(dir.path(), &name).expect("remove");
        assert!(matches!(
            get_container_record(dir.path(), &name),
            Err(CoracleError::NotFound { .. })
        ));
    }
}
