//! Cgroup v1 resource management.
//!
//! Each controller of interest (memory, cpu, cpuset) lives in its own
//! hierarchy mounted somewhere under `/sys/fs/cgroup`; the mount point is
//! discovered from `/proc/self/mountinfo`. A [`CgroupManager`] owns one
//! named group across all controllers and enlists container processes
//! into it.

pub mod cpu;
pub mod cpuset;
pub mod memory;

use std::fmt;
use std::fs;
use std::path::PathBuf;

use coracle_common::error::{CoracleError, Result};
use coracle_common::types::ResourceLimits;

/// One resource controller within its own cgroup hierarchy.
///
/// Implementations write the controller-specific limit files and enlist
/// process ids into the controller's `tasks` file.
pub trait Controller {
    /// Kernel name of the controller, e.g. `"memory"`.
    fn name(&self) -> &'static str;

    /// Writes this controller's limit files for the given group.
    ///
    /// # Errors
    ///
    /// Returns an error if the hierarchy is not mounted or a control file
    /// cannot be written.
    fn set(&self, group: &str, limits: &ResourceLimits) -> Result<()>;

    /// Adds a process to this controller's group.
    ///
    /// # Errors
    ///
    /// Returns an error if the `tasks` file cannot be written.
    fn apply(&self, group: &str, pid: u32) -> Result<()>;

    /// Removes this controller's group directory. A group that was never
    /// created (or was already removed) is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be removed.
    fn remove(&self, group: &str) -> Result<()>;
}

/// A single controller's failure during `set` or `apply`.
///
/// Limit application is accumulate-and-report rather than fail-fast:
/// partial resource control is strictly better than an unconstrained
/// container, so callers log these and continue.
#[derive(Debug)]
pub struct LimitFailure {
    /// Controller that failed.
    pub controller: &'static str,
    /// Underlying error.
    pub error: CoracleError,
}

impl fmt::Display for LimitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} controller: {}", self.controller, self.error)
    }
}

/// Handle to one named group spanning the memory, cpu, and cpuset
/// hierarchies.
pub struct CgroupManager {
    group: String,
    controllers: Vec<Box<dyn Controller>>,
}

impl fmt::Debug for CgroupManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CgroupManager")
            .field("group", &self.group)
            .finish_non_exhaustive()
    }
}

impl CgroupManager {
    /// Creates a manager for the given group name.
    ///
    /// Directories are created lazily on the first limit or task write,
    /// so constructing a manager for a group that already exists is fine.
    #[must_use]
    pub fn new(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            controllers: vec![
                Box::new(memory::MemoryController),
                Box::new(cpu::CpuController),
                Box::new(cpuset::CpusetController),
            ],
        }
    }

    /// Returns the group name this manager controls.
    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Writes every configured limit, one controller at a time.
    ///
    /// Failures are accumulated and returned instead of aborting, so the
    /// remaining controllers still get their limits.
    pub fn set(&self, limits: &ResourceLimits) -> Vec<LimitFailure> {
        let mut failures = Vec::new();
        for controller in &self.controllers {
            if let Err(error) = controller.set(&self.group, limits) {
                failures.push(LimitFailure {
                    controller: controller.name(),
                    error,
                });
            }
        }
        failures
    }

    /// Enlists a process into every controller's group.
    ///
    /// Must be called as soon as possible after the process is spawned and
    /// strictly before it starts executing user code. Same
    /// accumulate-and-report policy as [`Self::set`].
    pub fn apply(&self, pid: u32) -> Vec<LimitFailure> {
        let mut failures = Vec::new();
        for controller in &self.controllers {
            if let Err(error) = controller.apply(&self.group, pid) {
                failures.push(LimitFailure {
                    controller: controller.name(),
                    error,
                });
            }
        }
        failures
    }

    /// Removes the group directory in every controller hierarchy.
    ///
    /// Missing hierarchies and already-removed groups are skipped, so
    /// calling this twice in a row succeeds.
    ///
    /// # Errors
    ///
    /// Returns the last removal error after attempting every controller.
    pub fn destroy(&self) -> Result<()> {
        let mut last_err = None;
        for controller in &self.controllers {
            if let Err(error) = controller.remove(&self.group) {
                tracing::warn!(controller = controller.name(), %error, "cgroup removal failed");
                last_err = Some(error);
            }
        }
        tracing::debug!(group = %self.group, "cgroup destroyed");
        last_err.map_or(Ok(()), Err)
    }
}

impl Drop for CgroupManager {
    /// Best-effort destroy so every exit path of an orchestration run
    /// releases the kernel cgroup objects.
    fn drop(&mut self) {
        let _ = self.destroy();
    }
}

/// Parses one `/proc/self/mountinfo` line, returning the mount point if it
/// is a v1 cgroup hierarchy carrying the given controller.
fn parse_hierarchy_line(line: &str, controller: &str) -> Option<PathBuf> {
    let (mount_fields, fs_fields) = line.split_once(" - ")?;
    let mut fs_parts = fs_fields.split_whitespace();
    if fs_parts.next()? != "cgroup" {
        return None;
    }
    let _source = fs_parts.next()?;
    let super_opts = fs_parts.next()?;
    if !super_opts.split(',').any(|opt| opt == controller) {
        return None;
    }
    mount_fields.split_whitespace().nth(4).map(PathBuf::from)
}

/// Finds the hierarchy mount point for a controller.
fn find_hierarchy_mount(controller: &str) -> Option<PathBuf> {
    let info = fs::read_to_string("/proc/self/mountinfo").ok()?;
    info.lines()
        .find_map(|line| parse_hierarchy_line(line, controller))
}

/// Resolves (and optionally creates) `<hierarchy>/<group>` for a controller.
fn controller_dir(controller: &str, group: &str, create: bool) -> Result<PathBuf> {
    let mount = find_hierarchy_mount(controller).ok_or_else(|| CoracleError::NotFound {
        kind: "cgroup hierarchy",
        id: controller.to_string(),
    })?;
    let dir = mount.join(group);
    if create {
        // create_dir_all makes group creation idempotent.
        fs::create_dir_all(&dir).map_err(|e| CoracleError::Io {
            path: dir.clone(),
            source: e,
        })?;
    }
    Ok(dir)
}

/// Writes a value into a controller's control file, creating the group
/// directory first.
pub(crate) fn write_control(controller: &str, group: &str, file: &str, value: &str) -> Result<()> {
    let path = controller_dir(controller, group, true)?.join(file);
    fs::write(&path, value).map_err(|e| CoracleError::Io {
        path: path.clone(),
        source: e,
    })?;
    tracing::debug!(path = %path.display(), value, "cgroup control written");
    Ok(())
}

/// Adds a pid to a controller's `tasks` membership list.
pub(crate) fn add_task(controller: &str, group: &str, pid: u32) -> Result<()> {
    write_control(controller, group, "tasks", &pid.to_string())
}

/// Removes a controller's group directory if it exists.
pub(crate) fn remove_group(controller: &str, group: &str) -> Result<()> {
    let Some(mount) = find_hierarchy_mount(controller) else {
        // Hierarchy not mounted: nothing was ever created.
        return Ok(());
    };
    let dir = mount.join(group);
    match fs::remove_dir(&dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CoracleError::Io {
            path: dir,
            source: e,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEMORY_LINE: &str = "36 25 0:31 / /sys/fs/cgroup/memory \
        rw,nosuid,nodev,noexec,relatime shared:16 - cgroup cgroup rw,memory";
    const CPU_LINE: &str = "35 25 0:30 / /sys/fs/cgroup/cpu,cpuacct \
        rw,nosuid,nodev,noexec,relatime shared:15 - cgroup cgroup rw,cpu,cpuacct";
    const V2_LINE: &str = "34 25 0:29 / /sys/fs/cgroup/unified \
        rw,nosuid,nodev,noexec,relatime shared:14 - cgroup2 cgroup2 rw";

    #[test]
    fn hierarchy_line_matches_controller_option() {
        let mount = parse_hierarchy_line(MEMORY_LINE, "memory");
        assert_eq!(mount, Some(PathBuf::from("/sys/fs/cgroup/memory")));
    }

    #[test]
    fn hierarchy_line_matches_within_combined_options() {
        let mount = parse_hierarchy_line(CPU_LINE, "cpu");
        assert_eq!(mount, Some(PathBuf::from("/sys/fs/cgroup/cpu,cpuacct")));
    }

    #[test]
    fn hierarchy_line_rejects_other_controllers() {
        assert_eq!(parse_hierarchy_line(MEMORY_LINE, "cpu"), None);
    }

    #[test]
    fn hierarchy_line_rejects_cgroup_v2() {
        assert_eq!(parse_hierarchy_line(V2_LINE, "memory"), None);
    }

    #[test]
    fn destroy_twice_succeeds() {
        // A group that was never populated: both calls are no-ops.
        let manager = CgroupManager::new("coracle-test-destroy-twice");
        manager.destroy().expect("first destroy");
        manager.destroy().expect("second destroy");
    }

    #[test]
    fn limit_failure_names_controller() {
        let failure = LimitFailure {
            controller: "memory",
            error: CoracleError::NotFound {
                kind: "cgroup hierarchy",
                id: "memory".into(),
            },
        };
        assert!(failure.to_string().starts_with("memory controller:"));
    }
}
