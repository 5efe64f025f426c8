//! System-wide constants and default paths.

use std::path::PathBuf;
use std::sync::OnceLock;

/// Default base directory for Coracle runtime state on Linux with root access.
pub const SYSTEM_RUN_DIR: &str = "/var/run/coracle";

/// Returns the runtime state directory, preferring `$HOME/.coracle/run` for
/// non-root environments, falling back to `/var/run/coracle`.
fn resolve_run_dir() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        let user_dir = PathBuf::from(home).join(".coracle").join("run");
        if std::fs::create_dir_all(&user_dir).is_ok() {
            return user_dir;
        }
    }
    PathBuf::from(SYSTEM_RUN_DIR)
}

static RUN_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Returns the resolved runtime state directory for this session.
pub fn run_dir() -> &'static PathBuf {
    RUN_DIR.get_or_init(resolve_run_dir)
}

/// Returns the default path of the subnet allocation document.
pub fn default_ipam_path() -> PathBuf {
    run_dir().join("network").join("ipam").join("subnet.json")
}

/// File name of the per-container metadata document.
pub const CONFIG_NAME: &str = "config.json";

/// File name of the per-container log file.
pub const CONTAINER_LOG_FILE: &str = "container.log";

/// Name of the cgroup created for each `run` invocation.
pub const CGROUP_PREFIX: &str = "coracle";

/// Placeholder container name used when the caller supplies none.
pub const DEFAULT_CONTAINER_NAME: &str = "skiff";

/// Length of the generated numeric container id.
pub const CONTAINER_ID_LEN: usize = 10;

/// Timestamp format used in container metadata records.
pub const CREATED_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Application name used in CLI output and state files.
pub const APP_NAME: &str = "coracle";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "coracle";
