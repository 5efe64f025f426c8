//! Container log retrieval.
//!
//! Detached containers write their stdio into a fixed log file inside
//! their record directory; this module reads it back wholesale.

use std::path::{Path, PathBuf};

use coracle_common::constants::CONTAINER_LOG_FILE;
use coracle_common::error::{CoracleError, Result};

/// Returns the log file path for a container.
#[must_use]
pub fn log_path(root: &Path, name: &str) -> PathBuf {
    root.join(name).join(CONTAINER_LOG_FILE)
}

/// Reads a container's full log contents.
///
/// # Errors
///
/// Returns `NotFound` if the container has no log file, or an I/O error
/// if it exists but cannot be read.
pub fn read_container_log(root: &Path, name: &str) -> Result<String> {
    let path = log_path(root, name);
    match std::fs::read_to_string(&path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(CoracleError::NotFound {
            kind: "container log",
            id: name.to_string(),
        }),
        Err(e) => Err(CoracleError::Io { path, source: e }),
    }
}
