//! Per-container metadata records.
//!
//! Each container gets a directory under the containers root, keyed by its
//! name, holding a single `config.json` document. The directory is created
//! when a container launches and removed when a foreground container exits
//! or by explicit removal tooling.

use std::path::Path;

use chrono::Local;
use coracle_common::constants::{
    CONFIG_NAME, CONTAINER_ID_LEN, CREATED_TIME_FORMAT, DEFAULT_CONTAINER_NAME,
};
use coracle_common::error::{CoracleError, Result};
use coracle_common::types::ContainerStatus;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Persisted metadata for one container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerRecord {
    /// Random 10-digit numeric identifier. Not checked for collisions;
    /// the name, not the id, is the external key.
    pub id: String,
    /// String form of the container process id; emptied once stopped.
    pub pid: String,
    /// The container's startup command line.
    pub command: String,
    /// Human-readable creation timestamp.
    pub created_time: String,
    /// Current lifecycle status.
    pub status: ContainerStatus,
    /// External-facing identifier; doubles as the on-disk directory key.
    pub name: String,
}

/// Generates the random numeric container id.
fn random_id() -> String {
    let mut rng = rand::rng();
    (0..CONTAINER_ID_LEN)
        .map(|_| char::from(b'0' + rng.random_range(0..10)))
        .collect()
}

/// Records a freshly launched container with status RUNNING.
///
/// An empty `name` falls back to the default placeholder. Returns the
/// effective name, which is the key for all later lookups.
///
/// # Errors
///
/// Returns an error if the record directory or document cannot be written;
/// this is fatal for the launch in progress.
pub fn record_container_info(
    root: &Path,
    pid: u32,
    argv: &[String],
    name: &str,
) -> Result<String> {
    let name = if name.is_empty() {
        DEFAULT_CONTAINER_NAME.to_string()
    } else {
        name.to_string()
    };

    let record = ContainerRecord {
        id: random_id(),
        pid: pid.to_string(),
        command: argv.join(" "),
        created_time: Local::now().format(CREATED_TIME_FORMAT).to_string(),
        status: ContainerStatus::Running,
        name: name.clone(),
    };

    let dir = root.join(&name);
    std::fs::create_dir_all(&dir).map_err(|e| CoracleError::Io {
        path: dir.clone(),
        source: e,
    })?;
    write_record(root, &record)?;
    tracing::info!(name = %name, id = %record.id, pid, "container recorded");
    Ok(name)
}

/// Rewrites an existing container's metadata document.
///
/// # Errors
///
/// Returns an error if the document cannot be serialized or written.
pub fn write_record(root: &Path, record: &ContainerRecord) -> Result<()> {
    let path = root.join(&record.name).join(CONFIG_NAME);
    let json = serde_json::to_string(record)?;
    std::fs::write(&path, json).map_err(|e| CoracleError::Io { path, source: e })
}

/// Loads one container's metadata record by name.
///
/// # Errors
///
/// Returns `NotFound` if no record exists for `name`, or a serialization
/// error for a corrupt document.
pub fn get_container_record(root: &Path, name: &str) -> Result<ContainerRecord> {
    let path = root.join(name).join(CONFIG_NAME);
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CoracleError::NotFound {
                kind: "container",
                id: name.to_string(),
            });
        }
        Err(e) => return Err(CoracleError::Io { path, source: e }),
    };
    Ok(serde_json::from_str(&raw)?)
}

/// Removes a container's whole record directory. Best-effort cleanup:
/// failures are logged, never propagated.
pub fn delete_container_info(root: &Path, name: &str) {
    let dir = root.join(name);
    if let Err(e) = std::fs::remove_dir_all(&dir) {
        tracing::warn!(dir = %dir.display(), error = %e, "removing container record failed");
    }
}

/// Lists every parseable container record under the containers root.
///
/// Records that fail to load are skipped with a warning; a missing root
/// simply yields an empty list. Order is whatever the directory
/// enumeration provides.
///
/// # Errors
///
/// Returns an error only if the root exists but cannot be enumerated.
pub fn list_containers(root: &Path) -> Result<Vec<ContainerRecord>> {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(CoracleError::Io {
                path: root.to_path_buf(),
                source: e,
            });
        }
    };

    let mut records = Vec::new();
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        match get_container_record(root, &name) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!(container = %name, error = %e, "skipping unreadable record");
            }
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_ten_digits() {
        let id = random_id();
        assert_eq!(id.len(), 10);
        assert!(id.bytes().all(|b| b.is_ascii_digit()));
    }

    #[test]
    fn recorded_container_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let name = record_container_info(dir.path(), 4242, &["sh".into()], "demo")
            .expect("record");
        assert_eq!(name, "demo");

        let record = get_container_record(dir.path(), "demo").expect("load");
        assert_eq!(record.name, "demo");
        assert_eq!(record.pid, "4242");
        assert_eq!(record.command, "sh");
        assert_eq!(record.status, ContainerStatus::Running);
    }

    #[test]
    fn delete_makes_record_unreadable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let _ = record_container_info(dir.path(), 1, &["sleep".into(), "1".into()], "gone")
            .expect("record");
        delete_container_info(dir.path(), "gone");

        let err = get_container_record(dir.path(), "gone").expect_err("deleted");
        assert!(matches!(err, CoracleError::NotFound { .. }));
    }

    #[test]
    fn empty_name_falls_back_to_placeholder() {
        let dir = tempfile::tempdir().expect("tempdir");
        let name =
            record_container_info(dir.path(), 7, &["true".into()], "").expect("record");
        assert_eq!(name, DEFAULT_CONTAINER_NAME);
        assert!(get_container_record(dir.path(), &name).is_ok());
    }

    #[test]
    fn document_uses_camel_case_field_names() {
        let dir = tempfile::tempdir().expect("tempdir");
        let _ = record_container_info(dir.path(), 9, &["sh".into()], "fields").expect("record");

        let raw = std::fs::read_to_string(dir.path().join("fields").join(CONFIG_NAME))
            .expect("document");
        assert!(raw.contains("\"createdTime\""));
        assert!(raw.contains("\"status\":\"RUNNING\""));
    }

    #[test]
    fn list_skips_unparseable_records() {
        let dir = tempfile::tempdir().expect("tempdir");
        let _ = record_container_info(dir.path(), 11, &["sh".into()], "good").expect("record");

        let bad_dir = dir.path().join("bad");
        std::fs::create_dir_all(&bad_dir).expect("mkdir");
        std::fs::write(bad_dir.join(CONFIG_NAME), "not json").expect("write");

        let records = list_containers(dir.path()).expect("list");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "good");
    }

    #[test]
    fn list_of_missing_root_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let records = list_containers(&dir.path().join("absent")).expect("list");
        assert!(records.is_empty());
    }
}
