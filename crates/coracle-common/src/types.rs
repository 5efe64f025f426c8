//! Domain primitive types used across the Coracle workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Resource limits applied to a container's cgroup.
///
/// A `None` field means the corresponding controller is left at its
/// kernel default (unlimited).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Memory limit in bytes.
    pub memory_bytes: Option<u64>,
    /// CPU shares (relative weight under contention).
    pub cpu_shares: Option<u64>,
    /// Set of CPU cores the container may run on, e.g. `"0-1,3"`.
    pub cpuset_cpus: Option<String>,
}

impl ResourceLimits {
    /// Returns `true` when no limit field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.memory_bytes.is_none() && self.cpu_shares.is_none() && self.cpuset_cpus.is_none()
    }
}

/// Lifecycle status of a container as persisted in its metadata record.
///
/// Only `Running` is written by the run path; `Stopped` and `Exited` are
/// set by the stop/reap tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContainerStatus {
    /// Container process is (believed to be) alive.
    Running,
    /// Container was stopped by explicit tooling.
    Stopped,
    /// Container process exited on its own.
    Exited,
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "RUNNING"),
            Self::Stopped => write!(f, "STOPPED"),
            Self::Exited => write!(f, "EXITED"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_limits_detected() {
        assert!(ResourceLimits::default().is_empty());
        let limits = ResourceLimits {
            memory_bytes: Some(1024),
            ..Default::default()
        };
        assert!(!limits.is_empty());
    }

    #[test]
    fn status_serializes_uppercase() {
        let json = serde_json::to_string(&ContainerStatus::Running).expect("serialize");
        assert_eq!(json, "\"RUNNING\"");
    }

    #[test]
    fn status_display_matches_serialized_form() {
        assert_eq!(ContainerStatus::Stopped.to_string(), "STOPPED");
        assert_eq!(ContainerStatus::Exited.to_string(), "EXITED");
    }
}
