//! Global configuration model for the Coracle runtime.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the Coracle runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoracleConfig {
    /// Base directory for runtime state (container records, IPAM document).
    pub run_dir: PathBuf,
    /// Name of the cgroup each `run` invocation enlists its container into.
    pub cgroup_name: String,
    /// Default resource limits applied when the caller sets none.
    pub default_limits: crate::types::ResourceLimits,
}

impl CoracleConfig {
    /// Creates a configuration rooted at an explicit runtime directory.
    #[must_use]
    pub fn with_run_dir(run_dir: PathBuf) -> Self {
        Self {
            run_dir,
            ..Self::default()
        }
    }

    /// Returns the directory holding per-container metadata records.
    #[must_use]
    pub fn containers_dir(&self) -> PathBuf {
        self.run_dir.join("containers")
    }

    /// Returns the path of the subnet allocation document.
    #[must_use]
    pub fn ipam_path(&self) -> PathBuf {
        self.run_dir.join("network").join("ipam").join("subnet.json")
    }
}

impl Default for CoracleConfig {
    fn default() -> Self {
        Self {
            run_dir: crate::constants::run_dir().clone(),
            cgroup_name: crate::constants::CGROUP_PREFIX.to_string(),
            default_limits: crate::types::ResourceLimits::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_paths_live_under_run_dir() {
        let cfg = CoracleConfig::with_run_dir(PathBuf::from("/tmp/coracle-test"));
        assert_eq!(
            cfg.containers_dir(),
            PathBuf::from("/tmp/coracle-test/containers")
        );
        assert_eq!(
            cfg.ipam_path(),
            PathBuf::from("/tmp/coracle-test/network/ipam/subnet.json")
        );
    }

    #[test]
    fn default_uses_workspace_cgroup_name() {
        let cfg = CoracleConfig::default();
        assert_eq!(cfg.cgroup_name, crate::constants::CGROUP_PREFIX);
        assert!(cfg.default_limits.is_empty());
    }
}
