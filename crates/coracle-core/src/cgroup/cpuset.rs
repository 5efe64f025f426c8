//! CPU core pinning.
//!
//! Manages `cpuset.cpus`, the set of cores a group may be scheduled on.

use coracle_common::error::Result;
use coracle_common::types::ResourceLimits;

use super::Controller;

/// Controller for the `cpuset` hierarchy.
#[derive(Debug)]
pub struct CpusetController;

impl Controller for CpusetController {
    fn name(&self) -> &'static str {
        "cpuset"
    }

    fn set(&self, group: &str, limits: &ResourceLimits) -> Result<()> {
        if let Some(cpus) = limits.cpuset_cpus.as_deref() {
            // A fresh cpuset group rejects task writes until both cpus and
            // mems are populated.
            super::write_control(self.name(), group, "cpuset.mems", "0")?;
            super::write_control(self.name(), group, "cpuset.cpus", cpus)?;
            tracing::debug!(group, cpus, "cpuset set");
        }
        Ok(())
    }

    fn apply(&self, group: &str, pid: u32) -> Result<()> {
        super::add_task(self.name(), group, pid)
    }

    fn remove(&self, group: &str) -> Result<()> {
        super::remove_group(self.name(), group)
    }
}
