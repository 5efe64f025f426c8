//! CPU resource control.
//!
//! Manages `cpu.shares`, the relative CPU weight a group receives
//! under contention.

use coracle_common::error::Result;
use coracle_common::types::ResourceLimits;

use super::Controller;

/// Controller for the `cpu` hierarchy.
#[derive(Debug)]
pub struct CpuController;

impl Controller for CpuController {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn set(&self, group: &str, limits: &ResourceLimits) -> Result<()> {
        if let Some(shares) = limits.cpu_shares {
            super::write_control(self.name(), group, "cpu.shares", &shares.to_string())?;
            tracing::debug!(group, shares, "CPU shares set");
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
