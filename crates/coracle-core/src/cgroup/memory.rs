//! Memory resource control.
//!
//! Manages `memory.limit_in_bytes` in the memory hierarchy.

use coracle_common::error::Result;
use coracle_common::types::ResourceLimits;

use super::Controller;

/// Controller for the `memory` hierarchy.
#[derive(Debug)]
pub struct MemoryController;

impl Controller for MemoryController {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn set(&self, group: &str, limits: &ResourceLimits) -> Result<()> {
        if let Some(bytes) = limits.memory_bytes {
            super::write_control(self.name(), group, "memory.limit_in_bytes", &bytes.to_string())?;
            tracing::debug!(group, bytes, "memory limit set");
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
