//! # coracle-core
//!
//! Low-level Linux isolation primitives for the Coracle runtime.
//!
//! This crate provides safe abstractions over:
//! - **Cgroups v1**: memory, CPU, and cpuset resource limiting, one
//!   hierarchy per controller as mounted by the host.
//! - **Mounts**: the `/proc` and mount-propagation setup performed by the
//!   container init process inside its fresh mount namespace.
//!
//! All unsafe system calls are encapsulated in safe wrappers with
//! proper error handling.

pub mod cgroup;
pub mod mount;
