//! # coracle-net
//!
//! IP address management for the Coracle runtime.
//!
//! Provides a bitmap-based allocator that hands out unique IPv4 addresses
//! from statically configured subnets and persists its state in a single
//! JSON document, so allocations survive across process invocations.
//! The bridge/veth wiring that attaches an allocated address to a
//! container's network namespace lives outside this crate.

pub mod cidr;
pub mod ipam;

pub use cidr::Cidr;
pub use ipam::IpAllocator;
