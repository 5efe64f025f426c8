//! Container lifecycle management for the Coracle runtime.

#![allow(unsafe_code)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod container;
pub mod init;
pub mod launcher;
pub mod logs;
pub mod record;
pub mod run;
