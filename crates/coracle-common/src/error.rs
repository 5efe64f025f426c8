//! Unified error types for the Coracle workspace.
//!
//! Hard failures (setup, persistence) travel through [`CoracleError`];
//! per-controller cgroup failures are accumulated separately so a container
//! can keep running with partial resource limits.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum CoracleError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Namespace, pipe, or process creation failed before the container
    /// could start. Nothing has been persisted when this is returned.
    #[error("container setup failed: {message}")]
    Setup {
        /// Description of the failed setup step.
        message: String,
    },

    /// A configuration value or argument is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// A required resource was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },

    /// Every host address in a subnet is already allocated.
    #[error("subnet exhausted: no free address in {subnet}")]
    SubnetExhausted {
        /// CIDR of the exhausted subnet.
        subnet: String,
    },

    /// A permission or capability error.
    #[error("permission denied: {message}")]
    PermissionDenied {
        /// Description of the denied operation.
        message: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, CoracleError>;
