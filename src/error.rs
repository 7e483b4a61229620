//! Error types for hardening operations.
//!
//! The engine distinguishes errors that must always surface (validation,
//! permission, rollback lookups) from advisory failures that are swallowed
//! at the call site and only logged. Raw I/O errors propagate unchanged.

use std::path::Path;
use thiserror::Error;

/// Errors produced by the hardening engine.
#[derive(Debug, Error)]
pub enum Error {
    /// The policy violates an invariant. Fatal before any module runs.
    #[error("invalid policy: {0}")]
    Validation(String),

    /// Apply was attempted without the required privileges.
    #[error("permission denied: {0}")]
    Permission(String),

    /// An external tool rejected the change (e.g. a config syntax check).
    ///
    /// Only raised for checks that gate a write. Best-effort commands
    /// (service reloads, firewall rule pushes) never produce this; their
    /// failures are logged and swallowed where they happen.
    #[error("{tool} failed: {detail}")]
    ExternalTool { tool: String, detail: String },

    /// Rollback could not find a snapshot or the expected backup entry.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller cancelled an in-flight external command.
    #[error("operation cancelled")]
    Cancelled,

    /// Raw filesystem error, propagated unchanged.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build the standard missing-privilege error for a write target.
    pub(crate) fn needs_root(path: &Path) -> Self {
        Self::Permission(format!(
            "writing {} requires root privileges",
            path.display()
        ))
    }

    /// Whether this error means the policy itself is unusable.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
