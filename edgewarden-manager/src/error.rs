//! Error types for edgewarden-manager.

use std::path::PathBuf;

use thiserror::Error;

use edgewarden_core::HashError;

/// All errors that can arise from reconciliation operations.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// Canonical hashing failed — an internal invariant violation.
    #[error("hash error: {0}")]
    Hash(#[from] HashError),

    /// An I/O error, with annotated path for context. Retryable: the next
    /// reconciliation pass converges.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error (policy artifact body).
    #[error("policy artifact JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Policies were pushed for an org the served-set never seeded.
    #[error("org {org} not found in pattern manager")]
    OrgNotServed { org: String },
}

/// Convenience constructor for [`ManagerError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ManagerError {
    ManagerError::Io {
        path: path.into(),
        source,
    }
}
