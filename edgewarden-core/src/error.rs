//! Error types for edgewarden-core.

use thiserror::Error;

/// All errors that can arise from canonical hashing.
///
/// A definition that cannot be encoded signals an internal invariant
/// violation, not a recoverable condition.
#[derive(Debug, Error)]
pub enum HashError {
    /// Canonical JSON encoding of a pattern definition failed.
    #[error("cannot canonically encode pattern definition: {0}")]
    Encode(#[from] serde_json::Error),
}
