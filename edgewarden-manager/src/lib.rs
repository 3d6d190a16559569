//! # edgewarden-manager
//!
//! Hash-gated pattern reconciliation for the edge-fleet agent.
//!
//! The [`PatternManager`] keeps an in-memory index of
//! organization → pattern → [`PatternEntry`] synchronized with the catalog's
//! served-pattern set ([`PatternManager::set_current_patterns`]) and with the
//! authoritative per-org definitions
//! ([`PatternManager::update_pattern_policies`]), regenerating on-disk policy
//! artifacts only when a definition's content hash actually changed.

pub mod artifact;
pub mod entry;
pub mod error;
pub mod manager;
pub mod reconcile;

pub use artifact::{ArtifactStore, PolicyArtifact};
pub use entry::PatternEntry;
pub use error::ManagerError;
pub use manager::PatternManager;
pub use reconcile::OrgReconcileResult;
