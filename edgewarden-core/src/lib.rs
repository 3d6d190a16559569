//! Edgewarden core library — catalog domain types, canonical hashing, errors.
//!
//! Public API surface:
//! - [`types`] — newtypes and pattern definition structs
//! - [`hash`] — [`ContentHash`] and [`hash_pattern`]
//! - [`error`] — [`HashError`]

pub mod error;
pub mod hash;
pub mod types;

pub use error::HashError;
pub use hash::{hash_pattern, ContentHash};
pub use types::{
    AgreementProtocol, OrgName, PatternDefinition, PatternName, ServedPattern, ServiceReference,
    UpgradePolicy, VersionChoice, VersionPriority, WorkloadReference,
};
