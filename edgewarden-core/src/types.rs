//! Domain types for the edgewarden catalog feeds.
//!
//! Pattern definitions arrive from the remote catalog as JSON and are never
//! mutated in place — an updated pattern replaces the old one wholesale.
//! Map-valued fields use `BTreeMap` so canonical serialization always emits
//! keys in sorted order (see [`crate::hash`]).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed organization name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrgName(pub String);

impl fmt::Display for OrgName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for OrgName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrgName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A strongly-typed pattern name, unique within an organization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PatternName(pub String);

impl fmt::Display for PatternName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for PatternName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PatternName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Pattern definition
// ---------------------------------------------------------------------------

/// Priority metadata attached to a deployable version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionPriority {
    #[serde(default)]
    pub priority_value: u32,
    #[serde(default)]
    pub retries: u32,
    #[serde(default)]
    pub retry_duration_s: u32,
    #[serde(default)]
    pub verified_duration_s: u32,
}

/// Upgrade policy for a deployable version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradePolicy {
    #[serde(default)]
    pub lifecycle: String,
    #[serde(default)]
    pub time: String,
}

/// One deployable version of a referenced service or workload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionChoice {
    pub version: String,
    #[serde(default)]
    pub priority: VersionPriority,
    #[serde(default)]
    pub upgrade: UpgradePolicy,
    #[serde(default)]
    pub deployment_overrides: String,
    #[serde(default)]
    pub deployment_overrides_signature: String,
}

/// Reference to a catalog service, with the versions a pattern may deploy.
///
/// List order is semantically significant (preference order) and preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceReference {
    pub service_url: String,
    pub service_org: String,
    pub service_arch: String,
    #[serde(default)]
    pub service_versions: Vec<VersionChoice>,
}

/// Reference to a legacy workload, same shape as a service reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadReference {
    pub workload_url: String,
    pub workload_org: String,
    pub workload_arch: String,
    #[serde(default)]
    pub workload_versions: Vec<VersionChoice>,
}

/// An agreement protocol a pattern is willing to negotiate with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgreementProtocol {
    pub name: String,
    #[serde(default)]
    pub protocol_version: u32,
}

/// A deployment pattern as defined in the remote catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternDefinition {
    #[serde(default)]
    pub owner: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub workloads: Vec<WorkloadReference>,
    #[serde(default)]
    pub services: Vec<ServiceReference>,
    #[serde(default)]
    pub agreement_protocols: Vec<AgreementProtocol>,
    /// Free-form property set; `BTreeMap` keeps canonical key order.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// Served set
// ---------------------------------------------------------------------------

/// One record of the catalog's served-pattern feed.
///
/// `last_updated` is opaque passthrough metadata; change detection is done by
/// content hash, never by timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServedPattern {
    pub org: OrgName,
    pub pattern: PatternName,
    #[serde(default)]
    pub last_updated: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
