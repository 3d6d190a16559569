//! Artifact store adapter — derived policy files on disk.
//!
//! Artifact generation is a pure function of `(org, pattern, definition)`:
//! one `.policy` JSON file per distinct (reference × version) combination,
//! written under `<base>/<org>/` with deterministic, collision-free
//! filenames. The directory tree is a cache; entries are invalidated by the
//! manager on content-hash mismatch.
//!
//! Writes use the atomic `.tmp` sibling + rename protocol; deletes treat an
//! already-absent path as success so eviction is idempotent.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use edgewarden_core::{
    AgreementProtocol, OrgName, PatternDefinition, PatternName, UpgradePolicy, VersionPriority,
};

use crate::error::{io_err, ManagerError};

/// File extension of derived policy artifacts.
pub const POLICY_EXT: &str = "policy";

/// One deployable combination drawn from a pattern definition.
///
/// This is the persisted body of a policy artifact; the deployment and
/// negotiation subsystems read these files by path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyArtifact {
    pub org: OrgName,
    pub pattern: PatternName,
    pub label: String,
    pub reference_url: String,
    pub reference_org: String,
    pub reference_arch: String,
    pub version: String,
    #[serde(default)]
    pub priority: VersionPriority,
    #[serde(default)]
    pub upgrade: UpgradePolicy,
    #[serde(default)]
    pub deployment_overrides: String,
    #[serde(default)]
    pub deployment_overrides_signature: String,
    #[serde(default)]
    pub agreement_protocols: Vec<AgreementProtocol>,
}

/// Filesystem adapter rooted at a configured base path.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    base: PathBuf,
}

impl ArtifactStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// `<base>/<org>/` — pure, no I/O.
    pub fn org_dir(&self, org: &OrgName) -> PathBuf {
        self.base.join(&org.0)
    }

    /// Generate every policy artifact for `pattern` and return the paths
    /// written, in deterministic order.
    ///
    /// Creates the org directory if absent. Each file is written atomically;
    /// the first I/O error aborts the pass and is surfaced as-is.
    pub fn generate(
        &self,
        org: &OrgName,
        pattern: &PatternName,
        definition: &PatternDefinition,
    ) -> Result<Vec<PathBuf>, ManagerError> {
        let dir = self.org_dir(org);
        std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;

        let mut written = Vec::new();
        for artifact in expand(org, pattern, definition) {
            let path = dir.join(artifact_file_name(pattern, &artifact));
            write_artifact(&path, &artifact)?;
            tracing::info!("wrote policy artifact: {}", path.display());
            written.push(path);
        }
        Ok(written)
    }

    /// Delete a specific list of previously generated paths.
    ///
    /// Idempotent: a path that is already gone is not an error.
    pub fn delete(&self, paths: &[PathBuf]) -> Result<(), ManagerError> {
        for path in paths {
            match std::fs::remove_file(path) {
                Ok(()) => tracing::info!("deleted policy artifact: {}", path.display()),
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => return Err(io_err(path, err)),
            }
        }
        Ok(())
    }

    /// List `.policy` files directly present under the org directory.
    ///
    /// Returns an empty list when the directory does not exist. Used for
    /// cleanup verification; subdirectories are not descended into.
    pub fn list(&self, org: &OrgName) -> Result<Vec<PathBuf>, ManagerError> {
        let dir = self.org_dir(org);
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(err) => return Err(io_err(&dir, err)),
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|e| e.path())
            .filter(|p| p.extension().map(|ext| ext == POLICY_EXT).unwrap_or(false))
            .collect();
        files.sort();
        Ok(files)
    }

    /// Remove the org directory if it is empty. Foreign files keep it alive.
    pub fn remove_org_dir_if_empty(&self, org: &OrgName) {
        let dir = self.org_dir(org);
        if std::fs::remove_dir(&dir).is_ok() {
            tracing::info!("removed empty org directory: {}", dir.display());
        }
    }
}

/// Expand a definition into its deployable combinations, services first,
/// preserving list order within each reference.
fn expand(
    org: &OrgName,
    pattern: &PatternName,
    definition: &PatternDefinition,
) -> Vec<PolicyArtifact> {
    let mut artifacts = Vec::new();
    for service in &definition.services {
        for choice in &service.service_versions {
            artifacts.push(PolicyArtifact {
                org: org.clone(),
                pattern: pattern.clone(),
                label: definition.label.clone(),
                reference_url: service.service_url.clone(),
                reference_org: service.service_org.clone(),
                reference_arch: service.service_arch.clone(),
                version: choice.version.clone(),
                priority: choice.priority.clone(),
                upgrade: choice.upgrade.clone(),
                deployment_overrides: choice.deployment_overrides.clone(),
                deployment_overrides_signature: choice.deployment_overrides_signature.clone(),
                agreement_protocols: definition.agreement_protocols.clone(),
            });
        }
    }
    for workload in &definition.workloads {
        for choice in &workload.workload_versions {
            artifacts.push(PolicyArtifact {
                org: org.clone(),
                pattern: pattern.clone(),
                label: definition.label.clone(),
                reference_url: workload.workload_url.clone(),
                reference_org: workload.workload_org.clone(),
                reference_arch: workload.workload_arch.clone(),
                version: choice.version.clone(),
                priority: choice.priority.clone(),
                upgrade: choice.upgrade.clone(),
                deployment_overrides: choice.deployment_overrides.clone(),
                deployment_overrides_signature: choice.deployment_overrides_signature.clone(),
                agreement_protocols: definition.agreement_protocols.clone(),
            });
        }
    }
    artifacts
}

/// `<pattern>_<digest>.policy` — digest covers reference identity + version,
/// so distinct combinations never collide and an unchanged combination keeps
/// its path across regenerations.
fn artifact_file_name(pattern: &PatternName, artifact: &PolicyArtifact) -> String {
    let mut hasher = Sha256::new();
    hasher.update(artifact.reference_url.as_bytes());
    hasher.update(b"|");
    hasher.update(artifact.reference_org.as_bytes());
    hasher.update(b"|");
    hasher.update(artifact.reference_arch.as_bytes());
    hasher.update(b"|");
    hasher.update(artifact.version.as_bytes());
    let digest = hasher.finalize();
    format!("{}_{}.{}", pattern.0, hex::encode(&digest[..8]), POLICY_EXT)
}

/// Write one artifact atomically: serialize → `.tmp` sibling → rename.
fn write_artifact(path: &Path, artifact: &PolicyArtifact) -> Result<(), ManagerError> {
    let json = serde_json::to_string_pretty(artifact)?;
    let tmp = PathBuf::from(format!("{}.tmp", path.display()));
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
