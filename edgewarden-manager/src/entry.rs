//! Pattern entry — the value object the index stores per org/pattern pair.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use edgewarden_core::{hash_pattern, ContentHash, HashError, PatternDefinition};

/// A pattern definition paired with its content hash and the policy artifact
/// paths derived from it.
///
/// Owned exclusively by the [`PatternManager`](crate::PatternManager):
/// created on first observation, replaced wholesale when the upstream content
/// changes, destroyed when the pattern stops being served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternEntry {
    pub definition: PatternDefinition,
    pub hash: ContentHash,
    pub artifact_paths: Vec<PathBuf>,
    pub updated: DateTime<Utc>,
}

impl PatternEntry {
    /// Build an entry from a definition, computing its canonical hash.
    ///
    /// Artifact paths are attached by the manager once generation succeeds.
    pub fn new(definition: PatternDefinition) -> Result<Self, HashError> {
        let hash = hash_pattern(&definition)?;
        Ok(Self::from_hashed(definition, hash))
    }

    /// Build an entry from a definition whose hash is already known, so the
    /// change gate and the entry never hash the same content twice.
    pub fn from_hashed(definition: PatternDefinition, hash: ContentHash) -> Self {
        Self {
            definition,
            hash,
            artifact_paths: Vec::new(),
            updated: Utc::now(),
        }
    }

    /// Replace the derived artifact paths and bump the update timestamp.
    pub fn with_artifacts(mut self, paths: Vec<PathBuf>) -> Self {
        self.artifact_paths = paths;
        self.updated = Utc::now();
        self
    }
}

impl fmt::Display for PatternEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PatternEntry{{label: {}, hash: {}, artifacts: {}, updated: {}}}",
            self.definition.label,
            self.hash,
            self.artifact_paths.len(),
            self.updated.to_rfc3339(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgewarden_core::ContentHash;

    fn def(label: &str) -> PatternDefinition {
        PatternDefinition {
            label: label.into(),
            description: "desc".into(),
            public: true,
            ..Default::default()
        }
    }

    #[test]
    fn new_entry_carries_label_and_full_length_hash() {
        let entry = PatternEntry::new(def("label")).expect("entry");
        assert_eq!(entry.definition.label, "label");
        assert_eq!(entry.hash.as_bytes().len(), ContentHash::LEN);
        assert!(entry.artifact_paths.is_empty());
    }

    #[test]
    fn same_definition_yields_same_entry_hash() {
        let a = PatternEntry::new(def("label")).expect("entry");
        let b = PatternEntry::new(def("label")).expect("entry");
        assert_eq!(a.hash, b.hash);
    }

    #[test]
    fn from_hashed_matches_computed_hash() {
        let definition = def("label");
        let hash = hash_pattern(&definition).expect("hash");
        let entry = PatternEntry::from_hashed(definition.clone(), hash);
        let computed = PatternEntry::new(definition).expect("entry");
        assert_eq!(entry.hash, computed.hash);
        assert_eq!(entry.definition, computed.definition);
    }

    #[test]
    fn with_artifacts_replaces_paths() {
        let entry = PatternEntry::new(def("label"))
            .expect("entry")
            .with_artifacts(vec![PathBuf::from("/tmp/a.policy")]);
        assert_eq!(entry.artifact_paths.len(), 1);
    }

    #[test]
    fn display_includes_hash_hex() {
        let entry = PatternEntry::new(def("label")).expect("entry");
        let text = entry.to_string();
        assert!(text.contains(&entry.hash.to_string()));
    }
}
