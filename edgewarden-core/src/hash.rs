//! Canonical content hashing for pattern definitions.
//!
//! The digest must be invariant to how a definition was constructed in
//! memory: struct fields serialize in declaration order, and map-valued
//! fields are `BTreeMap`s, so canonical JSON encoding is stable by
//! construction. Collection order (service/workload version lists) is
//! semantically significant and hashed positionally.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::HashError;
use crate::types::PatternDefinition;

/// A 32-byte content digest of a pattern definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub const LEN: usize = 32;

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Hash a pattern definition into its canonical content digest.
///
/// Pure and deterministic across process restarts and across equivalent
/// in-memory representations. Fails only if the definition cannot be
/// encoded, which signals an internal invariant violation.
pub fn hash_pattern(definition: &PatternDefinition) -> Result<ContentHash, HashError> {
    let canonical = serde_json::to_vec(definition)?;
    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    Ok(ContentHash(hasher.finalize().into()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::types::{
        AgreementProtocol, PatternDefinition, ServiceReference, VersionChoice,
    };

    fn version(v: &str) -> VersionChoice {
        VersionChoice {
            version: v.into(),
            ..Default::default()
        }
    }

    fn service(url: &str, arch: &str, versions: Vec<VersionChoice>) -> ServiceReference {
        ServiceReference {
            service_url: url.into(),
            service_org: "refrorg".into(),
            service_arch: arch.into(),
            service_versions: versions,
        }
    }

    /// The same pattern, assembled in two different orders.
    fn pattern_a() -> PatternDefinition {
        let mut def = PatternDefinition {
            owner: "u1/u1".into(),
            label: "Pattern".into(),
            description: "Pattern for the core service".into(),
            public: true,
            ..Default::default()
        };
        def.services.push(service("https://catalog.example.com/services/core-iot", "amd64", vec![version("3.0.0")]));
        def.services.push(service("https://catalog.example.com/services/core", "arm64", vec![version("3.0.0")]));
        def.agreement_protocols.push(AgreementProtocol {
            name: "Basic".into(),
            protocol_version: 0,
        });
        def.properties.insert("tier".into(), "gold".into());
        def.properties.insert("region".into(), "eu".into());
        def
    }

    fn pattern_a_reordered() -> PatternDefinition {
        // Fields and map inserts in a different order; same semantic content.
        let mut def = PatternDefinition::default();
        def.properties.insert("region".into(), "eu".into());
        def.properties.insert("tier".into(), "gold".into());
        def.agreement_protocols.push(AgreementProtocol {
            name: "Basic".into(),
            protocol_version: 0,
        });
        def.public = true;
        def.description = "Pattern for the core service".into();
        def.label = "Pattern".into();
        def.owner = "u1/u1".into();
        def.services.push(service("https://catalog.example.com/services/core-iot", "amd64", vec![version("3.0.0")]));
        def.services.push(service("https://catalog.example.com/services/core", "arm64", vec![version("3.0.0")]));
        def
    }

    #[test]
    fn digest_is_32_bytes() {
        let hash = hash_pattern(&pattern_a()).expect("hash");
        assert_eq!(hash.as_bytes().len(), ContentHash::LEN);
    }

    #[test]
    fn construction_order_does_not_change_hash() {
        let h1 = hash_pattern(&pattern_a()).expect("hash");
        let h2 = hash_pattern(&pattern_a_reordered()).expect("hash");
        assert_eq!(h1, h2);
    }

    #[test]
    fn hash_is_stable_across_calls() {
        let def = pattern_a();
        assert_eq!(hash_pattern(&def).unwrap(), hash_pattern(&def).unwrap());
    }

    #[test]
    fn service_list_order_is_significant() {
        let mut swapped = pattern_a();
        swapped.services.reverse();
        assert_ne!(
            hash_pattern(&pattern_a()).unwrap(),
            hash_pattern(&swapped).unwrap(),
            "preference order is content, not noise"
        );
    }

    #[rstest]
    #[case::label(|d: &mut PatternDefinition| d.label = "renamed".into())]
    #[case::version(|d: &mut PatternDefinition| {
        d.services[0].service_versions[0].version = "3.1.0".into();
    })]
    #[case::visibility(|d: &mut PatternDefinition| d.public = false)]
    #[case::property(|d: &mut PatternDefinition| {
        d.properties.insert("tier".into(), "silver".into());
    })]
    fn content_change_changes_hash(#[case] mutate: fn(&mut PatternDefinition)) {
        let base = pattern_a();
        let mut changed = base.clone();
        mutate(&mut changed);
        assert_ne!(
            hash_pattern(&base).unwrap(),
            hash_pattern(&changed).unwrap()
        );
    }

    #[test]
    fn rebuilding_from_raw_bytes_preserves_identity() {
        // Persisted digests come back as raw bytes.
        let hash = hash_pattern(&pattern_a()).expect("hash");
        let restored = ContentHash::from_bytes(*hash.as_bytes());
        assert_eq!(restored, hash);
        assert_eq!(restored.to_string(), hash.to_string());
    }

    #[test]
    fn display_is_lowercase_hex() {
        let hash = hash_pattern(&pattern_a()).expect("hash");
        let text = hash.to_string();
        assert_eq!(text.len(), 64);
        assert!(text.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
