//! Pattern manager — the guarded org → pattern → entry index and its two
//! reconciliation operations.
//!
//! ## Reconciliation contract
//!
//! - [`PatternManager::set_current_patterns`] prunes and seeds the key space
//!   from the catalog's served-pattern set. It never fabricates content.
//! - [`PatternManager::update_pattern_policies`] reconciles one org's
//!   definitions: artifacts are regenerated only when the canonical content
//!   hash changed, so regeneration cost is proportional to actual change,
//!   not to the total number of patterns served.
//!
//! Both operations hold the write guard for their full duration, so readers
//! never observe a half-constructed entry or an entry whose artifacts are
//! already gone. A single coarse lock is sufficient: reconciliation runs on
//! a periodic cadence, not per-request.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use edgewarden_core::{hash_pattern, OrgName, PatternDefinition, PatternName, ServedPattern};

use crate::artifact::ArtifactStore;
use crate::entry::PatternEntry;
use crate::error::ManagerError;

type PatternMap = HashMap<PatternName, PatternEntry>;
type OrgIndex = HashMap<OrgName, PatternMap>;

/// Index plus the last applied served want-set, mutated together under one
/// guard so indexed patterns stay a subset of served ∩ defined.
#[derive(Debug, Default)]
struct Inner {
    index: OrgIndex,
    served: HashMap<OrgName, HashSet<PatternName>>,
}

/// In-memory index of served orgs and their pattern entries.
///
/// Created once by the hosting agent and shared across worker contexts;
/// lookups are safe concurrently with a reconciliation pass in progress.
#[derive(Debug, Default)]
pub struct PatternManager {
    inner: RwLock<Inner>,
}

impl PatternManager {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Lookups (shared read guard, never mutate)
    // -----------------------------------------------------------------------

    /// True if the org is currently in the index.
    pub fn has_org(&self, org: &str) -> bool {
        self.inner.read().index.contains_key(&OrgName::from(org))
    }

    /// True if the org/pattern pair has an entry.
    pub fn has_pattern(&self, org: &str, pattern: &str) -> bool {
        self.inner
            .read()
            .index
            .get(&OrgName::from(org))
            .map(|patterns| patterns.contains_key(&PatternName::from(pattern)))
            .unwrap_or(false)
    }

    /// Cloned snapshot of an entry, if present.
    pub fn get_entry(&self, org: &str, pattern: &str) -> Option<PatternEntry> {
        self.inner
            .read()
            .index
            .get(&OrgName::from(org))?
            .get(&PatternName::from(pattern))
            .cloned()
    }

    /// Artifact paths currently recorded for an org/pattern pair.
    pub fn artifact_paths(&self, org: &str, pattern: &str) -> Option<Vec<PathBuf>> {
        self.get_entry(org, pattern).map(|e| e.artifact_paths)
    }

    /// Currently indexed orgs, sorted for deterministic iteration.
    pub fn served_orgs(&self) -> Vec<OrgName> {
        let mut orgs: Vec<OrgName> = self.inner.read().index.keys().cloned().collect();
        orgs.sort();
        orgs
    }

    /// Number of orgs in the index.
    pub fn org_count(&self) -> usize {
        self.inner.read().index.len()
    }

    /// Number of pattern entries indexed for an org.
    pub fn pattern_count(&self, org: &str) -> usize {
        self.inner
            .read()
            .index
            .get(&OrgName::from(org))
            .map(|patterns| patterns.len())
            .unwrap_or(0)
    }

    // -----------------------------------------------------------------------
    // set_current_patterns
    // -----------------------------------------------------------------------

    /// Prune and seed the index's key space from the served-pattern set.
    ///
    /// Orgs and patterns no longer served lose their artifacts and entries;
    /// newly served orgs are seeded with empty pattern maps for
    /// [`update_pattern_policies`](Self::update_pattern_policies) to fill.
    /// Idempotent: re-applying the same served set is a no-op.
    ///
    /// On an artifact-deletion error the affected entry stays in the index,
    /// so entries and their files are removed together or not at all.
    pub fn set_current_patterns(
        &self,
        served: &HashMap<String, ServedPattern>,
        artifact_base: &Path,
    ) -> Result<(), ManagerError> {
        let store = ArtifactStore::new(artifact_base);

        let mut want: HashMap<OrgName, HashSet<PatternName>> = HashMap::new();
        for record in served.values() {
            want.entry(record.org.clone())
                .or_default()
                .insert(record.pattern.clone());
        }

        let mut inner = self.inner.write();

        // Orgs no longer served: drop every entry, then the org itself.
        let gone: Vec<OrgName> = inner
            .index
            .keys()
            .filter(|org| !want.contains_key(*org))
            .cloned()
            .collect();
        for org in gone {
            if let Some(patterns) = inner.index.get_mut(&org) {
                remove_all_entries(&store, &org, patterns)?;
            }
            inner.index.remove(&org);
            store.remove_org_dir_if_empty(&org);
            tracing::info!("org {org} no longer served; removed from index");
        }

        // Orgs still served: drop patterns that fell out of the served set.
        for (org, wanted) in &want {
            let Some(patterns) = inner.index.get_mut(org) else {
                continue;
            };
            let stale: Vec<PatternName> = patterns
                .keys()
                .filter(|name| !wanted.contains(*name))
                .cloned()
                .collect();
            for name in stale {
                remove_entry(&store, patterns, &name)?;
                tracing::info!("pattern {org}/{name} no longer served; removed");
            }
            if patterns.is_empty() {
                inner.index.remove(org);
                store.remove_org_dir_if_empty(org);
            }
        }

        // Newly served orgs start with an empty pattern map; content arrives
        // via update_pattern_policies.
        for org in want.keys() {
            if !inner.index.contains_key(org) {
                inner.index.insert(org.clone(), PatternMap::new());
                tracing::debug!("seeded newly served org {org}");
            }
        }

        inner.served = want;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // update_pattern_policies
    // -----------------------------------------------------------------------

    /// Reconcile one org's entries and artifacts against its defined
    /// patterns.
    ///
    /// `defined` keys are qualified `org/pattern` names; keys whose org
    /// segment does not match `org` are a caller contract violation and are
    /// skipped with a warning, never touching another org's entries. Defined
    /// patterns the served set does not cover are skipped too, keeping the
    /// index a subset of served ∩ defined.
    ///
    /// Returns the first I/O error encountered; progress already applied
    /// stays applied, and the periodic retry converges.
    pub fn update_pattern_policies(
        &self,
        org: &str,
        defined: &HashMap<String, PatternDefinition>,
        artifact_base: &Path,
    ) -> Result<(), ManagerError> {
        let store = ArtifactStore::new(artifact_base);
        let org_name = OrgName::from(org);

        let mut scoped: HashMap<PatternName, &PatternDefinition> = HashMap::new();
        for (qualified, definition) in defined {
            match qualified.split_once('/') {
                Some((key_org, name)) if key_org == org => {
                    scoped.insert(PatternName::from(name), definition);
                }
                _ => {
                    tracing::warn!("ignoring mis-scoped pattern key {qualified} for org {org}");
                }
            }
        }

        let mut inner = self.inner.write();
        let inner = &mut *inner;
        if let Some(served) = inner.served.get(&org_name) {
            scoped.retain(|name, _| {
                let keep = served.contains(name);
                if !keep {
                    tracing::debug!("pattern {org_name}/{name} defined but not served; skipping");
                }
                keep
            });
        }
        let Some(patterns) = inner.index.get_mut(&org_name) else {
            return Err(ManagerError::OrgNotServed {
                org: org.to_owned(),
            });
        };

        // Patterns the catalog no longer defines: artifacts first, entry on
        // success.
        let undefined: Vec<PatternName> = patterns
            .keys()
            .filter(|name| !scoped.contains_key(*name))
            .cloned()
            .collect();
        for name in undefined {
            remove_entry(&store, patterns, &name)?;
            tracing::info!("pattern {org_name}/{name} no longer defined; removed");
        }

        // Defined patterns: regenerate only on first observation or content
        // change. Identical hash means zero filesystem writes.
        for (name, definition) in scoped {
            let hash = hash_pattern(definition)?;
            if patterns.get(&name).map(|e| e.hash == hash).unwrap_or(false) {
                tracing::debug!("pattern {org_name}/{name} unchanged; skipping");
                continue;
            }

            let new_paths = store.generate(&org_name, &name, definition)?;
            let old_paths = patterns
                .get(&name)
                .map(|e| e.artifact_paths.clone())
                .unwrap_or_default();

            let entry =
                PatternEntry::from_hashed(definition.clone(), hash).with_artifacts(new_paths.clone());
            patterns.insert(name.clone(), entry);

            // Deterministic filenames mean an unchanged combination keeps its
            // path; only files the new set no longer covers are stale.
            let stale: Vec<PathBuf> = old_paths
                .into_iter()
                .filter(|p| !new_paths.contains(p))
                .collect();
            store.delete(&stale)?;
            tracing::info!("pattern {org_name}/{name} regenerated ({} artifacts)", new_paths.len());
        }

        if patterns.is_empty() {
            inner.index.remove(&org_name);
            store.remove_org_dir_if_empty(&org_name);
            tracing::info!("org {org_name} has no patterns left; removed from index");
        }

        Ok(())
    }
}

impl fmt::Display for PatternManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        let index = &inner.index;
        write!(f, "PatternManager{{orgs: {}", index.len())?;
        let mut orgs: Vec<&OrgName> = index.keys().collect();
        orgs.sort();
        for org in orgs {
            let Some(patterns) = index.get(org) else {
                continue;
            };
            let mut names: Vec<&PatternName> = patterns.keys().collect();
            names.sort();
            write!(f, ", {org}: [")?;
            for (i, name) in names.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{name}")?;
            }
            write!(f, "]")?;
        }
        write!(f, "}}")
    }
}

/// Delete one entry's artifacts, then the entry. Deletion errors leave the
/// entry in place so index and filesystem stay paired.
fn remove_entry(
    store: &ArtifactStore,
    patterns: &mut PatternMap,
    name: &PatternName,
) -> Result<(), ManagerError> {
    if let Some(entry) = patterns.get(name) {
        store.delete(&entry.artifact_paths)?;
    }
    patterns.remove(name);
    Ok(())
}

/// Delete every entry of an org that stopped being served.
fn remove_all_entries(
    store: &ArtifactStore,
    org: &OrgName,
    patterns: &mut PatternMap,
) -> Result<(), ManagerError> {
    let names: Vec<PatternName> = patterns.keys().cloned().collect();
    for name in names {
        remove_entry(store, patterns, &name)?;
        tracing::debug!("removed pattern {org}/{name} with its org");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
