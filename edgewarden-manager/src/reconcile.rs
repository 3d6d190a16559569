//! Reconcile pipeline entrypoint used by the hosting agent's poll loop.

use std::collections::HashMap;
use std::path::Path;

use edgewarden_core::{OrgName, PatternDefinition, ServedPattern};

use crate::error::ManagerError;
use crate::manager::PatternManager;

/// Outcome of reconciling a single org.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgReconcileResult {
    pub org: OrgName,
    /// Pattern entries indexed for the org after the pass.
    pub patterns: usize,
}

/// Run a full reconciliation pass: apply the served set, then reconcile
/// every currently indexed org against its defined patterns.
///
/// An org the definition feed does not cover is reconciled against an empty
/// map, which prunes all of its entries. This is the canonical entrypoint
/// the poll loop calls once per cadence tick.
pub fn run(
    manager: &PatternManager,
    served: &HashMap<String, ServedPattern>,
    defined_by_org: &HashMap<OrgName, HashMap<String, PatternDefinition>>,
    artifact_base: &Path,
) -> Result<Vec<OrgReconcileResult>, ManagerError> {
    manager.set_current_patterns(served, artifact_base)?;

    let empty = HashMap::new();
    let mut results = Vec::new();
    for org in manager.served_orgs() {
        let defined = defined_by_org.get(&org).unwrap_or(&empty);
        manager.update_pattern_policies(&org.0, defined, artifact_base)?;
        results.push(OrgReconcileResult {
            patterns: manager.pattern_count(&org.0),
            org,
        });
    }
    Ok(results)
}
