//! Set diff for compiled execution-plan step identifiers.
//!
//! Execution plans are compiled per host per environment as an ordered list
//! of step identifiers. For change detection the order is irrelevant: what
//! matters is which steps a merge would introduce or drop.

use std::collections::BTreeSet;

use serde::Serialize;

use super::types::PlanId;

/// Difference between two sets of execution-plan step identifiers.
///
/// Serializes each key only when its set is non-empty, so an unchanged pair
/// yields an empty object `{}` rather than an absent one - callers iterate
/// plan reports per host and rely on every host being present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlanSetDiff {
    /// Steps present only in the incoming environment.
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub added: BTreeSet<PlanId>,
    /// Steps present only in the target environment.
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub removed: BTreeSet<PlanId>,
}

impl PlanSetDiff {
    /// Returns true if the two plans contained the same steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Engine for comparing execution-plan step sets.
#[derive(Debug, Default)]
pub struct SetDiffEngine;

impl SetDiffEngine {
    /// Creates a new set diff engine.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes `added = incoming − target` and `removed = target − incoming`.
    #[must_use]
    pub fn diff_sets(&self, target: &BTreeSet<PlanId>, incoming: &BTreeSet<PlanId>) -> PlanSetDiff {
        PlanSetDiff {
            added: incoming.difference(target).cloned().collect(),
            removed: target.difference(incoming).cloned().collect(),
        }
    }
}
