//! Pruning of unchanged structure from a diff tree.
//!
//! The raw diff classifies every field, including the unchanged ones. For
//! reporting, unchanged fields are noise: this transform folds them away so
//! that the report contains only actual differences.

use std::collections::BTreeMap;

use super::tree::{ChangeKind, DiffNode};

/// Bottom-up transform that removes unchanged structure from a diff tree.
#[derive(Debug, Default)]
pub struct UnchangedPruner;

impl UnchangedPruner {
    /// Creates a new pruner.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Prunes unchanged fields from a diff tree.
    ///
    /// Returns `None` when nothing survives: an `Unchanged` leaf, or a
    /// branch all of whose children pruned away. Empty branches are dropped
    /// transitively, so no branch in the result is ever empty. The transform
    /// is pure and idempotent.
    #[must_use]
    pub fn prune(&self, node: &DiffNode) -> Option<DiffNode> {
        match node {
            DiffNode::Leaf(ChangeKind::Unchanged) => None,
            DiffNode::Leaf(kind) => Some(DiffNode::Leaf(*kind)),
            DiffNode::Branch(children) => {
                let surviving: BTreeMap<String, DiffNode> = children
                    .iter()
                    .filter_map(|(key, child)| {
                        self.prune(child).map(|pruned| (key.clone(), pruned))
                    })
                    .collect();

                if surviving.is_empty() {
                    None
                } else {
                    Some(DiffNode::Branch(surviving))
                }
            }
        }
    }
}
