//! Structural diff engine for rendered configuration trees.
//!
//! This module computes the difference between the configuration rendered
//! for a target environment and for an incoming (proposed-change)
//! environment, classifying every field as added, removed, modified or
//! unchanged.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::types::ConfigTree;

/// Classification of a single field in the diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// The field exists only in the incoming environment.
    Added,
    /// The field exists only in the target environment.
    Removed,
    /// The field exists in both environments with different values.
    Modified,
    /// The field exists in both environments with equal values.
    Unchanged,
}

/// Classified comparison of two configuration trees.
///
/// Mirrors the shape of the inputs: a `Branch` where both sides were
/// branches, a classified `Leaf` everywhere a value comparison was made.
/// Serializes as nested maps with lowercase classification strings at the
/// leaves, e.g. `{"b": {"c": "modified", "d": "added"}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DiffNode {
    /// Mapping from field name to child diff node.
    Branch(BTreeMap<String, DiffNode>),
    /// Classification of a single compared field.
    Leaf(ChangeKind),
}

/// Engine for computing structural diffs between two rendered trees.
#[derive(Debug, Default)]
pub struct TreeDiffEngine;

impl TreeDiffEngine {
    /// Creates a new tree diff engine.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes the diff between the target and incoming trees.
    ///
    /// The diff is directional: swapping the arguments exchanges `Added` and
    /// `Removed` classifications at matching keys but is otherwise
    /// structurally mirrored. The result contains the exact union of keys
    /// from both inputs at every level.
    #[must_use]
    pub fn diff(&self, target: &ConfigTree, incoming: &ConfigTree) -> DiffNode {
        match (target, incoming) {
            (ConfigTree::Branch(target_fields), ConfigTree::Branch(incoming_fields)) => {
                Self::diff_branch(target_fields, incoming_fields)
            }
            // At least one side is a leaf: whole-value equality. A type
            // change (leaf vs branch) is an equality failure, never a
            // structural merge.
            _ => DiffNode::Leaf(if target == incoming {
                ChangeKind::Unchanged
            } else {
                ChangeKind::Modified
            }),
        }
    }

    /// Compares one branch level, recursing into shared branch children.
    fn diff_branch(
        target: &BTreeMap<String, ConfigTree>,
        incoming: &BTreeMap<String, ConfigTree>,
    ) -> DiffNode {
        let mut children = BTreeMap::new();

        for (key, target_child) in target {
            let node = match incoming.get(key) {
                None => DiffNode::Leaf(ChangeKind::Removed),
                Some(incoming_child) => match (target_child, incoming_child) {
                    (ConfigTree::Branch(target_fields), ConfigTree::Branch(incoming_fields)) => {
                        Self::diff_branch(target_fields, incoming_fields)
                    }
                    _ => DiffNode::Leaf(if target_child == incoming_child {
                        ChangeKind::Unchanged
                    } else {
                        ChangeKind::Modified
                    }),
                },
            };
            children.insert(key.clone(), node);
        }

        for (key, incoming_child) in incoming {
            if !target.contains_key(key) {
                children.insert(key.clone(), Self::mark_added(incoming_child));
            }
        }

        DiffNode::Branch(children)
    }

    /// Classifies every leaf beneath a subtree present only in the incoming
    /// environment as `Added`, preserving the subtree's shape.
    fn mark_added(node: &ConfigTree) -> DiffNode {
        match node {
            ConfigTree::Leaf(_) => DiffNode::Leaf(ChangeKind::Added),
            ConfigTree::Branch(fields) => DiffNode::Branch(
                fields
                    .iter()
                    .map(|(key, child)| (key.clone(), Self::mark_added(child)))
                    .collect(),
            ),
        }
    }
}

impl DiffNode {
    /// Returns true if any field anywhere in the tree is classified as
    /// added, removed or modified.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        match self {
            Self::Leaf(kind) => *kind != ChangeKind::Unchanged,
            Self::Branch(children) => children.values().any(Self::has_changes),
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Modified => "modified",
            Self::Unchanged => "unchanged",
        };
        write!(f, "{s}")
    }
}
