//! Diff engines for pre-merge validation.
//!
//! This module holds the pure computation core: the structural tree diff,
//! the unchanged-structure pruner, and the execution-plan set diff. Nothing
//! here performs IO; all inputs arrive fully rendered.

mod planset;
mod prune;
mod tree;
mod types;

pub use planset::{PlanSetDiff, SetDiffEngine};
pub use prune::UnchangedPruner;
pub use tree::{ChangeKind, DiffNode, TreeDiffEngine};
pub use types::{ConfigTree, EnvironmentId, HostId, PlanId};
