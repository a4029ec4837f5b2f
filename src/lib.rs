// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Driftgate
//!
//! Pre-merge validation for infrastructure-as-code changes.
//!
//! ## Overview
//!
//! Driftgate renders the per-host configuration of a fleet in two named
//! environments - typically a stable baseline and a proposed change branch -
//! and reports exactly what would change if the branch were merged:
//!
//! - Structural diff of rendered configuration trees, classified per field
//!   as added / removed / modified
//! - Unchanged structure is pruned from the report, so a clean host is
//!   simply absent
//! - Set diff of compiled execution-plan step identifiers
//! - Fan-out across many hosts with bounded fetch concurrency
//!
//! ## Architecture
//!
//! The diff core is pure and synchronous; everything that touches the
//! outside world is injected through a capability trait:
//!
//! 1. **Fetch**: the [`render::RenderSource`] collaborator renders each
//!    host's configuration (or compiles its execution plan) per environment
//! 2. **Compute**: [`diff::TreeDiffEngine`], [`diff::UnchangedPruner`] and
//!    [`diff::SetDiffEngine`] classify and condense the differences
//! 3. **Report**: [`validator::ChangeValidator`] aggregates per-host results
//!    into a deterministic, serializable report
//!
//! ## Modules
//!
//! - [`diff`]: Tree, prune and plan-set diff engines
//! - [`validator`]: Per-host validation orchestration and reports
//! - [`render`]: Render-service capability trait and HTTP client
//! - [`secrets`]: Vault secret reads for CI pipelines
//! - [`config`]: Tool settings parsing and validation
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```
//! use driftgate::diff::{ConfigTree, TreeDiffEngine, UnchangedPruner};
//!
//! let target = ConfigTree::from(serde_json::json!({"a": "1", "b": {"c": "2"}}));
//! let incoming = ConfigTree::from(serde_json::json!({"a": "1", "b": {"c": "3"}}));
//!
//! let diff = TreeDiffEngine::new().diff(&target, &incoming);
//! let report = UnchangedPruner::new().prune(&diff);
//! assert!(report.is_some()); // b.c was modified
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod config;
pub mod diff;
pub mod error;
pub mod render;
pub mod secrets;
pub mod validator;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{Settings, SettingsLoader};
pub use diff::{
    ChangeKind, ConfigTree, DiffNode, EnvironmentId, HostId, PlanId, PlanSetDiff, SetDiffEngine,
    TreeDiffEngine, UnchangedPruner,
};
pub use error::{DriftgateError, Result};
pub use render::{RenderClient, RenderSource};
pub use secrets::VaultClient;
pub use validator::{ChangeValidator, ConfigChangeReport, PlanChangeReport};
