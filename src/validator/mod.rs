//! Validation orchestration.
//!
//! This module fans the diff engines out across many hosts: it fetches the
//! rendered data for the target and incoming environments through the
//! injected [`crate::render::RenderSource`] capability, runs the pure
//! computation stages, and aggregates a deterministic per-host report.

mod orchestrator;
mod report;

pub use orchestrator::ChangeValidator;
pub use report::{ConfigChangeReport, PlanChangeReport};
