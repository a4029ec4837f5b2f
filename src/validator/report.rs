//! Validation report types.
//!
//! Reports are structured data for a calling automation pipeline. Whether a
//! non-empty report fails the pipeline is the caller's policy; the reports
//! only expose the predicate.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::diff::{DiffNode, EnvironmentId, HostId, PlanSetDiff};

/// Per-host configuration differences between two environments.
///
/// Hosts whose configuration did not change are absent: the per-host level
/// is the top of the diff tree and is pruned like any other branch.
#[derive(Debug, Serialize)]
pub struct ConfigChangeReport {
    /// Environment the change would merge into.
    pub target_environment: EnvironmentId,
    /// Environment carrying the proposed change.
    pub incoming_environment: EnvironmentId,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Number of hosts that were validated.
    pub hosts_checked: usize,
    /// Pruned diff tree per changed host.
    pub changes: BTreeMap<HostId, DiffNode>,
}

/// Per-host execution-plan differences between two environments.
///
/// Unlike the configuration report, every requested host appears here, even
/// with an empty diff object.
#[derive(Debug, Serialize)]
pub struct PlanChangeReport {
    /// Environment the change would merge into.
    pub target_environment: EnvironmentId,
    /// Environment carrying the proposed change.
    pub incoming_environment: EnvironmentId,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Number of hosts that were validated.
    pub hosts_checked: usize,
    /// Plan-step diff per host.
    pub changes: BTreeMap<HostId, PlanSetDiff>,
}

impl ConfigChangeReport {
    /// Returns true if any host's configuration would change.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }
}

impl PlanChangeReport {
    /// Returns true if any host's execution plan would change.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.changes.values().any(|diff| !diff.is_empty())
    }
}

impl fmt::Display for ConfigChangeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_changes() {
            writeln!(
                f,
                "Configuration changes between '{}' and '{}':",
                self.target_environment, self.incoming_environment
            )?;
            for host in self.changes.keys() {
                writeln!(f, "  - {host}")?;
            }
        } else {
            write!(
                f,
                "No configuration changes between '{}' and '{}' ({} hosts checked)",
                self.target_environment, self.incoming_environment, self.hosts_checked
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for PlanChangeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_changes() {
            writeln!(
                f,
                "Execution plan changes between '{}' and '{}':",
                self.target_environment, self.incoming_environment
            )?;
            for (host, diff) in &self.changes {
                writeln!(
                    f,
                    "  - {host}: {} added, {} removed",
                    diff.added.len(),
                    diff.removed.len()
                )?;
            }
        } else {
            write!(
                f,
                "No execution plan changes between '{}' and '{}' ({} hosts checked)",
                self.target_environment, self.incoming_environment, self.hosts_checked
            )?;
        }
        Ok(())
    }
}
