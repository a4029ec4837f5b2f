//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying validation
//! reports to the user in various formats.

use colored::Colorize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::diff::{ChangeKind, DiffNode, PlanId};
use crate::validator::{ConfigChangeReport, PlanChangeReport};

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Plan diff row for table display.
#[derive(Tabled)]
struct PlanDiffRow {
    #[tabled(rename = "Host")]
    host: String,
    #[tabled(rename = "Added")]
    added: String,
    #[tabled(rename = "Removed")]
    removed: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a configuration change report for display.
    #[must_use]
    pub fn format_config_report(&self, report: &ConfigChangeReport) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report).unwrap_or_default(),
            OutputFormat::Text => Self::format_config_report_text(report),
        }
    }

    /// Formats a configuration report as text.
    fn format_config_report_text(report: &ConfigChangeReport) -> String {
        if !report.has_changes() {
            return format!(
                "{} No configuration changes between '{}' and '{}' ({} hosts checked).\n",
                "✓".green(),
                report.target_environment,
                report.incoming_environment,
                report.hosts_checked
            );
        }

        let mut output = String::new();
        let _ = writeln!(
            output,
            "Configuration changes: '{}' -> '{}' ({} of {} hosts changed)\n",
            report.target_environment,
            report.incoming_environment,
            report.changes.len(),
            report.hosts_checked
        );

        for (host, node) in &report.changes {
            let _ = writeln!(output, "{}", host.to_string().bold());
            Self::write_diff_node(&mut output, node, 1);
        }

        output
    }

    /// Writes one diff node as indented text, recursively.
    fn write_diff_node(output: &mut String, node: &DiffNode, depth: usize) {
        if let DiffNode::Branch(children) = node {
            for (key, child) in children {
                let indent = "  ".repeat(depth);
                match child {
                    DiffNode::Leaf(kind) => {
                        let _ = writeln!(output, "{indent}{key}: {}", Self::colorize(*kind));
                    }
                    DiffNode::Branch(_) => {
                        let _ = writeln!(output, "{indent}{key}:");
                        Self::write_diff_node(output, child, depth + 1);
                    }
                }
            }
        }
    }

    /// Colors a change classification for terminal display.
    fn colorize(kind: ChangeKind) -> String {
        let label = kind.to_string();
        match kind {
            ChangeKind::Added => label.green().to_string(),
            ChangeKind::Removed => label.red().to_string(),
            ChangeKind::Modified => label.yellow().to_string(),
            ChangeKind::Unchanged => label.dimmed().to_string(),
        }
    }

    /// Formats an execution-plan change report for display.
    #[must_use]
    pub fn format_plan_report(&self, report: &PlanChangeReport) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report).unwrap_or_default(),
            OutputFormat::Text => Self::format_plan_report_text(report),
        }
    }

    /// Formats a plan report as text.
    fn format_plan_report_text(report: &PlanChangeReport) -> String {
        if !report.has_changes() {
            return format!(
                "{} No execution plan changes between '{}' and '{}' ({} hosts checked).\n",
                "✓".green(),
                report.target_environment,
                report.incoming_environment,
                report.hosts_checked
            );
        }

        let mut output = String::new();
        let _ = writeln!(
            output,
            "Execution plan changes: '{}' -> '{}'\n",
            report.target_environment, report.incoming_environment
        );

        let rows: Vec<PlanDiffRow> = report
            .changes
            .iter()
            .map(|(host, diff)| PlanDiffRow {
                host: host.to_string(),
                added: Self::join_ids(&diff.added),
                removed: Self::join_ids(&diff.removed),
            })
            .collect();

        let table = Table::new(rows).to_string();
        output.push_str(&table);
        output.push('\n');

        let changed = report.changes.values().filter(|d| !d.is_empty()).count();
        let _ = write!(
            output,
            "\nPlan: {} of {} hosts changed\n",
            changed.to_string().yellow(),
            report.hosts_checked
        );

        output
    }

    /// Joins plan ids for table display.
    fn join_ids<'a>(ids: impl IntoIterator<Item = &'a PlanId>) -> String {
        let joined = ids
            .into_iter()
            .map(PlanId::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        if joined.is_empty() {
            String::from("-")
        } else {
            joined
        }
    }

    /// Formats a secret value for display. Always JSON: secrets are
    /// structured data, not prose.
    #[must_use]
    pub fn format_secret(&self, value: &serde_json::Value) -> String {
        let _ = self.format;
        serde_json::to_string_pretty(value).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{ConfigTree, EnvironmentId, HostId, PlanSetDiff, TreeDiffEngine, UnchangedPruner};
    use chrono::Utc;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn config_report(changes: BTreeMap<HostId, DiffNode>) -> ConfigChangeReport {
        ConfigChangeReport {
            target_environment: EnvironmentId::from("base"),
            incoming_environment: EnvironmentId::from("dev.pr1"),
            generated_at: Utc::now(),
            hosts_checked: 2,
            changes,
        }
    }

    #[test]
    fn test_clean_config_report_text() {
        let formatter = OutputFormatter::new(OutputFormat::Text);
        let text = formatter.format_config_report(&config_report(BTreeMap::new()));

        assert!(text.contains("No configuration changes"));
        assert!(text.contains("2 hosts checked"));
    }

    #[test]
    fn test_changed_config_report_text_lists_fields() {
        colored::control::set_override(false);

        let engine = TreeDiffEngine::new();
        let pruner = UnchangedPruner::new();
        let diff = engine.diff(
            &ConfigTree::from(json!({"common": {"key": "old"}})),
            &ConfigTree::from(json!({"common": {"key": "new"}})),
        );
        let pruned = pruner.prune(&diff).unwrap();

        let mut changes = BTreeMap::new();
        changes.insert(HostId::from("web01.local"), pruned);

        let formatter = OutputFormatter::new(OutputFormat::Text);
        let text = formatter.format_config_report(&config_report(changes));

        assert!(text.contains("web01.local"));
        assert!(text.contains("key: modified"));
    }

    #[test]
    fn test_config_report_json_shape() {
        let mut changes = BTreeMap::new();
        changes.insert(
            HostId::from("web01.local"),
            DiffNode::Leaf(ChangeKind::Modified),
        );

        let formatter = OutputFormatter::new(OutputFormat::Json);
        let text = formatter.format_config_report(&config_report(changes));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["target_environment"], json!("base"));
        assert_eq!(value["changes"]["web01.local"], json!("modified"));
    }

    #[test]
    fn test_plan_report_text_includes_every_host() {
        colored::control::set_override(false);

        let mut changes = BTreeMap::new();
        changes.insert(HostId::from("web01.local"), PlanSetDiff::default());
        changes.insert(
            HostId::from("web02.local"),
            PlanSetDiff {
                added: [PlanId::from("s3")].into_iter().collect(),
                removed: [PlanId::from("s1")].into_iter().collect(),
            },
        );

        let report = PlanChangeReport {
            target_environment: EnvironmentId::from("base"),
            incoming_environment: EnvironmentId::from("dev.pr1"),
            generated_at: Utc::now(),
            hosts_checked: 2,
            changes,
        };

        let formatter = OutputFormatter::new(OutputFormat::Text);
        let text = formatter.format_plan_report(&report);

        assert!(text.contains("web01.local"));
        assert!(text.contains("web02.local"));
        assert!(text.contains("s3"));
        assert!(text.contains("1 of 2 hosts changed"));
    }
}
