// SPDX-License-Identifier: PMPL-1.0-or-later
//! Report generation for snapshots and diffs.
//!
//! Supports two output formats:
//! - Text: human-readable summary for terminals and CI logs
//! - JSON: the envelope or diff itself, for storage and tooling

use crate::diff::{Diff, StructureDiff, TabOrderDiff};
use crate::error::{DiffError, Side};
use crate::snapshot::{SnapshotData, SnapshotEnvelope, StructuralRecord, TabOrderRecord};
use serde::Serialize;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// Structured JSON
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

/// Render a captured snapshot
pub fn render_snapshot(envelope: &SnapshotEnvelope, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => snapshot_text(envelope),
        OutputFormat::Json => to_json(envelope),
    }
}

/// Render a diff
pub fn render_diff(diff: &Diff, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => diff_text(diff),
        OutputFormat::Json => to_json(diff),
    }
}

/// Render a rejected comparison
pub fn render_error(err: &DiffError, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format!("Error: {}\n", err),
        OutputFormat::Json => to_json(&err.to_json()),
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize report: {}\"}}", e))
}

fn snapshot_text(envelope: &SnapshotEnvelope) -> String {
    let mut output = String::new();

    output.push_str(&format!("=== Snapshotbot {} snapshot ===\n\n", envelope.kind));
    output.push_str(&format!("URL:      {}\n", envelope.url));
    if !envelope.title.is_empty() {
        output.push_str(&format!("Title:    {}\n", envelope.title));
    }
    output.push_str(&format!("Captured: {}\n", envelope.timestamp.to_rfc3339()));
    output.push_str(&format!(
        "Viewport: {}x{}\n\n",
        envelope.viewport.width, envelope.viewport.height
    ));

    let empty = envelope.data.is_null() || envelope.data.as_array().is_some_and(|a| a.is_empty());
    if empty {
        output.push_str("No records captured.\n");
        return output;
    }

    let snapshot = match envelope.to_snapshot(Side::New) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            output.push_str(&format!("ERROR: {}\n", e));
            return output;
        }
    };

    let count = match &snapshot.data {
        SnapshotData::Structure(scan) => {
            for record in &scan.structural_elements {
                output.push_str(&format!("{}{}\n", "  ".repeat(record.level), structural_line(record)));
            }
            scan.structural_elements.len()
        }
        SnapshotData::TabOrder(records) => {
            for record in records {
                output.push_str(&format!("{:>3}. {}\n", record.order, tab_line(record)));
            }
            records.len()
        }
    };

    output.push_str(&format!("\n{} record(s)\n", count));
    if envelope.truncated {
        output.push_str("WARNING: scan truncated, snapshot is incomplete\n");
    }
    if envelope.shadow_roots_skipped > 0 {
        output.push_str(&format!(
            "NOTE: {} closed shadow root(s) skipped\n",
            envelope.shadow_roots_skipped
        ));
    }

    output
}

fn diff_text(diff: &Diff) -> String {
    let mut output = String::new();

    output.push_str(&format!("=== Snapshotbot {} diff ===\n\n", diff.kind()));
    let (total_old, total_new) = diff.totals();
    output.push_str(&format!("Old: {} record(s), new: {} record(s)\n\n", total_old, total_new));

    if diff.is_empty() {
        output.push_str("No changes.\n");
        return output;
    }

    match diff {
        Diff::Structure(d) => structure_sections(d, &mut output),
        Diff::TabOrder(d) => tab_order_sections(d, &mut output),
    }

    output.push_str(&format!(
        "RESULT: {} added, {} removed, {} moved\n",
        diff.added_count(),
        diff.removed_count(),
        diff.changed_count()
    ));
    output
}

fn structure_sections(diff: &StructureDiff, output: &mut String) {
    if !diff.added.is_empty() {
        output.push_str(&format!("--- Added ({}) ---\n", diff.added.len()));
        for record in &diff.added {
            output.push_str(&format!("+ {}\n", structural_line(record)));
        }
        output.push('\n');
    }
    if !diff.removed.is_empty() {
        output.push_str(&format!("--- Removed ({}) ---\n", diff.removed.len()));
        for record in &diff.removed {
            output.push_str(&format!("- {}\n", structural_line(record)));
            if let Some(rect) = record.rect {
                output.push_str(&format!(
                    "  Last seen at ({}, {}) {}x{}\n",
                    rect.x, rect.y, rect.width, rect.height
                ));
            }
        }
        output.push('\n');
    }
}

fn tab_order_sections(diff: &TabOrderDiff, output: &mut String) {
    if !diff.added.is_empty() {
        output.push_str(&format!("--- Added ({}) ---\n", diff.added.len()));
        for record in &diff.added {
            output.push_str(&format!("+ #{} {}\n", record.order, tab_line(record)));
        }
        output.push('\n');
    }
    if !diff.removed.is_empty() {
        output.push_str(&format!("--- Removed ({}) ---\n", diff.removed.len()));
        for record in &diff.removed {
            output.push_str(&format!("- #{} {}\n", record.order, tab_line(record)));
        }
        output.push('\n');
    }
    if !diff.changed.is_empty() {
        output.push_str(&format!("--- Moved ({}) ---\n", diff.changed.len()));
        for change in &diff.changed {
            output.push_str(&format!(
                "~ #{} -> #{} {}\n",
                change.old_order,
                change.new_order,
                tab_line(&change.record)
            ));
        }
        output.push('\n');
    }
}

fn structural_line(record: &StructuralRecord) -> String {
    let mut line = format!("[{}] <{}>", record.kind, record.tag);
    if let Some(ref role) = record.role {
        line.push_str(&format!(" role={}", role));
    }
    if let Some(ref name) = record.name {
        if !name.is_empty() {
            line.push_str(&format!(" \"{}\"", name));
        }
    }
    if let Some(ref frame) = record.frame {
        line.push_str(&format!(" (in frame {})", frame.src));
    }
    line.push_str(&format!("  {}", record.path));
    line
}

fn tab_line(record: &TabOrderRecord) -> String {
    let mut line = format!("{} \"{}\"", record.role, record.name);
    if let Some(tabindex) = record.tabindex {
        line.push_str(&format!(" tabindex={}", tabindex));
    }
    if !record.path.is_empty() {
        line.push_str(&format!("  {}", record.path));
    }
    line
}
