//! Output generation.
//!
//! The aggregation result is pure data; this module turns it into table,
//! CSV, or JSON text. Nothing here mutates the result.

use crate::cli::GroupBy;
use crate::models::{AggregationResult, SprintWindow, WorkItem};
use crate::status::StatusReport;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::info;

/// CSV header, fixed. Consumers parse this line verbatim.
pub const CSV_HEADER: &str = "ID,Title,Type,State,Priority,Assigned To,Days in State,Remaining Work";

/// Deliver rendered output: to `path` when given, to stdout otherwise.
pub fn emit(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
            info!("Output written to {}", path.display());
        }
        None => print!("{}", content),
    }
    Ok(())
}

/// Render the aggregation result as pretty-printed JSON.
pub fn render_json(result: &AggregationResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

/// Render the aggregation result as CSV.
///
/// One row per item, walking assignee buckets in first-seen order. String
/// fields containing commas, quotes, or spaces are quoted.
pub fn render_csv(result: &AggregationResult, now: DateTime<Utc>) -> String {
    let mut output = String::new();
    output.push_str(CSV_HEADER);
    output.push('\n');

    for (_, items) in result.by_assignee.iter() {
        for item in items {
            output.push_str(&csv_row(item, now));
            output.push('\n');
        }
    }

    output
}

fn csv_row(item: &WorkItem, now: DateTime<Utc>) -> String {
    let fields = [
        item.id.to_string(),
        csv_quote(&item.title),
        csv_quote(&item.item_type.to_string()),
        csv_quote(&item.state),
        item.priority.map(|p| p.to_string()).unwrap_or_default(),
        csv_quote(&item.assignee),
        item.days_in_state(now)
            .map(|d| d.to_string())
            .unwrap_or_default(),
        item.remaining_work.map(format_hours).unwrap_or_default(),
    ];
    fields.join(",")
}

/// Quote a CSV field when it contains commas, quotes, or spaces.
/// Embedded quotes are doubled per RFC 4180.
fn csv_quote(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains(' ') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Render the aggregation result as a text table.
///
/// The main section groups by `group_by` (assignee by default); state and
/// type counts and the blocked list always follow.
pub fn render_table(result: &AggregationResult, group_by: GroupBy, now: DateTime<Utc>) -> String {
    let mut output = String::new();

    if let Some(sprint) = &result.sprint {
        output.push_str(&sprint_label(sprint));
        output.push_str("\n\n");
    }

    output.push_str(&format!(
        "Total items: {}   Remaining work: {}h\n\n",
        result.summary.total,
        format_hours(result.summary.total_remaining)
    ));

    match group_by {
        GroupBy::Assignee => {
            output.push_str(&items_section("By assignee", &result.by_assignee, now));
        }
        GroupBy::Priority => {
            output.push_str(&priority_section(result, now));
        }
        GroupBy::State => {
            output.push_str(&counts_section("By state", &result.by_state));
        }
        GroupBy::Type => {
            output.push_str(&counts_section("By type", &result.by_type));
        }
    }

    if !matches!(group_by, GroupBy::State) {
        output.push_str(&counts_section("By state", &result.by_state));
    }
    if !matches!(group_by, GroupBy::Type) {
        output.push_str(&counts_section("By type", &result.by_type));
    }
    output.push_str(&blocked_section(&result.blocked_items, now));

    output
}

fn sprint_label(sprint: &SprintWindow) -> String {
    match (sprint.start, sprint.finish) {
        (Some(start), Some(finish)) => {
            format!("Sprint: {} ({} to {})", sprint.name, start, finish)
        }
        _ => format!("Sprint: {}", sprint.name),
    }
}

fn items_section(
    title: &str,
    groups: &crate::models::GroupedItems,
    now: DateTime<Utc>,
) -> String {
    let mut section = String::new();
    section.push_str(&format!("{}:\n", title));

    if groups.is_empty() {
        section.push_str("  (no items)\n");
    }
    for (key, items) in groups.iter() {
        section.push_str(&format!("  {} ({})\n", key, items.len()));
        for item in items {
            section.push_str(&item_line(item, now));
        }
    }

    section.push('\n');
    section
}

fn priority_section(result: &AggregationResult, now: DateTime<Utc>) -> String {
    let mut section = String::new();
    section.push_str("By priority:\n");

    if result.by_priority.is_empty() {
        section.push_str("  (no prioritized items)\n");
    }
    for (priority, items) in result.by_priority.iter() {
        section.push_str(&format!("  Priority {} ({})\n", priority, items.len()));
        for item in items {
            section.push_str(&item_line(item, now));
        }
    }

    section.push('\n');
    section
}

fn counts_section(title: &str, counts: &crate::models::GroupedCounts) -> String {
    let mut section = String::new();
    section.push_str(&format!("{}:\n", title));

    if counts.is_empty() {
        section.push_str("  (none)\n");
    }
    for (key, count) in counts.iter() {
        section.push_str(&format!("  {:<20} {}\n", key, count));
    }

    section.push('\n');
    section
}

fn blocked_section(blocked: &[WorkItem], now: DateTime<Utc>) -> String {
    if blocked.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str(&format!("Blocked ({}):\n", blocked.len()));
    for item in blocked {
        section.push_str(&item_line(item, now));
    }
    section.push('\n');
    section
}

fn item_line(item: &WorkItem, now: DateTime<Utc>) -> String {
    let priority = item
        .priority
        .map(|p| format!("P{}", p))
        .unwrap_or_else(|| "-".to_string());
    let remaining = item
        .remaining_work
        .map(|w| format!("{}h", format_hours(w)))
        .unwrap_or_else(|| "-".to_string());
    let days = item
        .days_in_state(now)
        .map(|d| format!("{}d", d))
        .unwrap_or_else(|| "-".to_string());

    format!(
        "    #{:<6} {:<40.40} {:<12} {:<14} {:<4} {:>7} {:>5}\n",
        item.id,
        item.title,
        item.item_type.to_string(),
        item.state,
        priority,
        remaining,
        days
    )
}

/// Render hours without a trailing `.0` for whole values.
fn format_hours(hours: f64) -> String {
    if hours.fract() == 0.0 {
        format!("{}", hours as i64)
    } else {
        format!("{}", hours)
    }
}

/// Render a sprint list as text lines.
pub fn render_sprints(sprints: &[SprintWindow]) -> String {
    if sprints.is_empty() {
        return "No sprints found.\n".to_string();
    }

    let mut output = String::new();
    for sprint in sprints {
        output.push_str(&sprint_label(sprint));
        output.push('\n');
    }
    output
}

/// Render a status-scan report as text.
pub fn render_status(report: &StatusReport) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "PRDs:  {}\n",
        section_line(report.prds.total, report.prds.found)
    ));
    output.push_str(&format!(
        "Epics: {}\n",
        section_line(report.epics.total, report.epics.found)
    ));
    if report.tasks.found {
        output.push_str(&format!(
            "Tasks: {} ({} open, {} closed)\n",
            report.tasks.total, report.tasks.open, report.tasks.closed
        ));
    } else {
        output.push_str("Tasks: (directory not found)\n");
    }

    output
}

fn section_line(total: usize, found: bool) -> String {
    if found {
        total.to_string()
    } else {
        "(directory not found)".to_string()
    }
}
