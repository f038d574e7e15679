//! Work-item normalization.
//!
//! The Azure DevOps API returns work items as a nested field bag keyed by
//! dotted reference names (`System.Title`, `Microsoft.VSTS.Common.Priority`,
//! ...). This module flattens one raw record into a typed [`WorkItem`] so
//! the rest of the system never touches the wire shape.

use crate::error::Error;
use crate::models::{WorkItem, WorkItemType, UNASSIGNED};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, warn};

const F_TITLE: &str = "System.Title";
const F_TYPE: &str = "System.WorkItemType";
const F_STATE: &str = "System.State";
const F_ASSIGNED_TO: &str = "System.AssignedTo";
const F_PRIORITY: &str = "Microsoft.VSTS.Common.Priority";
const F_REMAINING: &str = "Microsoft.VSTS.Scheduling.RemainingWork";
const F_TAGS: &str = "System.Tags";
const F_CHANGED: &str = "System.ChangedDate";

/// Normalize one raw API record into a [`WorkItem`].
///
/// Fails with [`Error::MalformedRecord`] when the record carries no `id`.
/// Every other field is optional: missing assignee becomes [`UNASSIGNED`],
/// missing remaining work stays absent (and counts as 0 in totals), missing
/// tags become an empty set.
pub fn normalize_record(record: &Value) -> Result<WorkItem, Error> {
    let id = record
        .get("id")
        .and_then(Value::as_u64)
        .ok_or(Error::MalformedRecord)?;

    let fields = record.get("fields").unwrap_or(&Value::Null);

    let title = field_str(fields, F_TITLE).unwrap_or_default();
    let item_type = field_str(fields, F_TYPE)
        .map(WorkItemType::from)
        .unwrap_or(WorkItemType::Other("Unknown".to_string()));
    let state = field_str(fields, F_STATE).unwrap_or("Unknown").to_string();

    let priority = fields
        .get(F_PRIORITY)
        .and_then(Value::as_u64)
        .and_then(|p| u8::try_from(p).ok());

    let remaining_work = fields.get(F_REMAINING).and_then(Value::as_f64);

    Ok(WorkItem {
        id,
        title: title.to_string(),
        item_type,
        state,
        assignee: parse_assignee(fields.get(F_ASSIGNED_TO)),
        priority,
        remaining_work,
        tags: parse_tags(field_str(fields, F_TAGS).unwrap_or_default()),
        changed_date: parse_changed_date(id, field_str(fields, F_CHANGED)),
    })
}

/// Normalize a whole batch, skipping malformed records.
///
/// Batch policy: a record without an `id` is logged and dropped rather than
/// aborting the batch. One corrupt record must not hide the sprint view.
pub fn normalize_batch(records: &[Value]) -> Vec<WorkItem> {
    let mut items = Vec::with_capacity(records.len());
    let mut skipped = 0usize;

    for record in records {
        match normalize_record(record) {
            Ok(item) => items.push(item),
            Err(e) => {
                warn!("Skipping malformed work item record: {}", e);
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        warn!("Skipped {} malformed record(s) in batch", skipped);
    }

    items
}

fn field_str<'a>(fields: &'a Value, name: &str) -> Option<&'a str> {
    fields.get(name).and_then(Value::as_str)
}

/// The assigned-to field is an identity object with a `displayName` in
/// current API versions; very old responses carry a plain string.
fn parse_assignee(value: Option<&Value>) -> String {
    match value {
        Some(Value::Object(identity)) => identity
            .get("displayName")
            .and_then(Value::as_str)
            .unwrap_or(UNASSIGNED)
            .to_string(),
        Some(Value::String(name)) if !name.trim().is_empty() => name.trim().to_string(),
        _ => UNASSIGNED.to_string(),
    }
}

/// Split the semicolon-joined tag string, trimming whitespace and dropping
/// empties. Original case is preserved; matching lowercases on the fly.
fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(String::from)
        .collect()
}

fn parse_changed_date(id: u64, raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(e) => {
            debug!("Work item {}: unparseable changed date {:?}: {}", id, raw, e);
            None
        }
    }
}
