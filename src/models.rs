//! Data models for the work-item status CLI.
//!
//! This module contains the core data structures used throughout the
//! application for representing work items, sprint windows, and
//! aggregation results.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel assignee for work items with no assigned-to field.
pub const UNASSIGNED: &str = "Unassigned";

/// The kind of a work item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkItemType {
    Task,
    Bug,
    UserStory,
    Feature,
    Epic,
    Other(String),
}

impl fmt::Display for WorkItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkItemType::Task => write!(f, "Task"),
            WorkItemType::Bug => write!(f, "Bug"),
            WorkItemType::UserStory => write!(f, "User Story"),
            WorkItemType::Feature => write!(f, "Feature"),
            WorkItemType::Epic => write!(f, "Epic"),
            WorkItemType::Other(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for WorkItemType {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "task" => WorkItemType::Task,
            "bug" => WorkItemType::Bug,
            "user story" | "userstory" | "user_story" => WorkItemType::UserStory,
            "feature" => WorkItemType::Feature,
            "epic" => WorkItemType::Epic,
            _ => WorkItemType::Other(s.to_string()),
        }
    }
}

/// A normalized work item, flattened from the raw API field bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Work item id, unique within one aggregation batch.
    pub id: u64,
    /// Title of the work item.
    pub title: String,
    /// Kind of the work item.
    #[serde(rename = "type")]
    pub item_type: WorkItemType,
    /// Free-form state string (e.g. "Active", "In Progress", "Closed").
    pub state: String,
    /// Display name of the assignee, or [`UNASSIGNED`].
    pub assignee: String,
    /// Priority, lower is more urgent. Absent for unprioritized items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    /// Remaining work in hours. Absent contributes 0 to totals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_work: Option<f64>,
    /// Tags, split from the raw semicolon-joined field, original case kept.
    pub tags: Vec<String>,
    /// Last state-change timestamp, used to compute days in state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed_date: Option<DateTime<Utc>>,
}

impl WorkItem {
    /// Whether any tag marks this item as blocked.
    ///
    /// Matching is a case-insensitive substring test, so "Blocked",
    /// "blocked-external", and "BLOCKED: vendor" all qualify.
    pub fn is_blocked(&self) -> bool {
        self.tags
            .iter()
            .any(|tag| tag.to_lowercase().contains("blocked"))
    }

    /// Whole days between the last state change and `now`.
    ///
    /// Returns `None` when the item carries no changed date.
    pub fn days_in_state(&self, now: DateTime<Utc>) -> Option<i64> {
        self.changed_date
            .map(|changed| (now - changed).num_days().max(0))
    }
}

/// A labeled sprint date range.
///
/// Informational only: the aggregator copies it into the result so the
/// presentation layer can label output, but never filters by it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SprintWindow {
    /// Sprint name (e.g. "Sprint 42").
    pub name: String,
    /// First day of the sprint, if the API reported one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDate>,
    /// Last day of the sprint, if the API reported one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish: Option<NaiveDate>,
}

/// Count map whose keys keep first-seen insertion order.
///
/// Grouping keys must come out in the order items first mentioned them, so
/// a hash map will not do. Bucket counts per invocation are tiny, so the
/// linear-scan insert is fine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedCounts {
    entries: Vec<(String, usize)>,
}

impl GroupedCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one to the count for `key`, creating it at the end if unseen.
    pub fn increment(&mut self, key: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, count)) => *count += 1,
            None => self.entries.push((key.to_string(), 1)),
        }
    }

    pub fn get(&self, key: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, count)| *count)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Sum of all counts across keys.
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, count)| count).sum()
    }
}

impl Serialize for GroupedCounts {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, count) in &self.entries {
            map.serialize_entry(key, count)?;
        }
        map.end()
    }
}

/// Item-list map whose keys keep first-seen insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedItems {
    entries: Vec<(String, Vec<WorkItem>)>,
}

impl GroupedItems {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `item` to the bucket for `key`, creating it at the end if unseen.
    pub fn push(&mut self, key: &str, item: WorkItem) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, items)) => items.push(item),
            None => self.entries.push((key.to_string(), vec![item])),
        }
    }

    pub fn get(&self, key: &str) -> Option<&[WorkItem]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, items)| items.as_slice())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[WorkItem])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl Serialize for GroupedItems {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, items) in &self.entries {
            map.serialize_entry(key, items)?;
        }
        map.end()
    }
}

/// Headline totals for one aggregation batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    /// Count of input items.
    pub total: usize,
    /// Sum of remaining work across items, absent treated as 0.
    pub total_remaining: f64,
}

/// The complete output of one aggregation pass.
///
/// Computed once per invocation and immutable thereafter; the presentation
/// layer only reads it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregationResult {
    /// Headline totals.
    pub summary: Summary,
    /// Item count per state, first-seen order.
    pub by_state: GroupedCounts,
    /// Item count per work-item type, first-seen order.
    pub by_type: GroupedCounts,
    /// Items per assignee, first-seen order, [`UNASSIGNED`] included.
    pub by_assignee: GroupedItems,
    /// Items per priority. Items without a priority are omitted here but
    /// still counted in `summary.total`.
    pub by_priority: GroupedItems,
    /// Items whose tags mark them blocked, in input order.
    pub blocked_items: Vec<WorkItem>,
    /// The sprint window this batch was fetched for, label only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sprint: Option<SprintWindow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_item(id: u64, tags: &[&str]) -> WorkItem {
        WorkItem {
            id,
            title: format!("Item {}", id),
            item_type: WorkItemType::Task,
            state: "Active".to_string(),
            assignee: UNASSIGNED.to_string(),
            priority: None,
            remaining_work: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            changed_date: None,
        }
    }

    #[test]
    fn test_work_item_type_from_str() {
        assert_eq!(WorkItemType::from("Task"), WorkItemType::Task);
        assert_eq!(WorkItemType::from("user story"), WorkItemType::UserStory);
        assert_eq!(WorkItemType::from("BUG"), WorkItemType::Bug);
        assert_eq!(
            WorkItemType::from("Issue"),
            WorkItemType::Other("Issue".to_string())
        );
    }

    #[test]
    fn test_work_item_type_display() {
        assert_eq!(WorkItemType::UserStory.to_string(), "User Story");
        assert_eq!(
            WorkItemType::Other("Impediment".into()).to_string(),
            "Impediment"
        );
    }

    #[test]
    fn test_is_blocked_substring_any_case() {
        assert!(make_item(1, &["Blocked"]).is_blocked());
        assert!(make_item(2, &["blocked-external"]).is_blocked());
        assert!(make_item(3, &["BLOCKED: vendor"]).is_blocked());
        assert!(!make_item(4, &["frontend", "urgent"]).is_blocked());
        assert!(!make_item(5, &[]).is_blocked());
    }

    #[test]
    fn test_days_in_state() {
        let now = Utc::now();
        let mut item = make_item(1, &[]);
        assert_eq!(item.days_in_state(now), None);

        item.changed_date = Some(now - chrono::Duration::days(5));
        assert_eq!(item.days_in_state(now), Some(5));
    }

    #[test]
    fn test_grouped_counts_insertion_order() {
        let mut counts = GroupedCounts::new();
        counts.increment("Active");
        counts.increment("In Progress");
        counts.increment("Active");
        counts.increment("Closed");

        let keys: Vec<&str> = counts.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["Active", "In Progress", "Closed"]);
        assert_eq!(counts.get("Active"), Some(2));
        assert_eq!(counts.get("Closed"), Some(1));
        assert_eq!(counts.total(), 4);
    }

    #[test]
    fn test_grouped_counts_serializes_as_object() {
        let mut counts = GroupedCounts::new();
        counts.increment("Active");
        counts.increment("Active");
        counts.increment("Closed");

        let json = serde_json::to_string(&counts).unwrap();
        assert_eq!(json, r#"{"Active":2,"Closed":1}"#);
    }

    #[test]
    fn test_grouped_items_buckets_preserve_order() {
        let mut groups = GroupedItems::new();
        groups.push("Jane", make_item(1, &[]));
        groups.push("John", make_item(2, &[]));
        groups.push("Jane", make_item(3, &[]));

        let keys: Vec<&str> = groups.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["Jane", "John"]);

        let jane = groups.get("Jane").unwrap();
        assert_eq!(jane.len(), 2);
        assert_eq!(jane[0].id, 1);
        assert_eq!(jane[1].id, 3);
    }
}
