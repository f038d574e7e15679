//! Work-item aggregation.
//!
//! This module provides the grouping engine behind the `active` and
//! `stories` views: one pass over a normalized batch produces counts by
//! state and type, ordered item lists by assignee and priority, the blocked
//! subset, and headline totals.

use crate::models::{AggregationResult, GroupedCounts, GroupedItems, SprintWindow, WorkItem};

/// Aggregate a batch of normalized work items.
///
/// Pure and total: well-formed input never fails, and an empty batch yields
/// zero totals and empty groupings. Each item lands in exactly one bucket
/// per dimension; items without a priority are left out of `by_priority`
/// but still count toward `summary.total`. Grouping keys come out in
/// first-seen order, and `blocked_items` preserves input order.
///
/// `sprint` is carried through for labeling only. Any filtering (by user,
/// state, type, or sprint window) must happen before items reach this
/// function.
pub fn aggregate(items: &[WorkItem], sprint: Option<SprintWindow>) -> AggregationResult {
    let mut result = AggregationResult {
        sprint,
        ..AggregationResult::default()
    };

    for item in items {
        result.summary.total += 1;
        result.summary.total_remaining += item.remaining_work.unwrap_or(0.0);

        result.by_state.increment(&item.state);
        result.by_type.increment(&item.item_type.to_string());
        result.by_assignee.push(&item.assignee, item.clone());

        if let Some(priority) = item.priority {
            result.by_priority.push(&priority.to_string(), item.clone());
        }

        if item.is_blocked() {
            result.blocked_items.push(item.clone());
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{WorkItemType, UNASSIGNED};

    fn make_item(id: u64) -> WorkItem {
        WorkItem {
            id,
            title: format!("Item {}", id),
            item_type: WorkItemType::Task,
            state: "Active".to_string(),
            assignee: "John Doe".to_string(),
            priority: None,
            remaining_work: None,
            tags: Vec::new(),
            changed_date: None,
        }
    }

    #[test]
    fn test_empty_input_yields_zero_result() {
        let result = aggregate(&[], None);
        assert_eq!(result.summary.total, 0);
        assert_eq!(result.summary.total_remaining, 0.0);
        assert!(result.by_state.is_empty());
        assert!(result.by_type.is_empty());
        assert!(result.by_assignee.is_empty());
        assert!(result.by_priority.is_empty());
        assert!(result.blocked_items.is_empty());
    }

    #[test]
    fn test_two_item_scenario() {
        let items = vec![
            WorkItem {
                id: 1,
                item_type: WorkItemType::Task,
                state: "Active".to_string(),
                assignee: "John Doe".to_string(),
                remaining_work: Some(8.0),
                ..make_item(1)
            },
            WorkItem {
                id: 2,
                item_type: WorkItemType::Bug,
                state: "In Progress".to_string(),
                assignee: "Jane Smith".to_string(),
                remaining_work: Some(4.0),
                ..make_item(2)
            },
        ];

        let result = aggregate(&items, None);
        assert_eq!(result.summary.total, 2);
        assert_eq!(result.summary.total_remaining, 12.0);
        assert_eq!(result.by_state.get("Active"), Some(1));
        assert_eq!(result.by_state.get("In Progress"), Some(1));
        assert_eq!(result.by_type.get("Task"), Some(1));
        assert_eq!(result.by_type.get("Bug"), Some(1));
    }

    #[test]
    fn test_total_matches_input_length() {
        let items: Vec<WorkItem> = (1..=17).map(make_item).collect();
        let result = aggregate(&items, None);
        assert_eq!(result.summary.total, items.len());
    }

    #[test]
    fn test_type_counts_sum_to_total() {
        let mut items: Vec<WorkItem> = (1..=5).map(make_item).collect();
        items[1].item_type = WorkItemType::Bug;
        items[3].item_type = WorkItemType::UserStory;

        let result = aggregate(&items, None);
        assert_eq!(result.by_type.total(), result.summary.total);
    }

    #[test]
    fn test_absent_remaining_work_contributes_zero() {
        let mut items = vec![make_item(1), make_item(2), make_item(3)];
        items[0].remaining_work = Some(6.0);
        // items 2 and 3 carry no estimate

        let result = aggregate(&items, None);
        assert_eq!(result.summary.total, 3);
        assert_eq!(result.summary.total_remaining, 6.0);
    }

    #[test]
    fn test_unassigned_bucket() {
        let mut item = make_item(1);
        item.assignee = UNASSIGNED.to_string();

        let result = aggregate(&[item], None);
        assert_eq!(result.by_assignee.get(UNASSIGNED).map(<[_]>::len), Some(1));
    }

    #[test]
    fn test_blocked_detection_and_order() {
        let mut items = vec![make_item(1), make_item(2), make_item(3), make_item(4)];
        items[0].tags = vec!["BLOCKED".to_string()];
        items[2].tags = vec!["waiting".to_string(), "blocked-external".to_string()];
        items[3].tags = vec!["frontend".to_string()];

        let result = aggregate(&items, None);
        let blocked_ids: Vec<u64> = result.blocked_items.iter().map(|i| i.id).collect();
        assert_eq!(blocked_ids, vec![1, 3]);
    }

    #[test]
    fn test_missing_priority_omitted_but_counted() {
        let mut items = vec![make_item(1), make_item(2)];
        items[0].priority = Some(1);
        // item 2 has no priority

        let result = aggregate(&items, None);
        assert_eq!(result.summary.total, 2);
        assert_eq!(result.by_priority.len(), 1);
        assert_eq!(result.by_priority.get("1").map(<[_]>::len), Some(1));
    }

    #[test]
    fn test_grouping_keys_keep_first_seen_order() {
        let mut items = vec![make_item(1), make_item(2), make_item(3), make_item(4)];
        items[0].state = "Resolved".to_string();
        items[1].state = "Active".to_string();
        items[2].state = "Resolved".to_string();
        items[3].state = "New".to_string();

        let result = aggregate(&items, None);
        let keys: Vec<&str> = result.by_state.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["Resolved", "Active", "New"]);
    }

    #[test]
    fn test_sprint_window_is_label_only() {
        let sprint = SprintWindow {
            name: "Sprint 42".to_string(),
            start: None,
            finish: None,
        };

        let result = aggregate(&[make_item(1)], Some(sprint.clone()));
        // The window labels the result without shrinking it.
        assert_eq!(result.sprint, Some(sprint));
        assert_eq!(result.summary.total, 1);
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let mut items = vec![make_item(1), make_item(2), make_item(3)];
        items[0].tags = vec!["blocked".to_string()];
        items[1].priority = Some(2);
        items[2].remaining_work = Some(3.5);

        let first = aggregate(&items, None);
        let second = aggregate(&items, None);
        assert_eq!(first, second);
    }
}
