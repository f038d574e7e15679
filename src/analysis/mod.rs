//! Work-item normalization, filtering, and aggregation.

pub mod aggregator;
pub mod normalizer;

pub use aggregator::aggregate;
pub use normalizer::{normalize_batch, normalize_record};

use crate::models::{WorkItem, WorkItemType, UNASSIGNED};

/// Pre-aggregation filters.
///
/// The aggregator itself never filters, so every narrowing the CLI offers
/// is applied here, to the normalized batch, before aggregation.
#[derive(Debug, Clone)]
pub struct FilterOptions {
    /// Substring match on the assignee display name, case-insensitive.
    pub user: Option<String>,
    /// Exact state match, case-insensitive.
    pub state: Option<String>,
    /// Exact work-item type match.
    pub item_type: Option<WorkItemType>,
    /// When false, items bucketed under [`UNASSIGNED`] are dropped.
    pub include_unassigned: bool,
    /// Cap on the number of items kept, applied last.
    pub limit: Option<usize>,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            user: None,
            state: None,
            item_type: None,
            include_unassigned: true,
            limit: None,
        }
    }
}

/// Apply the filters in place, preserving input order.
pub fn filter_items(items: &mut Vec<WorkItem>, opts: &FilterOptions) {
    if let Some(user) = &opts.user {
        let needle = user.to_lowercase();
        items.retain(|item| item.assignee.to_lowercase().contains(&needle));
    }

    if let Some(state) = &opts.state {
        items.retain(|item| item.state.eq_ignore_ascii_case(state));
    }

    if let Some(item_type) = &opts.item_type {
        items.retain(|item| &item.item_type == item_type);
    }

    if !opts.include_unassigned {
        items.retain(|item| item.assignee != UNASSIGNED);
    }

    if let Some(limit) = opts.limit {
        items.truncate(limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_item(id: u64, assignee: &str, state: &str, item_type: WorkItemType) -> WorkItem {
        WorkItem {
            id,
            title: format!("Item {}", id),
            item_type,
            state: state.to_string(),
            assignee: assignee.to_string(),
            priority: None,
            remaining_work: None,
            tags: Vec::new(),
            changed_date: None,
        }
    }

    fn sample() -> Vec<WorkItem> {
        vec![
            make_item(1, "Jane Smith", "Active", WorkItemType::Task),
            make_item(2, "John Doe", "In Progress", WorkItemType::Bug),
            make_item(3, UNASSIGNED, "Active", WorkItemType::Task),
            make_item(4, "Jane Smith", "Closed", WorkItemType::UserStory),
        ]
    }

    #[test]
    fn test_user_filter_is_substring_case_insensitive() {
        let mut items = sample();
        filter_items(
            &mut items,
            &FilterOptions {
                user: Some("jane".to_string()),
                ..FilterOptions::default()
            },
        );
        let ids: Vec<u64> = items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 4]);
    }

    #[test]
    fn test_state_filter_exact_case_insensitive() {
        let mut items = sample();
        filter_items(
            &mut items,
            &FilterOptions {
                state: Some("active".to_string()),
                ..FilterOptions::default()
            },
        );
        let ids: Vec<u64> = items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_type_filter() {
        let mut items = sample();
        filter_items(
            &mut items,
            &FilterOptions {
                item_type: Some(WorkItemType::Bug),
                ..FilterOptions::default()
            },
        );
        let ids: Vec<u64> = items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn test_no_unassigned() {
        let mut items = sample();
        filter_items(
            &mut items,
            &FilterOptions {
                include_unassigned: false,
                ..FilterOptions::default()
            },
        );
        assert!(items.iter().all(|i| i.assignee != UNASSIGNED));
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn test_limit_applies_last() {
        let mut items = sample();
        filter_items(
            &mut items,
            &FilterOptions {
                state: Some("Active".to_string()),
                limit: Some(1),
                ..FilterOptions::default()
            },
        );
        let ids: Vec<u64> = items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_no_filters_keep_everything() {
        let mut items = sample();
        filter_items(&mut items, &FilterOptions::default());
        assert_eq!(items.len(), 4);
    }
}
