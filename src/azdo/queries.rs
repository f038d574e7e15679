//! WIQL query builders.
//!
//! WIQL (Work Item Query Language) is the query facility of the Azure
//! DevOps work-item API. These builders only select ids; full records are
//! fetched afterwards through the batch endpoint.

/// Query for work items currently in one of the given active states.
pub fn active_work(states: &[String]) -> String {
    format!(
        "SELECT [System.Id] FROM WorkItems \
         WHERE [System.TeamProject] = @project \
         AND [System.State] IN ({}) \
         ORDER BY [System.ChangedDate] DESC",
        quoted_list(states)
    )
}

/// Query for user stories, regardless of state.
pub fn user_stories() -> String {
    "SELECT [System.Id] FROM WorkItems \
     WHERE [System.TeamProject] = @project \
     AND [System.WorkItemType] = 'User Story' \
     ORDER BY [System.ChangedDate] DESC"
        .to_string()
}

/// Render a WIQL string list, escaping embedded single quotes.
fn quoted_list(values: &[String]) -> String {
    values
        .iter()
        .map(|v| format!("'{}'", v.replace('\'', "''")))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_work_lists_states() {
        let states = vec!["Active".to_string(), "In Progress".to_string()];
        let wiql = active_work(&states);
        assert!(wiql.contains("'Active', 'In Progress'"));
        assert!(wiql.contains("[System.TeamProject] = @project"));
        assert!(wiql.contains("ORDER BY [System.ChangedDate] DESC"));
    }

    #[test]
    fn test_quoted_list_escapes_quotes() {
        let states = vec!["O'Brien's State".to_string()];
        assert_eq!(quoted_list(&states), "'O''Brien''s State'");
    }

    #[test]
    fn test_user_stories_filters_type() {
        assert!(user_stories().contains("[System.WorkItemType] = 'User Story'"));
    }
}
