// src/entity/enumeration.rs
use serde::{Deserialize, Serialize};

/// An entry of `GET /issue_statuses.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueStatus {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub is_closed: bool,
}

/// An entry of `GET /enumerations/time_entry_activities.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeEntryActivity {
    pub id: u64,
    pub name: String,
    /// Older Redmine versions omit the flag; those activities count as active.
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub is_default: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub(crate) struct IssueStatusList {
    pub issue_statuses: Vec<IssueStatus>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TimeEntryActivityList {
    pub time_entry_activities: Vec<TimeEntryActivity>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_active_defaults_to_true() {
        let activity: TimeEntryActivity =
            serde_json::from_str(r#"{"id": 9, "name": "Development"}"#).unwrap();
        assert!(activity.active);
        assert!(!activity.is_default);

        let activity: TimeEntryActivity =
            serde_json::from_str(r#"{"id": 10, "name": "Design", "active": false}"#).unwrap();
        assert!(!activity.active);
    }

    #[test]
    fn test_status_list_decodes() {
        let list: IssueStatusList = serde_json::from_str(
            r#"{"issue_statuses": [{"id": 1, "name": "New", "is_closed": false}, {"id": 5, "name": "Closed", "is_closed": true}]}"#,
        )
        .unwrap();
        assert_eq!(list.issue_statuses.len(), 2);
        assert!(list.issue_statuses[1].is_closed);
    }
}
