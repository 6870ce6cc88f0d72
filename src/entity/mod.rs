mod enumeration;
mod issue;
mod time_entry;
mod user;

pub use enumeration::{IssueStatus, TimeEntryActivity};
pub use issue::{CustomFieldValue, Issue, IssueChild, Journal};
pub use time_entry::TimeEntry;
pub use user::User;

pub(crate) use enumeration::{IssueStatusList, TimeEntryActivityList};
pub(crate) use issue::{IssueEnvelope, IssueList};
pub(crate) use time_entry::TimeEntryList;
pub(crate) use user::{UserEnvelope, UserList};

use serde::{Deserialize, Serialize};

/// Reference to another tracker object as embedded in Redmine payloads,
/// e.g. `"project": {"id": 1, "name": "Website"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef {
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

/// Reference that carries only an ID, e.g. `"parent": {"id": 12}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRef {
    pub id: u64,
}
