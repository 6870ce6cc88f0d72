// src/entity/time_entry.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{IdRef, NamedRef};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: u64,
    #[serde(default)]
    pub issue: Option<IdRef>,
    pub hours: f64,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub spent_on: Option<NaiveDate>,
    #[serde(default)]
    pub activity: Option<NamedRef>,
}

impl TimeEntry {
    pub fn comment_or_default(&self) -> &str {
        match self.comments.as_deref() {
            Some(c) if !c.is_empty() => c,
            _ => "No comment",
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TimeEntryList {
    #[serde(default)]
    pub time_entries: Vec<TimeEntry>,
}
