//! Status changes, including the fields derived when an issue is completed.

use chrono::NaiveDate;
use serde_json::{json, Map, Value};

use super::normalize::normalize_status_name;
use super::MetadataResolver;
use crate::cache::{MetadataCache, ACT_FINISH, ACT_START};
use crate::error::{RedmineError, Result};

/// Normalized name of the status that triggers completion fields.
pub const COMPLETED_STATUS: &str = "completed";

/// What the caller asked for.
#[derive(Debug, Clone)]
pub struct StatusChangeRequest {
    pub issue_id: u64,
    pub status_name: String,
    pub act_start: Option<NaiveDate>,
    pub act_finish: Option<NaiveDate>,
}

/// Dates used for a completed transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionDates {
    pub act_start: NaiveDate,
    pub act_finish: NaiveDate,
    /// Semantic keys whose custom fields were written
    pub recorded: Vec<&'static str>,
}

/// A resolved status change, ready to send.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub issue_id: u64,
    pub status_name: String,
    pub status_id: u64,
    pub completion: Option<CompletionDates>,
    /// Body of `PUT /issues/{id}.json`
    pub payload: Value,
}

/// Resolve `request` against the cache and build the issue update.
///
/// An unknown status fails before anything is sent. For a completed
/// transition missing dates default to `today`, `done_ratio` is set to 100
/// and the actual start/finish custom fields are attached when the tracker
/// has them; when it does not the change goes ahead without them.
pub async fn prepare_status_change(
    resolver: &MetadataResolver,
    cache: &mut MetadataCache,
    request: StatusChangeRequest,
    today: NaiveDate,
) -> Result<StatusChange> {
    let key = normalize_status_name(&request.status_name);
    let status_id = cache.status_id(&key).ok_or_else(|| RedmineError::UnknownStatus {
        provided: request.status_name.clone(),
        valid: cache.status_names(),
    })?;

    let mut issue = Map::new();
    issue.insert("status_id".to_string(), json!(status_id));

    let mut completion = None;
    if key == COMPLETED_STATUS {
        let act_start = request.act_start.unwrap_or(today);
        let act_finish = request.act_finish.unwrap_or(today);

        let fields = resolver.resolve_custom_fields(request.issue_id, cache).await;
        let mut custom_fields = Vec::new();
        let mut recorded = Vec::new();
        for (field_key, date) in [(ACT_START, act_start), (ACT_FINISH, act_finish)] {
            if let Some(id) = fields.get(field_key) {
                custom_fields.push(json!({"id": id, "value": date.to_string()}));
                recorded.push(field_key);
            }
        }

        if !custom_fields.is_empty() {
            issue.insert("custom_fields".to_string(), Value::Array(custom_fields));
        }
        issue.insert("done_ratio".to_string(), json!(100));

        completion = Some(CompletionDates {
            act_start,
            act_finish,
            recorded,
        });
    }

    Ok(StatusChange {
        issue_id: request.issue_id,
        status_name: request.status_name,
        status_id,
        completion,
        payload: json!({ "issue": Value::Object(issue) }),
    })
}

impl StatusChange {
    pub fn path(&self) -> String {
        format!("/issues/{}.json", self.issue_id)
    }

    /// Human-readable summary of what was changed.
    ///
    /// Only dates that were written to a custom field are reported.
    pub fn describe(&self) -> String {
        let mut msg = format!(
            "Updated issue #{} to status '{}'",
            self.issue_id, self.status_name
        );
        if let Some(dates) = &self.completion {
            if dates.recorded.is_empty() {
                msg.push_str("\n   (no actual date fields found on this tracker; dates not recorded)");
                return msg;
            }
            let labelled = [
                (ACT_START, "Act.Start", dates.act_start),
                (ACT_FINISH, "Act.Finish", dates.act_finish),
            ];
            let (applied, skipped): (Vec<_>, Vec<_>) = labelled
                .iter()
                .partition(|(key, _, _)| dates.recorded.contains(key));
            let applied: Vec<String> = applied
                .iter()
                .map(|(_, label, date)| format!("{}: {}", label, date))
                .collect();
            msg.push_str(&format!("\n   {}", applied.join(", ")));
            for (_, label, _) in skipped {
                msg.push_str(&format!("\n   ({} field not found on this tracker; not recorded)", label));
            }
        }
        msg
    }
}
