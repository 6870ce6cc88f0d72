//! MCP tool types and helpers for the Redmine server.
//!
//! This module contains parameter types, validation helpers and the text
//! formatting for tool responses. The tool implementations themselves are
//! in mod.rs within the #[tool_router] impl block.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::cache::MetadataCache;
use crate::entity::{Issue, TimeEntry, User};
use crate::mcp::error::{validation, ToolError};
use crate::metadata::normalize_status_name;

// ============================================================================
// Parameter Types
// ============================================================================

/// Parameters for list_my_tasks tool
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListMyTasksParams {
    /// Status filter: "open", "closed", "*" (all) or a status name such as "in_progress". Default: open
    pub status_filter: Option<String>,
    /// Only list tasks of this project (numeric ID or identifier)
    pub project_id: Option<String>,
    /// "me" (default) or a numeric user ID
    pub assigned_to_id: Option<String>,
}

/// Parameters for tools that act on a single issue
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct IssueIdParams {
    /// Issue ID
    pub issue_id: u64,
}

/// Parameters for log_time tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LogTimeParams {
    /// Issue ID
    pub issue_id: u64,
    /// Hours spent, e.g. 1.5
    pub hours: f64,
    /// Description of the work done
    pub comment: String,
    /// Activity name such as "Development" (default: the tracker's development activity)
    pub activity: Option<String>,
    /// Day the work was done (YYYY-MM-DD, default: today)
    pub spent_on: Option<String>,
}

/// Parameters for update_issue_status tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UpdateIssueStatusParams {
    /// Issue ID
    pub issue_id: u64,
    /// Status name, e.g. "resolved", "in progress", "completed"
    pub status_name: String,
    /// Actual start date (YYYY-MM-DD), used when completing. Default: today
    pub act_start: Option<String>,
    /// Actual finish date (YYYY-MM-DD), used when completing. Default: today
    pub act_finish: Option<String>,
}

/// Parameters for update_progress tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UpdateProgressParams {
    /// Issue ID
    pub issue_id: u64,
    /// Completion percentage (0-100)
    pub percent: i64,
}

/// Parameters for add_note tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AddNoteParams {
    /// Issue ID
    pub issue_id: u64,
    /// Comment text
    pub note: String,
}

/// Parameters for create_issue tool
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CreateIssueParams {
    /// Project ID
    pub project_id: u64,
    /// Issue title
    pub subject: String,
    /// Description
    pub description: Option<String>,
    /// Tracker ID, e.g. 1=Bug, 2=Feature, 3=Task, 4=Support
    pub tracker_id: Option<u64>,
    /// Priority 1-5 (default: 2, Normal)
    pub priority_id: Option<i64>,
    /// Assign to this user ID
    pub assigned_to_id: Option<u64>,
    /// Estimated hours
    pub estimated_hours: Option<f64>,
    /// Start date (YYYY-MM-DD)
    pub start_date: Option<String>,
    /// Due date (YYYY-MM-DD)
    pub due_date: Option<String>,
    /// Parent issue ID, to create a subtask
    pub parent_issue_id: Option<u64>,
}

/// Parameters for get_user_info tool
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct UserInfoParams {
    /// Login or name to look up (default: the current user)
    pub username: Option<String>,
}

/// Parameters for get_time_logs_range tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TimeLogsRangeParams {
    /// First day (YYYY-MM-DD)
    pub from_date: String,
    /// Last day (YYYY-MM-DD)
    pub to_date: String,
}

// ============================================================================
// Validation Helpers
// ============================================================================

pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ToolError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| ToolError::InvalidDateFormat {
        field: field.to_string(),
        value: value.to_string(),
    })
}

pub fn parse_optional_date(field: &str, value: &Option<String>) -> Result<Option<NaiveDate>, ToolError> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => parse_date(field, v).map(Some),
    }
}

pub fn parse_date_range(from: &str, to: &str) -> Result<(NaiveDate, NaiveDate), ToolError> {
    let from_date = parse_date("from_date", from)?;
    let to_date = parse_date("to_date", to)?;
    if from_date > to_date {
        return Err(ToolError::InvalidDateRange {
            from: from_date.to_string(),
            to: to_date.to_string(),
        });
    }
    Ok((from_date, to_date))
}

pub fn validate_percent(percent: i64) -> Result<u8, ToolError> {
    if !(validation::MIN_PERCENT..=validation::MAX_PERCENT).contains(&percent) {
        return Err(ToolError::PercentOutOfRange(percent));
    }
    Ok(percent as u8)
}

pub fn validate_hours(hours: f64) -> Result<f64, ToolError> {
    if !hours.is_finite() || hours <= 0.0 {
        return Err(ToolError::InvalidHours(hours));
    }
    Ok(hours)
}

pub fn validate_note(note: &str) -> Result<(), ToolError> {
    if note.trim().is_empty() {
        return Err(ToolError::EmptyNote);
    }
    if note.len() > validation::MAX_NOTE_SIZE {
        return Err(ToolError::NoteTooLong {
            max: validation::MAX_NOTE_SIZE,
            actual: note.len(),
        });
    }
    Ok(())
}

pub fn validate_priority(priority: Option<i64>) -> Result<i64, ToolError> {
    let priority = priority.unwrap_or(validation::DEFAULT_PRIORITY);
    if !(validation::MIN_PRIORITY..=validation::MAX_PRIORITY).contains(&priority) {
        return Err(ToolError::PriorityOutOfRange(priority));
    }
    Ok(priority)
}

/// `"me"` or a positive user ID; absent means `"me"`.
pub fn validate_assignee(assignee: Option<&str>) -> Result<String, ToolError> {
    match assignee.map(str::trim) {
        None | Some("") => Ok("me".to_string()),
        Some(a) if a.eq_ignore_ascii_case("me") => Ok("me".to_string()),
        Some(a) => match a.parse::<u64>() {
            Ok(id) if id > 0 => Ok(id.to_string()),
            _ => Err(ToolError::InvalidAssignee(a.to_string())),
        },
    }
}

/// Validate a create_issue request and build the `POST /issues.json` body.
pub fn new_issue_payload(params: &CreateIssueParams) -> Result<Value, ToolError> {
    let subject = params.subject.trim();
    if subject.is_empty() {
        return Err(ToolError::EmptySubject);
    }
    let priority = validate_priority(params.priority_id)?;
    let estimated = params.estimated_hours.map(validate_hours).transpose()?;
    let start = parse_optional_date("start_date", &params.start_date)?;
    let due = parse_optional_date("due_date", &params.due_date)?;
    if let (Some(start), Some(due)) = (start, due) {
        if start > due {
            return Err(ToolError::InvalidDateRange {
                from: start.to_string(),
                to: due.to_string(),
            });
        }
    }

    let mut issue = Map::new();
    issue.insert("project_id".to_string(), json!(params.project_id));
    issue.insert("subject".to_string(), json!(subject));
    issue.insert("priority_id".to_string(), json!(priority));
    if let Some(description) = params.description.as_deref().filter(|d| !d.trim().is_empty()) {
        issue.insert("description".to_string(), json!(description));
    }
    let optional_ids = [
        ("tracker_id", params.tracker_id),
        ("assigned_to_id", params.assigned_to_id),
        ("parent_issue_id", params.parent_issue_id),
    ];
    for (key, id) in optional_ids {
        if let Some(id) = id {
            issue.insert(key.to_string(), json!(id));
        }
    }
    if let Some(hours) = estimated {
        issue.insert("estimated_hours".to_string(), json!(hours));
    }
    if let Some(start) = start {
        issue.insert("start_date".to_string(), json!(start.to_string()));
    }
    if let Some(due) = due {
        issue.insert("due_date".to_string(), json!(due.to_string()));
    }
    Ok(json!({ "issue": Value::Object(issue) }))
}

/// Resolve an optional activity name to its ID, falling back to the default.
pub fn resolve_activity(cache: &MetadataCache, activity: &Option<String>) -> Result<u64, ToolError> {
    match activity.as_deref().map(str::trim) {
        None | Some("") => Ok(cache.default_activity_id),
        Some(name) => cache
            .activity_id(&crate::metadata::normalize_activity_name(name))
            .ok_or_else(|| ToolError::UnknownActivity {
                provided: name.to_string(),
                valid: cache.activity_names(),
            }),
    }
}

// ============================================================================
// Query Builders
// ============================================================================

/// The `status_id` query value for a task filter, and whether the filter
/// was recognised. Unknown filters fall back to open tasks.
pub fn status_query(cache: &MetadataCache, filter: &str) -> (String, bool) {
    let trimmed = filter.trim();
    match trimmed.to_lowercase().as_str() {
        "" | "open" => return ("open".to_string(), true),
        "closed" => return ("closed".to_string(), true),
        "*" | "all" => return ("*".to_string(), true),
        _ => {}
    }
    match cache.status_id(&normalize_status_name(trimmed)) {
        Some(id) => (id.to_string(), true),
        None => ("open".to_string(), false),
    }
}

fn with_query(path: &str, pairs: &[(&str, String)]) -> Result<String, ToolError> {
    Ok(format!("{}?{}", path, serde_urlencoded::to_string(pairs)?))
}

pub fn my_issues_path(assignee: &str, status_id: &str, project_id: Option<&str>) -> Result<String, ToolError> {
    let mut pairs = vec![
        ("assigned_to_id", assignee.to_string()),
        ("limit", validation::TASK_LIST_LIMIT.to_string()),
        ("status_id", status_id.to_string()),
    ];
    if let Some(project) = project_id.map(str::trim).filter(|p| !p.is_empty()) {
        pairs.push(("project_id", project.to_string()));
    }
    with_query("/issues.json", &pairs)
}

pub fn time_entries_path(from: NaiveDate, to: NaiveDate) -> Result<String, ToolError> {
    with_query(
        "/time_entries.json",
        &[
            ("user_id", "me".to_string()),
            ("from", from.to_string()),
            ("to", to.to_string()),
            ("limit", validation::TIME_ENTRY_LIMIT.to_string()),
        ],
    )
}

pub fn users_by_name_path(name: &str) -> Result<String, ToolError> {
    with_query("/users.json", &[("name", name.trim().to_string())])
}

// ============================================================================
// Response Formatting
// ============================================================================

/// Truncate to `max` characters, appending "..." when anything was cut.
pub fn preview(text: &str, max: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

fn or_na<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "N/A".to_string())
}

pub fn format_task_list(issues: &[Issue]) -> String {
    if issues.is_empty() {
        return "No tasks found.".to_string();
    }
    let mut lines = vec![format!("Tasks ({}):\n", issues.len())];
    for issue in issues {
        lines.push(format!(
            "- #{} [{}] {}%: {}",
            issue.id, issue.status.name, issue.done_ratio, issue.subject
        ));
        lines.push(format!(
            "  (Due: {} | Project: {})",
            or_na(issue.due_date),
            issue.project.name
        ));
    }
    lines.join("\n")
}

pub fn format_issue_details(issue: &Issue) -> String {
    let mut lines = vec![
        format!("#{} - {}", issue.id, issue.subject),
        format!("Project:    {}", issue.project.name),
        format!("Status:     {}", issue.status.name),
        format!("Progress:   {}%", issue.done_ratio),
        format!(
            "Assigned:   {}",
            or_na(issue.assigned_to.as_ref().map(|a| a.name.as_str()))
        ),
        format!("Start date: {}", or_na(issue.start_date)),
        format!("Due date:   {}", or_na(issue.due_date)),
        format!(
            "Spent:      {}h / Est: {}h",
            issue.spent_hours.unwrap_or(0.0),
            or_na(issue.estimated_hours)
        ),
    ];

    if let Some(parent) = &issue.parent {
        lines.push(format!("Parent:     #{}", parent.id));
    }

    if !issue.children.is_empty() {
        lines.push(format!("\nSubtasks ({}):", issue.children.len()));
        for child in &issue.children {
            lines.push(format!(
                "  - #{}: {}",
                child.id,
                or_na(child.subject.as_deref())
            ));
        }
    }

    if let Some(description) = issue.description.as_deref().filter(|d| !d.trim().is_empty()) {
        lines.push(format!(
            "\nDescription:\n{}",
            preview(description, validation::DESCRIPTION_PREVIEW_CHARS)
        ));
    }

    let notes: Vec<_> = issue.journals.iter().filter(|j| j.has_notes()).collect();
    if !notes.is_empty() {
        lines.push("\nRecent notes:".to_string());
        let skip = notes.len().saturating_sub(validation::RECENT_NOTES);
        for journal in &notes[skip..] {
            let created: String = journal.created_on.chars().take(10).collect();
            lines.push(format!(
                "- [{}] {}: {}",
                created,
                journal.user.name,
                preview(journal.notes.as_deref().unwrap_or_default(), validation::NOTE_PREVIEW_CHARS)
            ));
        }
    }

    lines.join("\n")
}

fn entry_line(entry: &TimeEntry, indent: &str) -> String {
    format!(
        "{}- #{}: {}h ({})",
        indent,
        or_na(entry.issue.map(|i| i.id)),
        entry.hours,
        entry.comment_or_default()
    )
}

fn total_hours(entries: &[TimeEntry]) -> f64 {
    entries.iter().map(|e| e.hours).sum()
}

/// Round to two decimals so sums like 0.1 + 0.2 print cleanly.
fn round_hours(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}

pub fn format_today_logs(today: NaiveDate, entries: &[TimeEntry]) -> String {
    let total = round_hours(total_hours(entries));
    let mut lines = vec![format!("Time logged today ({}):", today)];
    for entry in entries {
        lines.push(entry_line(entry, ""));
    }
    lines.push(format!("\nTotal: {}h", total));
    if total < validation::WORKDAY_HOURS {
        lines.push(format!(
            "Missing {}h to reach {}h.",
            round_hours(validation::WORKDAY_HOURS - total),
            validation::WORKDAY_HOURS
        ));
    } else {
        lines.push("Full day logged.".to_string());
    }
    lines.join("\n")
}

pub fn format_time_range(from: NaiveDate, to: NaiveDate, entries: &[TimeEntry]) -> String {
    if entries.is_empty() {
        return format!("No time logged from {} to {}.", from, to);
    }

    let mut by_day: BTreeMap<Option<NaiveDate>, Vec<&TimeEntry>> = BTreeMap::new();
    for entry in entries {
        by_day.entry(entry.spent_on).or_default().push(entry);
    }

    let mut lines = vec![format!("Time logged from {} to {}:", from, to)];
    for (day, day_entries) in &by_day {
        let day_total: f64 = day_entries.iter().map(|e| e.hours).sum();
        lines.push(format!("\n[{}] - {}h:", or_na(*day), round_hours(day_total)));
        for entry in day_entries {
            lines.push(entry_line(entry, "  "));
        }
    }
    lines.push(format!("\nTotal: {}h", round_hours(total_hours(entries))));
    lines.join("\n")
}

pub fn format_metadata(cache: &MetadataCache) -> String {
    let mut lines = vec![format!("Statuses ({}):", cache.statuses.len())];
    for (name, id) in &cache.statuses {
        // Caches written before closed statuses were tracked carry no state.
        let state = match (cache.closed_statuses.is_empty(), cache.is_closed(name)) {
            (true, _) => "",
            (false, true) => " [closed]",
            (false, false) => " [open]",
        };
        lines.push(format!("- {} (#{}){}", name, id, state));
    }
    lines.push(format!("\nActivities ({}):", cache.activities.len()));
    for (name, id) in &cache.activities {
        let marker = if *id == cache.default_activity_id { " [default]" } else { "" };
        lines.push(format!("- {} (#{}){}", name, id, marker));
    }
    if !cache.custom_fields.is_empty() {
        lines.push("\nCustom fields:".to_string());
        for (key, id) in &cache.custom_fields {
            lines.push(format!("- {} (#{})", key, id));
        }
    }
    lines.join("\n")
}

pub fn format_created_issue(issue: &Issue) -> String {
    let mut lines = vec![
        format!("Created issue #{}", issue.id),
        format!("   Subject: {}", issue.subject),
        format!("   Project: {}", issue.project.name),
    ];
    if let Some(parent) = &issue.parent {
        lines.push(format!("   Parent: #{}", parent.id));
    }
    if let Some(assignee) = &issue.assigned_to {
        lines.push(format!("   Assigned to: {} (#{})", assignee.name, assignee.id));
    }
    if let Some(hours) = issue.estimated_hours {
        lines.push(format!("   Estimated: {}h", hours));
    }
    if let Some(start) = issue.start_date {
        lines.push(format!("   Start: {}", start));
    }
    if let Some(due) = issue.due_date {
        lines.push(format!("   Due: {}", due));
    }
    lines.join("\n")
}

pub fn format_user(user: &User) -> String {
    [
        format!("User #{}", user.id),
        format!("Login: {}", user.login),
        format!("Name:  {}", user.full_name()),
        format!("Mail:  {}", or_na(user.mail.as_deref())),
    ]
    .join("\n")
}
