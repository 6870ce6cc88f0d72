//! Tool-level errors and their rendering as tool results.
//!
//! Tools never surface a JSON-RPC error for a failed operation. Every
//! [`ToolError`] becomes a `CallToolResult` flagged as an error whose text
//! starts with `Error`, so the calling agent can read what went wrong.

use rmcp::model::{CallToolResult, Content};
use thiserror::Error;

use crate::error::RedmineError;

/// Validation limits.
pub mod validation {
    pub const MIN_PERCENT: i64 = 0;
    pub const MAX_PERCENT: i64 = 100;
    pub const MAX_NOTE_SIZE: usize = 65_536;
    pub const TASK_LIST_LIMIT: usize = 25;
    pub const TIME_ENTRY_LIMIT: usize = 100;
    pub const DESCRIPTION_PREVIEW_CHARS: usize = 500;
    pub const NOTE_PREVIEW_CHARS: usize = 100;
    pub const RECENT_NOTES: usize = 3;
    pub const WORKDAY_HOURS: f64 = 8.0;
    pub const MIN_PRIORITY: i64 = 1;
    pub const MAX_PRIORITY: i64 = 5;
    pub const DEFAULT_PRIORITY: i64 = 2;
}

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Activity '{provided}' is not valid. Available activities: {}", valid.join(", "))]
    UnknownActivity { provided: String, valid: Vec<String> },

    #[error("Invalid date format for field '{field}': '{value}'. Expected YYYY-MM-DD")]
    InvalidDateFormat { field: String, value: String },

    #[error("Invalid date range: {from} is after {to}")]
    InvalidDateRange { from: String, to: String },

    #[error("Percent must be between 0 and 100, got {0}")]
    PercentOutOfRange(i64),

    #[error("Hours must be a positive number, got {0}")]
    InvalidHours(f64),

    #[error("Note must not be empty")]
    EmptyNote,

    #[error("Note too long: {actual} bytes (max {max})")]
    NoteTooLong { max: usize, actual: usize },

    #[error("Subject must not be empty")]
    EmptySubject,

    #[error("Priority must be between 1 and 5, got {0}")]
    PriorityOutOfRange(i64),

    #[error("Assignee must be \"me\" or a numeric user ID, got '{0}'")]
    InvalidAssignee(String),

    #[error("User '{0}' not found")]
    UserNotFound(String),

    #[error("Could not encode query: {0}")]
    QueryEncoding(#[from] serde_urlencoded::ser::Error),

    #[error(transparent)]
    Redmine(#[from] RedmineError),
}

impl ToolError {
    /// Short machine-friendly name, used in logs.
    pub fn error_type(&self) -> &'static str {
        match self {
            ToolError::UnknownActivity { .. } => "UnknownActivity",
            ToolError::InvalidDateFormat { .. } => "InvalidDateFormat",
            ToolError::InvalidDateRange { .. } => "InvalidDateRange",
            ToolError::PercentOutOfRange(_) => "PercentOutOfRange",
            ToolError::InvalidHours(_) => "InvalidHours",
            ToolError::EmptyNote => "EmptyNote",
            ToolError::NoteTooLong { .. } => "NoteTooLong",
            ToolError::EmptySubject => "EmptySubject",
            ToolError::PriorityOutOfRange(_) => "PriorityOutOfRange",
            ToolError::InvalidAssignee(_) => "InvalidAssignee",
            ToolError::UserNotFound(_) => "UserNotFound",
            ToolError::QueryEncoding(_) => "InternalError",
            ToolError::Redmine(RedmineError::Config(_)) => "ConfigError",
            ToolError::Redmine(RedmineError::UnknownStatus { .. }) => "UnknownStatus",
            ToolError::Redmine(RedmineError::Api { .. }) => "ApiError",
            ToolError::Redmine(RedmineError::Http(_)) => "HttpError",
            ToolError::Redmine(_) => "InternalError",
        }
    }

    /// Whether the error was caught before any request was sent.
    pub fn is_validation(&self) -> bool {
        !matches!(
            self,
            ToolError::UserNotFound(_)
                | ToolError::QueryEncoding(_)
                | ToolError::Redmine(
                    RedmineError::Config(_)
                        | RedmineError::Api { .. }
                        | RedmineError::Http(_)
                        | RedmineError::Metadata(_)
                        | RedmineError::Server(_)
                        | RedmineError::Io(_)
                        | RedmineError::Json(_)
                )
        )
    }

    /// Render as an error tool result, prefixed with what was being done.
    pub fn to_tool_result(&self, action: &str) -> CallToolResult {
        CallToolResult::error(vec![Content::text(format!("Error {}: {}", action, self))])
    }
}
