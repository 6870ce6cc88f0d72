//! MCP (Model Context Protocol) server exposing Redmine to AI agents.
//!
//! Every tool returns a single text result. Failures are rendered as error
//! results (see [`error::ToolError`]) instead of protocol errors.

pub mod error;
pub mod tools;

use std::sync::Arc;

use chrono::NaiveDate;
use error::ToolError;
use rmcp::{
    handler::server::wrapper::Parameters,
    model::*,
    service::RoleServer,
    tool, tool_handler, tool_router, ErrorData as McpErrorData, ServerHandler,
};
use serde_json::json;
use tokio::sync::Mutex;
use tools::*;

use crate::entity::{IssueEnvelope, IssueList, TimeEntryList, UserEnvelope, UserList};
use crate::metadata::{prepare_status_change, MetadataResolver, StatusChangeRequest};
use crate::transport::Transport;

/// The MCP server for a single Redmine instance.
///
/// Tool calls that read or write the metadata cache take the `metadata`
/// lock for their whole duration, so cache updates never interleave.
#[derive(Clone)]
pub struct RedmineServer {
    /// Authenticated access to the tracker.
    pub transport: Arc<dyn Transport>,
    /// Name -> ID resolution backed by the cache file.
    pub metadata: Arc<Mutex<MetadataResolver>>,
    /// Source of "today" for date defaults.
    clock: fn() -> NaiveDate,
    /// Tool router for MCP tool handling.
    pub tool_router: rmcp::handler::server::tool::ToolRouter<Self>,
}

fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn respond(action: &str, result: Result<String, ToolError>) -> Result<CallToolResult, McpErrorData> {
    match result {
        Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
        Err(e) => {
            if e.is_validation() {
                tracing::debug!(error_type = e.error_type(), error = %e, "{} rejected", action);
            } else {
                tracing::warn!(error_type = e.error_type(), error = %e, "{} failed", action);
            }
            Ok(e.to_tool_result(action))
        }
    }
}

#[tool_router]
impl RedmineServer {
    /// Create a new RedmineServer instance.
    pub fn new(transport: Arc<dyn Transport>, resolver: MetadataResolver) -> Self {
        Self {
            transport,
            metadata: Arc::new(Mutex::new(resolver)),
            clock: local_today,
            tool_router: Self::tool_router(),
        }
    }

    /// Replace the clock used for "today".
    pub fn with_clock(mut self, clock: fn() -> NaiveDate) -> Self {
        self.clock = clock;
        self
    }

    fn today(&self) -> NaiveDate {
        (self.clock)()
    }

    /// Start the MCP server on the given transport.
    ///
    /// This method runs the server until the transport is closed or an error occurs.
    pub async fn serve<T, E, A>(self, transport: T) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
    where
        T: rmcp::transport::IntoTransport<RoleServer, E, A>,
        E: std::error::Error + Send + Sync + 'static,
    {
        use rmcp::service::ServiceExt;
        let running = ServiceExt::serve(self, transport)
            .await
            .map_err(|e| -> Box<dyn std::error::Error + Send + Sync> { Box::new(e) })?;
        running
            .waiting()
            .await
            .map_err(|e| -> Box<dyn std::error::Error + Send + Sync> { Box::new(e) })?;
        Ok(())
    }

    // ========================================================================
    // list_my_tasks
    // ========================================================================

    #[tool(description = "List tasks assigned to me (or to assigned_to_id). status_filter: open (default), closed, * for all, or a status name such as in_progress")]
    pub async fn list_my_tasks(
        &self,
        Parameters(params): Parameters<ListMyTasksParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        respond("fetching tasks", self.run_list_my_tasks(params).await)
    }

    async fn run_list_my_tasks(&self, params: ListMyTasksParams) -> Result<String, ToolError> {
        let assignee = validate_assignee(params.assigned_to_id.as_deref())?;
        let cache = self.metadata.lock().await.ensure_metadata().await?;

        let filter = params.status_filter.unwrap_or_else(|| "open".to_string());
        let (status_id, recognised) = status_query(&cache, &filter);
        let path = my_issues_path(&assignee, &status_id, params.project_id.as_deref())?;

        let list: IssueList = serde_json::from_value(self.transport.get(&path).await?)
            .map_err(crate::RedmineError::from)?;

        let mut text = format_task_list(&list.issues);
        if !recognised {
            text = format!(
                "Unknown status filter '{}', showing open tasks.\n{}",
                filter, text
            );
        }
        Ok(text)
    }

    // ========================================================================
    // get_issue_details
    // ========================================================================

    #[tool(description = "Show the details of one issue: status, progress, dates, subtasks, description and recent notes")]
    pub async fn get_issue_details(
        &self,
        Parameters(params): Parameters<IssueIdParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let action = format!("fetching issue #{}", params.issue_id);
        respond(&action, self.run_get_issue_details(params.issue_id).await)
    }

    async fn run_get_issue_details(&self, issue_id: u64) -> Result<String, ToolError> {
        let path = format!("/issues/{}.json?include=journals,children", issue_id);
        let envelope: IssueEnvelope = serde_json::from_value(self.transport.get(&path).await?)
            .map_err(crate::RedmineError::from)?;
        Ok(format_issue_details(&envelope.issue))
    }

    // ========================================================================
    // log_time
    // ========================================================================

    #[tool(description = "Log hours worked on an issue. activity defaults to Development; spent_on (YYYY-MM-DD) defaults to today")]
    pub async fn log_time(
        &self,
        Parameters(params): Parameters<LogTimeParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        respond("logging time", self.run_log_time(params).await)
    }

    async fn run_log_time(&self, params: LogTimeParams) -> Result<String, ToolError> {
        let hours = validate_hours(params.hours)?;
        let spent_on = parse_optional_date("spent_on", &params.spent_on)?;

        let cache = self.metadata.lock().await.ensure_metadata().await?;
        let activity_id = resolve_activity(&cache, &params.activity)?;

        let mut entry = json!({
            "issue_id": params.issue_id,
            "hours": hours,
            "comments": params.comment,
            "activity_id": activity_id,
        });
        if let Some(day) = spent_on {
            entry["spent_on"] = json!(day.to_string());
        }

        self.transport
            .post("/time_entries.json", json!({ "time_entry": entry }))
            .await?;

        Ok(format!(
            "Logged {}h on issue #{} ({}). Comment: {}",
            hours,
            params.issue_id,
            spent_on.unwrap_or_else(|| self.today()),
            params.comment
        ))
    }

    // ========================================================================
    // update_issue_status
    // ========================================================================

    #[tool(description = "Change the status of an issue by name (e.g. 'in progress', 'resolved', 'completed'). Completing sets progress to 100% and records actual start/finish dates (default today)")]
    pub async fn update_issue_status(
        &self,
        Parameters(params): Parameters<UpdateIssueStatusParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        respond("updating status", self.run_update_issue_status(params).await)
    }

    async fn run_update_issue_status(&self, params: UpdateIssueStatusParams) -> Result<String, ToolError> {
        let request = StatusChangeRequest {
            issue_id: params.issue_id,
            status_name: params.status_name,
            act_start: parse_optional_date("act_start", &params.act_start)?,
            act_finish: parse_optional_date("act_finish", &params.act_finish)?,
        };

        let change = {
            let resolver = self.metadata.lock().await;
            let mut cache = resolver.ensure_metadata().await?;
            prepare_status_change(&resolver, &mut cache, request, self.today()).await?
        };

        self.transport.put(&change.path(), change.payload.clone()).await?;
        tracing::info!(issue_id = change.issue_id, status_id = change.status_id, "issue status updated");
        Ok(change.describe())
    }

    // ========================================================================
    // update_progress
    // ========================================================================

    #[tool(description = "Set the completion percentage (0-100) of an issue")]
    pub async fn update_progress(
        &self,
        Parameters(params): Parameters<UpdateProgressParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        respond("updating progress", self.run_update_progress(params).await)
    }

    async fn run_update_progress(&self, params: UpdateProgressParams) -> Result<String, ToolError> {
        let percent = validate_percent(params.percent)?;
        self.transport
            .put(
                &format!("/issues/{}.json", params.issue_id),
                json!({ "issue": { "done_ratio": percent } }),
            )
            .await?;
        Ok(format!("Updated issue #{} to {}%", params.issue_id, percent))
    }

    // ========================================================================
    // add_note
    // ========================================================================

    #[tool(description = "Add a comment (note) to an issue")]
    pub async fn add_note(
        &self,
        Parameters(params): Parameters<AddNoteParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        respond("adding note", self.run_add_note(params).await)
    }

    async fn run_add_note(&self, params: AddNoteParams) -> Result<String, ToolError> {
        validate_note(&params.note)?;
        self.transport
            .put(
                &format!("/issues/{}.json", params.issue_id),
                json!({ "issue": { "notes": params.note } }),
            )
            .await?;
        Ok(format!("Added note to issue #{}", params.issue_id))
    }

    // ========================================================================
    // create_issue
    // ========================================================================

    #[tool(description = "Create a new issue (bug, feature, task or subtask). priority_id defaults to 2 (Normal); set parent_issue_id to create a subtask")]
    pub async fn create_issue(
        &self,
        Parameters(params): Parameters<CreateIssueParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        respond("creating issue", self.run_create_issue(params).await)
    }

    async fn run_create_issue(&self, params: CreateIssueParams) -> Result<String, ToolError> {
        let payload = new_issue_payload(&params)?;
        let envelope: IssueEnvelope = serde_json::from_value(self.transport.post("/issues.json", payload).await?)
            .map_err(crate::RedmineError::from)?;
        tracing::info!(issue_id = envelope.issue.id, project_id = params.project_id, "issue created");
        Ok(format_created_issue(&envelope.issue))
    }

    // ========================================================================
    // get_today_logs / get_time_logs_range
    // ========================================================================

    #[tool(description = "Show the hours I logged today and how many are missing for a full 8h day")]
    pub async fn get_today_logs(&self) -> Result<CallToolResult, McpErrorData> {
        respond("fetching time logs", self.run_get_today_logs().await)
    }

    async fn run_get_today_logs(&self) -> Result<String, ToolError> {
        let today = self.today();
        let entries = self.fetch_time_entries(today, today).await?;
        Ok(format_today_logs(today, &entries))
    }

    #[tool(description = "Summarize the hours I logged between two dates (YYYY-MM-DD), grouped by day")]
    pub async fn get_time_logs_range(
        &self,
        Parameters(params): Parameters<TimeLogsRangeParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        respond("fetching time logs", self.run_get_time_logs_range(params).await)
    }

    async fn run_get_time_logs_range(&self, params: TimeLogsRangeParams) -> Result<String, ToolError> {
        let (from, to) = parse_date_range(&params.from_date, &params.to_date)?;
        let entries = self.fetch_time_entries(from, to).await?;
        Ok(format_time_range(from, to, &entries))
    }

    async fn fetch_time_entries(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<crate::entity::TimeEntry>, ToolError> {
        let value = self.transport.get(&time_entries_path(from, to)?).await?;
        let list: TimeEntryList = serde_json::from_value(value).map_err(crate::RedmineError::from)?;
        Ok(list.time_entries)
    }

    // ========================================================================
    // list_statuses / get_user_info
    // ========================================================================

    #[tool(description = "List the status names and time entry activities this Redmine instance accepts")]
    pub async fn list_statuses(&self) -> Result<CallToolResult, McpErrorData> {
        respond("loading metadata", self.run_list_statuses().await)
    }

    async fn run_list_statuses(&self) -> Result<String, ToolError> {
        let cache = self.metadata.lock().await.ensure_metadata().await?;
        Ok(format_metadata(&cache))
    }

    #[tool(description = "Show a Redmine user looked up by login or name, or the account the API key belongs to when username is omitted")]
    pub async fn get_user_info(
        &self,
        Parameters(params): Parameters<UserInfoParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        respond("fetching user", self.run_get_user_info(params).await)
    }

    async fn run_get_user_info(&self, params: UserInfoParams) -> Result<String, ToolError> {
        let username = params.username.as_deref().map(str::trim).filter(|u| !u.is_empty());
        let user = match username {
            None => {
                let envelope: UserEnvelope =
                    serde_json::from_value(self.transport.get("/users/current.json").await?)
                        .map_err(crate::RedmineError::from)?;
                envelope.user
            }
            Some(name) => {
                let list: UserList = serde_json::from_value(self.transport.get(&users_by_name_path(name)?).await?)
                    .map_err(crate::RedmineError::from)?;
                list.users
                    .into_iter()
                    .next()
                    .ok_or_else(|| ToolError::UserNotFound(name.to_string()))?
            }
        };
        Ok(format_user(&user))
    }

    // ========================================================================
    // clear_cache
    // ========================================================================

    #[tool(description = "Delete the cached statuses, activities and custom fields so they are reloaded from Redmine on the next call")]
    pub async fn clear_cache(&self) -> Result<CallToolResult, McpErrorData> {
        respond("clearing cache", self.run_clear_cache().await)
    }

    async fn run_clear_cache(&self) -> Result<String, ToolError> {
        let removed = self.metadata.lock().await.clear()?;
        if removed {
            tracing::info!("metadata cache cleared");
        }
        Ok("Cache cleared. Metadata will be reloaded on the next call.".to_string())
    }
}

#[tool_handler]
impl ServerHandler for RedmineServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Redmine helper. Use list_my_tasks and get_issue_details to find work, \
                 log_time and the time log tools to track hours, create_issue to file new \
                 work, and update_issue_status, update_progress and add_note to update \
                 issues. Status and activity names are case-insensitive; list_statuses \
                 shows the accepted names."
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStore;
    use crate::transport::mock::MockTransport;
    use crate::transport::Method;
    use rmcp::handler::server::wrapper::Parameters;
    use serde_json::Value;
    use tempfile::TempDir;

    const STATUSES: &str = "/issue_statuses.json";
    const ACTIVITIES: &str = "/enumerations/time_entry_activities.json";
    const OPEN_TASKS: &str = "/issues.json?assigned_to_id=me&limit=25&status_id=open";

    fn fixed_today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 14).unwrap()
    }

    fn setup_test_server() -> (RedmineServer, Arc<MockTransport>, TempDir) {
        let tmp = TempDir::new().unwrap();
        let mock = Arc::new(MockTransport::new());
        mock.respond(
            Method::Get,
            STATUSES,
            json!({"issue_statuses": [
                {"id": 1, "name": "New"},
                {"id": 2, "name": "In Progress"},
                {"id": 7, "name": "Completed", "is_closed": true}
            ]}),
        );
        mock.respond(
            Method::Get,
            ACTIVITIES,
            json!({"time_entry_activities": [
                {"id": 8, "name": "Design"},
                {"id": 9, "name": "Development"}
            ]}),
        );
        let resolver = MetadataResolver::new(mock.clone(), CacheStore::new(tmp.path().join("cache.json")));
        let server = RedmineServer::new(mock.clone(), resolver).with_clock(fixed_today);
        (server, mock, tmp)
    }

    fn text_of(result: &CallToolResult) -> String {
        match &result.content[0].raw {
            RawContent::Text(t) => t.text.clone(),
            other => panic!("expected text content, got {:?}", other),
        }
    }

    fn issue(id: u64, subject: &str, custom_fields: Value) -> Value {
        json!({
            "id": id,
            "subject": subject,
            "project": {"id": 1, "name": "Website"},
            "status": {"id": 2, "name": "In Progress"},
            "done_ratio": 40,
            "due_date": "2024-06-30",
            "custom_fields": custom_fields
        })
    }

    fn paths(mock: &MockTransport) -> Vec<String> {
        mock.requests().into_iter().map(|r| r.path).collect()
    }

    #[tokio::test]
    async fn test_list_my_tasks_bootstraps_then_lists() {
        let (server, mock, tmp) = setup_test_server();
        mock.respond(
            Method::Get,
            OPEN_TASKS,
            json!({"issues": [issue(42, "Fix login", json!([]))]}),
        );

        let result = server
            .list_my_tasks(Parameters(ListMyTasksParams {
                status_filter: Some("open".to_string()),
                project_id: None,
                assigned_to_id: None,
            }))
            .await
            .unwrap();

        assert_eq!(paths(&mock), vec![STATUSES, ACTIVITIES, OPEN_TASKS]);
        assert!(tmp.path().join("cache.json").exists());
        let text = text_of(&result);
        assert!(text.contains("- #42 [In Progress] 40%: Fix login"));
        assert!(text.contains("(Due: 2024-06-30 | Project: Website)"));

        server
            .list_my_tasks(Parameters(ListMyTasksParams::default()))
            .await
            .unwrap();
        assert_eq!(mock.request_count(), 4);
    }

    #[tokio::test]
    async fn test_list_my_tasks_empty() {
        let (server, mock, _tmp) = setup_test_server();
        mock.respond(Method::Get, OPEN_TASKS, json!({"issues": []}));

        let result = server
            .list_my_tasks(Parameters(ListMyTasksParams::default()))
            .await
            .unwrap();

        assert_eq!(text_of(&result), "No tasks found.");
        assert_ne!(result.is_error, Some(true));
    }

    #[tokio::test]
    async fn test_list_my_tasks_by_status_name() {
        let (server, mock, _tmp) = setup_test_server();
        let path = "/issues.json?assigned_to_id=me&limit=25&status_id=2&project_id=7";
        mock.respond(Method::Get, path, json!({"issues": []}));

        server
            .list_my_tasks(Parameters(ListMyTasksParams {
                status_filter: Some("In Progress".to_string()),
                project_id: Some("7".to_string()),
                assigned_to_id: None,
            }))
            .await
            .unwrap();

        assert_eq!(paths(&mock).last().map(String::as_str), Some(path));
    }

    #[tokio::test]
    async fn test_list_tasks_of_other_user_encodes_project() {
        let (server, mock, _tmp) = setup_test_server();
        let path = "/issues.json?assigned_to_id=5&limit=25&status_id=*&project_id=web%26assigned_to_id%3Dme";
        mock.respond(Method::Get, path, json!({"issues": []}));

        let result = server
            .list_my_tasks(Parameters(ListMyTasksParams {
                status_filter: Some("*".to_string()),
                project_id: Some("web&assigned_to_id=me".to_string()),
                assigned_to_id: Some("5".to_string()),
            }))
            .await
            .unwrap();

        assert_ne!(result.is_error, Some(true));
        assert_eq!(paths(&mock).last().map(String::as_str), Some(path));
    }

    #[tokio::test]
    async fn test_list_tasks_rejects_bad_assignee() {
        let (server, mock, _tmp) = setup_test_server();

        let result = server
            .list_my_tasks(Parameters(ListMyTasksParams {
                assigned_to_id: Some("someone".to_string()),
                ..Default::default()
            }))
            .await
            .unwrap();

        assert_eq!(result.is_error, Some(true));
        assert!(text_of(&result).contains("someone"));
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_bootstrap_failure_is_reported_as_text() {
        let (server, mock, tmp) = setup_test_server();
        mock.fail(Method::Get, STATUSES, 401);

        let result = server
            .list_my_tasks(Parameters(ListMyTasksParams::default()))
            .await
            .unwrap();

        assert_eq!(result.is_error, Some(true));
        assert!(text_of(&result).starts_with("Error fetching tasks: Redmine API Error 401"));
        assert!(!tmp.path().join("cache.json").exists());
    }

    #[tokio::test]
    async fn test_update_status_completed_records_dates() {
        let (server, mock, _tmp) = setup_test_server();
        mock.respond(
            Method::Get,
            "/issues/42.json",
            json!({"issue": issue(42, "Ship", json!([
                {"id": 31, "name": "Act. Start", "value": null},
                {"id": 32, "name": "Act. Finish", "value": null}
            ]))}),
        );
        mock.respond(Method::Put, "/issues/42.json", json!({}));

        let result = server
            .update_issue_status(Parameters(UpdateIssueStatusParams {
                issue_id: 42,
                status_name: "Completed".to_string(),
                act_start: Some("2024-06-10".to_string()),
                act_finish: None,
            }))
            .await
            .unwrap();

        assert_eq!(
            mock.last_body(Method::Put).unwrap(),
            json!({"issue": {
                "status_id": 7,
                "done_ratio": 100,
                "custom_fields": [
                    {"id": 31, "value": "2024-06-10"},
                    {"id": 32, "value": "2024-06-14"}
                ]
            }})
        );
        assert_eq!(
            text_of(&result),
            "Updated issue #42 to status 'Completed'\n   Act.Start: 2024-06-10, Act.Finish: 2024-06-14"
        );
    }

    #[tokio::test]
    async fn test_update_status_unknown_name_sends_nothing() {
        let (server, mock, _tmp) = setup_test_server();

        let result = server
            .update_issue_status(Parameters(UpdateIssueStatusParams {
                issue_id: 42,
                status_name: "Shipped".to_string(),
                act_start: None,
                act_finish: None,
            }))
            .await
            .unwrap();

        assert_eq!(result.is_error, Some(true));
        assert!(text_of(&result).contains("Available statuses: completed, in_progress, new"));
        assert!(mock.last_body(Method::Put).is_none());
    }

    #[tokio::test]
    async fn test_update_status_rejects_bad_date() {
        let (server, mock, _tmp) = setup_test_server();

        let result = server
            .update_issue_status(Parameters(UpdateIssueStatusParams {
                issue_id: 42,
                status_name: "completed".to_string(),
                act_start: Some("14/06/2024".to_string()),
                act_finish: None,
            }))
            .await
            .unwrap();

        assert_eq!(result.is_error, Some(true));
        assert!(text_of(&result).contains("act_start"));
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_update_progress_out_of_range() {
        let (server, mock, _tmp) = setup_test_server();

        let result = server
            .update_progress(Parameters(UpdateProgressParams {
                issue_id: 42,
                percent: 150,
            }))
            .await
            .unwrap();

        assert_eq!(result.is_error, Some(true));
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_update_progress_and_note() {
        let (server, mock, _tmp) = setup_test_server();
        mock.respond(Method::Put, "/issues/42.json", json!({}));

        let result = server
            .update_progress(Parameters(UpdateProgressParams {
                issue_id: 42,
                percent: 60,
            }))
            .await
            .unwrap();
        assert_eq!(text_of(&result), "Updated issue #42 to 60%");
        assert_eq!(mock.last_body(Method::Put).unwrap(), json!({"issue": {"done_ratio": 60}}));

        server
            .add_note(Parameters(AddNoteParams {
                issue_id: 42,
                note: "Deployed to staging".to_string(),
            }))
            .await
            .unwrap();
        assert_eq!(
            mock.last_body(Method::Put).unwrap(),
            json!({"issue": {"notes": "Deployed to staging"}})
        );
    }

    #[tokio::test]
    async fn test_log_time_uses_default_activity() {
        let (server, mock, _tmp) = setup_test_server();
        mock.respond(Method::Post, "/time_entries.json", json!({"time_entry": {"id": 1}}));

        let result = server
            .log_time(Parameters(LogTimeParams {
                issue_id: 42,
                hours: 1.5,
                comment: "Review".to_string(),
                activity: None,
                spent_on: None,
            }))
            .await
            .unwrap();

        assert_eq!(
            mock.last_body(Method::Post).unwrap(),
            json!({"time_entry": {
                "issue_id": 42,
                "hours": 1.5,
                "comments": "Review",
                "activity_id": 9
            }})
        );
        assert_eq!(
            text_of(&result),
            "Logged 1.5h on issue #42 (2024-06-14). Comment: Review"
        );
    }

    #[tokio::test]
    async fn test_log_time_unknown_activity() {
        let (server, mock, _tmp) = setup_test_server();

        let result = server
            .log_time(Parameters(LogTimeParams {
                issue_id: 42,
                hours: 2.0,
                comment: "x".to_string(),
                activity: Some("Gardening".to_string()),
                spent_on: Some("2024-06-13".to_string()),
            }))
            .await
            .unwrap();

        assert_eq!(result.is_error, Some(true));
        assert!(text_of(&result).contains("Available activities: design, development"));
        assert!(mock.last_body(Method::Post).is_none());
    }

    #[tokio::test]
    async fn test_get_issue_details() {
        let (server, mock, _tmp) = setup_test_server();
        let mut detail = issue(42, "Fix login", json!([]));
        detail["parent"] = json!({"id": 40});
        detail["children"] = json!([{"id": 43, "subject": "Write test"}]);
        detail["journals"] = json!([
            {"id": 1, "user": {"id": 3, "name": "Lan"}, "notes": "", "created_on": "2024-06-01T09:00:00Z"},
            {"id": 2, "user": {"id": 3, "name": "Lan"}, "notes": "Looks good", "created_on": "2024-06-02T09:00:00Z"}
        ]);
        mock.respond(
            Method::Get,
            "/issues/42.json?include=journals,children",
            json!({ "issue": detail }),
        );

        let result = server
            .get_issue_details(Parameters(IssueIdParams { issue_id: 42 }))
            .await
            .unwrap();

        let text = text_of(&result);
        assert!(text.starts_with("#42 - Fix login"));
        assert!(text.contains("Parent:     #40"));
        assert!(text.contains("  - #43: Write test"));
        assert!(text.contains("- [2024-06-02] Lan: Looks good"));
        assert!(!text.contains("2024-06-01"));
    }

    #[tokio::test]
    async fn test_get_issue_details_not_found() {
        let (server, _mock, _tmp) = setup_test_server();

        let result = server
            .get_issue_details(Parameters(IssueIdParams { issue_id: 999 }))
            .await
            .unwrap();

        assert_eq!(result.is_error, Some(true));
        assert!(text_of(&result).starts_with("Error fetching issue #999: Redmine API Error 404"));
    }

    #[tokio::test]
    async fn test_get_today_logs() {
        let (server, mock, _tmp) = setup_test_server();
        mock.respond(
            Method::Get,
            "/time_entries.json?user_id=me&from=2024-06-14&to=2024-06-14&limit=100",
            json!({"time_entries": [
                {"id": 1, "issue": {"id": 42}, "hours": 6.0, "comments": "Dev", "spent_on": "2024-06-14"}
            ]}),
        );

        let result = server.get_today_logs().await.unwrap();

        let text = text_of(&result);
        assert!(text.contains("- #42: 6h (Dev)"));
        assert!(text.contains("Missing 2h to reach 8h."));
    }

    #[tokio::test]
    async fn test_get_time_logs_range_rejects_reversed_dates() {
        let (server, mock, _tmp) = setup_test_server();

        let result = server
            .get_time_logs_range(Parameters(TimeLogsRangeParams {
                from_date: "2024-06-14".to_string(),
                to_date: "2024-06-01".to_string(),
            }))
            .await
            .unwrap();

        assert_eq!(result.is_error, Some(true));
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_clear_cache_then_rebootstrap() {
        let (server, mock, tmp) = setup_test_server();
        server.list_statuses().await.unwrap();
        assert_eq!(mock.request_count(), 2);

        let result = server.clear_cache().await.unwrap();
        assert_ne!(result.is_error, Some(true));
        assert!(!tmp.path().join("cache.json").exists());

        let again = server.clear_cache().await.unwrap();
        assert_ne!(again.is_error, Some(true));

        let result = server.list_statuses().await.unwrap();
        assert_eq!(mock.request_count(), 4);
        assert!(text_of(&result).contains("- development (#9) [default]"));
    }

    fn user_json(id: u64, login: &str, first: &str, last: &str) -> Value {
        json!({"id": id, "login": login, "firstname": first, "lastname": last, "mail": format!("{}@example.com", login)})
    }

    #[tokio::test]
    async fn test_get_user_info_defaults_to_current_user() {
        let (server, mock, _tmp) = setup_test_server();
        mock.respond(
            Method::Get,
            "/users/current.json",
            json!({"user": user_json(5, "lan", "Lan", "Tran")}),
        );

        let text = text_of(
            &server
                .get_user_info(Parameters(UserInfoParams::default()))
                .await
                .unwrap(),
        );

        assert!(text.contains("Login: lan"));
        assert!(text.contains("Name:  Lan Tran"));
    }

    #[tokio::test]
    async fn test_get_user_info_by_name() {
        let (server, mock, _tmp) = setup_test_server();
        mock.respond(
            Method::Get,
            "/users.json?name=Minh+Le",
            json!({"users": [user_json(8, "minh", "Minh", "Le"), user_json(9, "minh2", "Minh", "Le")]}),
        );

        let text = text_of(
            &server
                .get_user_info(Parameters(UserInfoParams {
                    username: Some(" Minh Le ".to_string()),
                }))
                .await
                .unwrap(),
        );

        assert!(text.starts_with("User #8"));
        assert!(text.contains("Mail:  minh@example.com"));
    }

    #[tokio::test]
    async fn test_get_user_info_not_found() {
        let (server, mock, _tmp) = setup_test_server();
        mock.respond(Method::Get, "/users.json?name=ghost", json!({"users": []}));

        let result = server
            .get_user_info(Parameters(UserInfoParams {
                username: Some("ghost".to_string()),
            }))
            .await
            .unwrap();

        assert_eq!(result.is_error, Some(true));
        assert_eq!(text_of(&result), "Error fetching user: User 'ghost' not found");
    }

    #[tokio::test]
    async fn test_create_issue() {
        let (server, mock, _tmp) = setup_test_server();
        let mut created = issue(50, "Add export", json!([]));
        created["parent"] = json!({"id": 42});
        created["assigned_to"] = json!({"id": 5, "name": "Lan Tran"});
        created["estimated_hours"] = json!(4.0);
        created["start_date"] = json!("2024-06-17");
        mock.respond(Method::Post, "/issues.json", json!({ "issue": created }));

        let result = server
            .create_issue(Parameters(CreateIssueParams {
                project_id: 1,
                subject: "Add export".to_string(),
                tracker_id: Some(2),
                assigned_to_id: Some(5),
                estimated_hours: Some(4.0),
                start_date: Some("2024-06-17".to_string()),
                due_date: Some("2024-06-30".to_string()),
                parent_issue_id: Some(42),
                ..Default::default()
            }))
            .await
            .unwrap();

        assert_eq!(
            mock.last_body(Method::Post).unwrap(),
            json!({"issue": {
                "project_id": 1,
                "subject": "Add export",
                "priority_id": 2,
                "tracker_id": 2,
                "assigned_to_id": 5,
                "parent_issue_id": 42,
                "estimated_hours": 4.0,
                "start_date": "2024-06-17",
                "due_date": "2024-06-30"
            }})
        );
        let text = text_of(&result);
        assert!(text.starts_with("Created issue #50"));
        assert!(text.contains("   Parent: #42"));
        assert!(text.contains("   Assigned to: Lan Tran (#5)"));
        assert!(text.contains("   Due: 2024-06-30"));
    }

    #[tokio::test]
    async fn test_create_issue_rejects_bad_date() {
        let (server, mock, _tmp) = setup_test_server();

        let result = server
            .create_issue(Parameters(CreateIssueParams {
                project_id: 1,
                subject: "Add export".to_string(),
                due_date: Some("30/06/2024".to_string()),
                ..Default::default()
            }))
            .await
            .unwrap();

        assert_eq!(result.is_error, Some(true));
        assert!(text_of(&result).contains("due_date"));
        assert_eq!(mock.request_count(), 0);
    }

    #[test]
    fn test_server_info() {
        let (server, _mock, _tmp) = setup_test_server();
        let info = server.get_info();
        assert!(info.capabilities.tools.is_some());
        assert!(info.instructions.unwrap().contains("list_statuses"));
    }
}
