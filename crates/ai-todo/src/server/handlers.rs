//! JSON API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::AppState;
use crate::domain::today;
use crate::entities::{
    PrioritySuggestion, Task, TaskDraft, TaskFilter, TaskPriority, TaskStats, TaskUpdate,
};
use crate::errors::{EnrichError, TodoError};

type ApiResult<T> = Result<T, (StatusCode, String)>;

/// Map a domain error to a status code and message.
pub(super) fn map_todo_error(err: TodoError) -> (StatusCode, String) {
    match &err {
        TodoError::TaskNotFound { .. } | TodoError::SubtaskNotFound { .. } => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        TodoError::EmptyTitle
        | TodoError::InvalidPriority { .. }
        | TodoError::InvalidDate { .. }
        | TodoError::AmbiguousId { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        _ => {
            error!(error = %err, "Request failed");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

// ============================================================================
// Request/Response types
// ============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
pub(super) struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Status response.
#[derive(Debug, Serialize)]
pub(super) struct StatusResponse {
    pub ai_enabled: bool,
    pub provider: Option<&'static str>,
    pub model: Option<String>,
    pub storage: &'static str,
    pub tasks: TaskStats,
}

/// Listing filters, as sent by the page's filter form.
#[derive(Debug, Default, Deserialize)]
pub(super) struct ListQuery {
    #[serde(default)]
    pub open_only: Option<bool>,
    /// Comma-separated priorities
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
}

impl ListQuery {
    pub fn to_filter(&self) -> Result<TaskFilter, TodoError> {
        let priorities = self
            .priority
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::parse::<TaskPriority>)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TaskFilter {
            open_only: self.open_only.unwrap_or(false),
            priorities,
            tag: self
                .tag
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
        })
    }
}

/// Free-text task entry.
#[derive(Debug, Deserialize)]
pub struct AiTaskRequest {
    pub text: String,
}

/// Result of free-text entry.
#[derive(Debug, Serialize)]
pub struct AiTaskResponse {
    pub task: Task,
    /// Whether the AI fields were applied
    pub enriched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// New subtask.
#[derive(Debug, Deserialize)]
pub struct SubtaskRequest {
    pub title: String,
}

/// Subtask change.
#[derive(Debug, Deserialize)]
pub struct SubtaskUpdateRequest {
    #[serde(default)]
    pub done: Option<bool>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Result of an AI breakdown.
#[derive(Debug, Serialize)]
pub struct BreakdownResponse {
    pub task: Task,
    pub added: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Result of an AI prioritization pass.
#[derive(Debug, Serialize)]
pub struct PrioritizeResponse {
    pub changed: usize,
    pub suggestions: Vec<PrioritySuggestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Result of a bulk completion.
#[derive(Debug, Serialize)]
pub struct CompleteAllResponse {
    pub changed: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check handler.
pub(super) async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Build the status shown by the API and the page header.
pub(super) async fn current_status(state: &AppState) -> Result<StatusResponse, TodoError> {
    let ai_enabled = state.enrichment.is_available();
    Ok(StatusResponse {
        ai_enabled,
        provider: state.enrichment.provider_name(),
        model: ai_enabled.then(|| state.enrichment.model().to_string()),
        storage: state.tasks.storage_type(),
        tasks: state.tasks.stats().await?,
    })
}

/// Status handler.
pub(super) async fn status_handler(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<StatusResponse>> {
    current_status(&state).await.map(Json).map_err(map_todo_error)
}

/// List tasks, optionally filtered.
pub(super) async fn list_tasks_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Task>>> {
    let filter = query.to_filter().map_err(map_todo_error)?;
    state
        .tasks
        .list_tasks(&filter)
        .await
        .map(Json)
        .map_err(map_todo_error)
}

/// Create a task from manually entered fields.
pub(super) async fn create_task_handler(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<TaskDraft>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let task = state.tasks.add_task(draft).await.map_err(map_todo_error)?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// Create a task from free text, enriching it when AI is available.
///
/// Enrichment failures never fail the request: the text becomes the title.
pub(super) async fn create_ai_task_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AiTaskRequest>,
) -> ApiResult<(StatusCode, Json<AiTaskResponse>)> {
    if request.text.trim().is_empty() {
        return Err(map_todo_error(TodoError::EmptyTitle));
    }

    let (draft, failure) = if state.enrichment.is_available() {
        state
            .enrichment
            .parse_or_fallback(&request.text, today())
            .await
    } else {
        (
            TaskDraft::from_text(request.text.as_str()),
            Some(EnrichError::unavailable("no API key configured")),
        )
    };

    let task = state.tasks.add_task(draft).await.map_err(map_todo_error)?;
    info!(task_id = %task.id, enriched = failure.is_none(), "Task added from text");

    Ok((
        StatusCode::CREATED,
        Json(AiTaskResponse {
            task,
            enriched: failure.is_none(),
            warning: failure.map(|e| e.to_string()),
        }),
    ))
}

/// Get one task.
pub(super) async fn get_task_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Task>> {
    state.tasks.get_task(&id).await.map(Json).map_err(map_todo_error)
}

/// Partially update a task.
pub(super) async fn update_task_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(update): Json<TaskUpdate>,
) -> ApiResult<Json<Task>> {
    state
        .tasks
        .update_task(&id, update)
        .await
        .map(Json)
        .map_err(map_todo_error)
}

/// Delete a task.
pub(super) async fn delete_task_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Task>> {
    state
        .tasks
        .delete_task(&id)
        .await
        .map(Json)
        .map_err(map_todo_error)
}

/// Flip a task's completion flag.
pub(super) async fn toggle_task_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Task>> {
    state
        .tasks
        .toggle_done(&id)
        .await
        .map(Json)
        .map_err(map_todo_error)
}

/// Append a subtask.
pub(super) async fn add_subtask_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<SubtaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let task = state
        .tasks
        .add_subtask(&id, &request.title)
        .await
        .map_err(map_todo_error)?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// Change a subtask's done flag and/or title.
pub(super) async fn update_subtask_handler(
    State(state): State<Arc<AppState>>,
    Path((id, index)): Path<(String, usize)>,
    Json(request): Json<SubtaskUpdateRequest>,
) -> ApiResult<Json<Task>> {
    state
        .tasks
        .update_subtask(&id, index, request.title.as_deref(), request.done)
        .await
        .map(Json)
        .map_err(map_todo_error)
}

/// Remove a subtask.
pub(super) async fn delete_subtask_handler(
    State(state): State<Arc<AppState>>,
    Path((id, index)): Path<(String, usize)>,
) -> ApiResult<Json<Task>> {
    state
        .tasks
        .remove_subtask(&id, index)
        .await
        .map(Json)
        .map_err(map_todo_error)
}

/// Ask the model for subtasks and append them.
pub(super) async fn breakdown_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<BreakdownResponse>> {
    let task = state.tasks.get_task(&id).await.map_err(map_todo_error)?;

    if !state.enrichment.is_available() {
        return Ok(Json(BreakdownResponse {
            task,
            added: 0,
            warning: Some(EnrichError::unavailable("no API key configured").to_string()),
        }));
    }

    match state.enrichment.breakdown(&task.title).await {
        Ok(subtasks) => {
            let added = subtasks.len();
            let task = state
                .tasks
                .add_subtasks(&id, &subtasks)
                .await
                .map_err(map_todo_error)?;
            Ok(Json(BreakdownResponse {
                task,
                added,
                warning: None,
            }))
        }
        Err(err) => {
            warn!(task_id = %id, error = %err, "Breakdown failed");
            Ok(Json(BreakdownResponse {
                task,
                added: 0,
                warning: Some(err.to_string()),
            }))
        }
    }
}

/// Ask the model to reassign priorities across all tasks.
pub(super) async fn prioritize_handler(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<PrioritizeResponse>> {
    if !state.enrichment.is_available() {
        return Ok(Json(PrioritizeResponse {
            changed: 0,
            suggestions: Vec::new(),
            warning: Some(EnrichError::unavailable("no API key configured").to_string()),
        }));
    }

    let tasks = state
        .tasks
        .list_tasks(&TaskFilter::default())
        .await
        .map_err(map_todo_error)?;

    match state.enrichment.prioritize(&tasks).await {
        Ok(suggestions) => {
            let changed = state
                .tasks
                .apply_priorities(&suggestions)
                .await
                .map_err(map_todo_error)?;
            Ok(Json(PrioritizeResponse {
                changed,
                suggestions,
                warning: None,
            }))
        }
        Err(err) => {
            warn!(error = %err, "Prioritization failed");
            Ok(Json(PrioritizeResponse {
                changed: 0,
                suggestions: Vec::new(),
                warning: Some(err.to_string()),
            }))
        }
    }
}

/// Mark every task done.
pub(super) async fn complete_all_handler(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<CompleteAllResponse>> {
    let changed = state.tasks.mark_all_done().await.map_err(map_todo_error)?;
    Ok(Json(CompleteAllResponse { changed }))
}
