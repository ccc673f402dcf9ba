//! Server-rendered task page.

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Html,
};
use handlebars::Handlebars;
use serde::Serialize;

use super::handlers::{current_status, map_todo_error, ListQuery, StatusResponse};
use super::AppState;
use crate::domain::today;
use crate::entities::{Task, TaskFilter, TaskPriority};
use crate::errors::{TodoError, TodoResult};

const INDEX_TEMPLATE: &str = include_str!("../../templates/index.html.hbs");

/// Compiled page template. HTML escaping stays on.
pub struct PageRenderer {
    handlebars: Handlebars<'static>,
}

impl PageRenderer {
    /// Compile the page template.
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::ConfigError`] if the template does not compile.
    pub fn new() -> TodoResult<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        handlebars
            .register_template_string("index", INDEX_TEMPLATE)
            .map_err(|e| TodoError::ConfigError {
                reason: format!("invalid page template: {e}"),
            })?;
        Ok(Self { handlebars })
    }

    fn render(&self, context: &PageContext) -> TodoResult<String> {
        self.handlebars
            .render("index", context)
            .map_err(|e| TodoError::ConfigError {
                reason: format!("failed to render page: {e}"),
            })
    }
}

#[derive(Debug, Serialize)]
struct PageContext {
    status: StatusResponse,
    tasks: Vec<TaskView>,
    filter: FilterView,
    key_env_var: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct FilterView {
    open_only: bool,
    priorities: Vec<PriorityOption>,
    tags: Vec<TagOption>,
    any_tag_selected: bool,
}

#[derive(Debug, Serialize)]
struct PriorityOption {
    value: String,
    label: &'static str,
    checked: bool,
}

#[derive(Debug, Serialize)]
struct TagOption {
    name: String,
    selected: bool,
}

#[derive(Debug, Serialize)]
struct TaskView {
    id: String,
    title: String,
    done: bool,
    due: Option<String>,
    overdue: bool,
    priority: Option<&'static str>,
    tags: Vec<String>,
    subtasks: Vec<SubtaskView>,
    subtask_progress: Option<String>,
}

#[derive(Debug, Serialize)]
struct SubtaskView {
    index: usize,
    title: String,
    done: bool,
}

impl TaskView {
    fn new(task: Task, today: chrono::NaiveDate) -> Self {
        let subtask_progress = (!task.subtasks.is_empty())
            .then(|| format!("{}/{}", task.completed_subtasks(), task.subtasks.len()));
        Self {
            overdue: !task.done && task.due.is_some_and(|d| d < today),
            due: task.due.map(|d| d.format("%Y-%m-%d").to_string()),
            priority: task.priority.map(TaskPriority::label),
            tags: task.tags.into_iter().collect(),
            subtasks: task
                .subtasks
                .into_iter()
                .enumerate()
                .map(|(index, s)| SubtaskView {
                    index,
                    title: s.title,
                    done: s.done,
                })
                .collect(),
            subtask_progress,
            id: task.id,
            title: task.title,
            done: task.done,
        }
    }
}

async fn build_context(state: &AppState, query: &ListQuery) -> TodoResult<PageContext> {
    let filter = query.to_filter()?;
    let all = state.tasks.list_tasks(&TaskFilter::default()).await?;
    let known_tags: BTreeSet<String> = all.iter().flat_map(|t| t.tags.iter().cloned()).collect();

    let today = today();
    let tasks = all
        .into_iter()
        .filter(|t| filter.matches(t))
        .map(|t| TaskView::new(t, today))
        .collect();

    let status = current_status(state).await?;
    let key_env_var = (!status.ai_enabled)
        .then(|| state.enrichment.key_env_var())
        .flatten();

    Ok(PageContext {
        status,
        tasks,
        filter: FilterView {
            open_only: filter.open_only,
            priorities: TaskPriority::ALL
                .iter()
                .map(|p| PriorityOption {
                    value: p.to_string(),
                    label: p.label(),
                    checked: filter.priorities.contains(p),
                })
                .collect(),
            any_tag_selected: filter.tag.is_some(),
            tags: known_tags
                .into_iter()
                .map(|name| TagOption {
                    selected: filter.tag.as_deref() == Some(name.as_str()),
                    name,
                })
                .collect(),
        },
        key_env_var,
    })
}

/// Render the page.
pub(super) async fn index_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Html<String>, (StatusCode, String)> {
    let context = build_context(&state, &query)
        .await
        .map_err(map_todo_error)?;
    state.page.render(&context).map(Html).map_err(map_todo_error)
}
