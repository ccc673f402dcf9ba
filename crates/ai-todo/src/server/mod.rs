//! HTTP server for the to-do page and its JSON API.
//!
//! Provides endpoints for:
//! - Health and status checks
//! - Manual task CRUD and subtask management
//! - AI-assisted task entry, breakdown and prioritization
//! - The server-rendered page at `/`

use anyhow::Result;
use axum::{
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::domain::{EnrichmentAdapter, TasksDomain};
use crate::errors::TodoResult;

mod handlers;
mod page;

pub use page::PageRenderer;

/// Server state shared across handlers.
pub struct AppState {
    /// Task store
    pub tasks: TasksDomain,
    /// AI enrichment, possibly disabled
    pub enrichment: EnrichmentAdapter,
    /// Page template
    pub page: PageRenderer,
}

impl AppState {
    /// Create a new server state.
    ///
    /// # Errors
    ///
    /// Returns an error if the page template cannot be compiled.
    pub fn new(tasks: TasksDomain, enrichment: EnrichmentAdapter) -> TodoResult<Self> {
        Ok(Self {
            tasks,
            enrichment,
            page: PageRenderer::new()?,
        })
    }
}

/// Build the HTTP router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(page::index_handler))
        .route("/health", get(handlers::health_handler))
        .route("/api/status", get(handlers::status_handler))
        .route(
            "/api/tasks",
            get(handlers::list_tasks_handler).post(handlers::create_task_handler),
        )
        .route("/api/tasks/ai", post(handlers::create_ai_task_handler))
        .route("/api/tasks/prioritize", post(handlers::prioritize_handler))
        .route("/api/tasks/complete-all", post(handlers::complete_all_handler))
        .route(
            "/api/tasks/{id}",
            get(handlers::get_task_handler)
                .patch(handlers::update_task_handler)
                .delete(handlers::delete_task_handler),
        )
        .route("/api/tasks/{id}/toggle", post(handlers::toggle_task_handler))
        .route("/api/tasks/{id}/subtasks", post(handlers::add_subtask_handler))
        .route("/api/tasks/{id}/breakdown", post(handlers::breakdown_handler))
        .route(
            "/api/tasks/{id}/subtasks/{index}",
            patch(handlers::update_subtask_handler).delete(handlers::delete_subtask_handler),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
///
/// # Errors
///
/// Returns an error if the server fails to start or bind to the address.
pub async fn run_server(state: Arc<AppState>, addr: &str) -> Result<()> {
    let ai = if state.enrichment.is_available() {
        "enabled"
    } else {
        "disabled"
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(ai, "AI To-Do listening on http://{addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
