use crate::server::AppContext;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use reelforge_workflow::{SharedTask, TaskContext, WorkflowError};
use serde::Deserialize;
use serde_json::{json, Value};

pub fn api_routes() -> Router<AppContext> {
    Router::new()
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/:id", get(get_task))
}

async fn health(State(ctx): State<AppContext>) -> impl IntoResponse {
    let stats = ctx.registry.stats();
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "agent_mode": ctx.config.agents.mode.to_string(),
        "output_dir": ctx.config.storage.output_dir.display().to_string(),
        "stats": {
            "registered": stats.registered,
            "in_flight": stats.in_flight(),
            "success_rate": stats.success_rate()
        }
    }))
}

async fn stats(State(ctx): State<AppContext>) -> impl IntoResponse {
    Json(ctx.registry.stats())
}

#[derive(Deserialize)]
struct CreateTaskRequest {
    persona: String,
    #[serde(default = "default_wait")]
    wait: bool,
}

fn default_wait() -> bool {
    true
}

async fn create_task(
    State(ctx): State<AppContext>,
    Json(payload): Json<CreateTaskRequest>,
) -> Response {
    let persona = payload.persona.trim().to_string();
    if persona.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Persona cannot be empty");
    }

    let task = ctx.registry.register(persona);

    if !payload.wait {
        let snapshot = task.read().clone();
        let registry = ctx.registry.clone();
        tokio::task::spawn_blocking(move || {
            if let Err(e) = registry.execute(&task) {
                tracing::warn!("Background task failed: {}", e);
            }
        });
        return task_response(StatusCode::ACCEPTED, &snapshot, None);
    }

    let registry = ctx.registry.clone();
    let handle = task.clone();
    let outcome = tokio::task::spawn_blocking(move || registry.execute(&handle)).await;

    match outcome {
        Ok(Ok(finished)) => task_response(StatusCode::OK, &finished, None),
        Ok(Err(e)) => failure_response(&task, &e),
        Err(e) => {
            tracing::error!("Pipeline worker panicked: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Pipeline worker failed")
        }
    }
}

fn failure_response(task: &SharedTask, error: &WorkflowError) -> Response {
    let snapshot = task.read().clone();
    let status = match error {
        WorkflowError::StageFailed { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::CONFLICT,
    };
    task_response(status, &snapshot, Some(error.to_string()))
}

async fn list_tasks(State(ctx): State<AppContext>) -> Response {
    let views: Result<Vec<Value>, _> = ctx
        .registry
        .list_tasks()
        .iter()
        .map(TaskContext::to_view)
        .collect();

    match views {
        Ok(views) => Json(views).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

async fn get_task(State(ctx): State<AppContext>, Path(id): Path<String>) -> Response {
    match ctx.registry.get_task(&id) {
        Some(task) => task_response(StatusCode::OK, &task, None),
        None => error_response(StatusCode::NOT_FOUND, &format!("Task not found: {}", id)),
    }
}

fn task_response(status: StatusCode, task: &TaskContext, error: Option<String>) -> Response {
    let view = match task.to_view() {
        Ok(view) => view,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    };

    let body = match error {
        Some(error) => json!({ "task": view, "error": error }),
        None => json!({ "task": view }),
    };
    (status, Json(body)).into_response()
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
