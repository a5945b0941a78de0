use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch},
};
use cronkeep_database::interfaces::TaskStore;
use cronkeep_models::{
    core::TaskId,
    errors::ActionError,
    web::{ActionResult, TaskForm},
};
use cronkeep_scheduler::{TaskService, service::DEFAULT_PAGE_SIZE};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::Notify};

struct AppState<S> {
    service: TaskService<S>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    page: Option<u64>,
    page_size: Option<u64>,
}

pub fn build_router<S: TaskStore>(service: TaskService<S>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tasks", get(get_tasks::<S>).post(add_task::<S>))
        .route("/tasks/:id", patch(update_task::<S>).delete(delete_task::<S>))
        .with_state(AppState { service })
}

pub async fn run_webserver<S: TaskStore>(
    service: TaskService<S>,
    addr: SocketAddr,
    notify: Arc<Notify>,
) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, build_router(service))
        .with_graceful_shutdown(async move {
            notify.notified().await;
            info!("Shutting down web server...");
        })
        .await
}

async fn health() -> &'static str {
    "ok"
}

async fn get_tasks<S: TaskStore>(
    State(state): State<AppState<S>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Response {
    let params = match params {
        Ok(Query(params)) => params,
        Err(rejection) => return error_response(bad_request(rejection.body_text())),
    };
    let page = params.page.unwrap_or(1);
    let page_size = params.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    match state.service.list_tasks(page, page_size).await {
        Ok(tasks) => json_response(StatusCode::OK, tasks),
        Err(err) => error_response(err),
    }
}

async fn add_task<S: TaskStore>(
    State(state): State<AppState<S>>,
    form: Result<Json<TaskForm>, JsonRejection>,
) -> Response {
    let form = match form {
        Ok(Json(form)) => form,
        Err(rejection) => return rejected_body(rejection),
    };
    respond(state.service.create_task(&form).await, StatusCode::CREATED)
}

async fn update_task<S: TaskStore>(
    State(state): State<AppState<S>>,
    task_id: Result<Path<TaskId>, PathRejection>,
    form: Result<Json<TaskForm>, JsonRejection>,
) -> Response {
    let task_id = match task_id {
        Ok(Path(task_id)) => task_id,
        Err(rejection) => return rejected_id(rejection),
    };
    let form = match form {
        Ok(Json(form)) => form,
        Err(rejection) => return rejected_body(rejection),
    };
    info!("Updating task {}", task_id);
    respond(state.service.update_task(task_id, &form).await, StatusCode::OK)
}

async fn delete_task<S: TaskStore>(
    State(state): State<AppState<S>>,
    task_id: Result<Path<TaskId>, PathRejection>,
) -> Response {
    let task_id = match task_id {
        Ok(Path(task_id)) => task_id,
        Err(rejection) => return rejected_id(rejection),
    };
    info!("Deleting task {}", task_id);
    respond(state.service.delete_task(task_id).await, StatusCode::OK)
}

fn respond(result: ActionResult, success: StatusCode) -> Response {
    let status = match result.error() {
        None => success,
        Some(err) => status_for(err),
    };
    json_response(status, result)
}

fn rejected_body(rejection: JsonRejection) -> Response {
    respond(
        ActionResult::Failure(bad_request(rejection.body_text())),
        StatusCode::BAD_REQUEST,
    )
}

// an id that cannot be parsed names no task
fn rejected_id(rejection: PathRejection) -> Response {
    debug!("Rejected task id: {}", rejection.body_text());
    respond(
        ActionResult::Failure(ActionError::new("not_found", "task not found")),
        StatusCode::NOT_FOUND,
    )
}

fn bad_request(message: String) -> ActionError {
    ActionError::new("validation_error", message)
}

fn error_response(err: ActionError) -> Response {
    json_response(status_for(&err), err)
}

fn status_for(err: &ActionError) -> StatusCode {
    match err.code.as_str() {
        "validation_error" | "invalid_schedule_expression" => StatusCode::BAD_REQUEST,
        "not_found" => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn json_response<T>(status: StatusCode, payload: T) -> Response
where
    T: Serialize,
{
    (status, Json(payload)).into_response()
}
