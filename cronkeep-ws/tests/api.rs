use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use chrono::{TimeZone, Utc};
use cronkeep_database::memory::InMemoryDb;
use cronkeep_scheduler::{TaskService, clock::ManualClock, next_run::ReferenceZone};
use cronkeep_ws::build_router;
use serde_json::{Value, json};
use tower::ServiceExt;

fn app() -> Router {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
    ));
    let service = TaskService::new(Arc::new(InMemoryDb::new()), clock, ReferenceZone::Utc);
    build_router(service)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            request = request.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn health_answers() {
    let app = app();
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn create_returns_task_with_both_next_run_renderings() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/tasks",
        Some(json!({"name": "Daily Backup", "scheduleType": "DAILY"})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["task"]["cronExpression"], json!("0 0 * * *"));
    assert_eq!(body["task"]["scheduleData"], json!({"hour": 0, "minute": 0}));
    assert_eq!(body["task"]["nextRunTime"], json!("2024-01-02T00:00:00Z"));
    assert!(body["task"]["nextRunTimeLocal"].is_string());
    assert_eq!(body["task"]["isDeleted"], json!(false));
}

#[tokio::test]
async fn invalid_submissions_are_failure_results() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/tasks",
        Some(json!({"name": "", "scheduleType": "YEARLY"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["code"], json!("validation_error"));

    let (status, body) = send(
        &app,
        "POST",
        "/tasks",
        Some(json!({"name": "Broken", "scheduleType": "CUSTOM", "cronExpression": "0 0 * *"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("invalid_schedule_expression"));
}

#[tokio::test]
async fn update_and_delete_round_trip() {
    let app = app();
    let (_, created) = send(
        &app,
        "POST",
        "/tasks",
        Some(json!({"name": "Report", "scheduleType": "DAILY"})),
    )
    .await;
    let id = created["task"]["id"].as_str().unwrap().to_string();

    let (status, updated) = send(
        &app,
        "PATCH",
        &format!("/tasks/{id}"),
        Some(json!({"name": "Monthly Report", "scheduleType": "MONTHLY"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["task"]["name"], json!("Monthly Report"));
    assert_eq!(updated["task"]["nextRunTime"], json!("2024-02-01T00:00:00Z"));

    let (status, deleted) = send(&app, "DELETE", &format!("/tasks/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["task"]["isDeleted"], json!(true));
    assert!(deleted["task"]["deletedAt"].is_string());

    let (_, page) = send(&app, "GET", "/tasks", None).await;
    assert_eq!(page["total"], json!(0));

    let (status, again) = send(&app, "DELETE", &format!("/tasks/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(again["code"], json!("not_found"));
}

#[tokio::test]
async fn update_of_unknown_task_is_not_found() {
    let app = app();
    let (status, body) = send(
        &app,
        "PATCH",
        "/tasks/6f1c2a4e-8d1b-4c3a-9e2f-0a1b2c3d4e5f",
        Some(json!({"name": "Ghost", "scheduleType": "DAILY"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn list_uses_query_paging() {
    let app = app();
    for i in 0..25 {
        send(
            &app,
            "POST",
            "/tasks",
            Some(json!({"name": format!("task {i}"), "scheduleType": "HOURLY"})),
        )
        .await;
    }

    let (status, page) = send(&app, "GET", "/tasks?page=1&pageSize=10", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["tasks"].as_array().unwrap().len(), 10);
    assert_eq!(page["total"], json!(25));
    assert_eq!(page["totalPages"], json!(3));

    let (_, defaults) = send(&app, "GET", "/tasks", None).await;
    assert_eq!(defaults["page"], json!(1));
    assert_eq!(defaults["pageSize"], json!(10));

    let (status, body) = send(&app, "GET", "/tasks?page=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("validation_error"));
}

async fn send_raw(app: &Router, method: &str, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).expect("json body"))
}

#[tokio::test]
async fn unreadable_bodies_are_failure_results() {
    let app = app();

    let (status, body) = send(
        &app,
        "POST",
        "/tasks",
        Some(json!({"name": 5, "scheduleType": "DAILY"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["code"], json!("validation_error"));

    let (status, body) = send_raw(&app, "POST", "/tasks", "not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["code"], json!("validation_error"));

    let (_, page) = send(&app, "GET", "/tasks", None).await;
    assert_eq!(page["total"], json!(0));
}

#[tokio::test]
async fn malformed_ids_are_not_found() {
    let app = app();

    let (status, body) = send(
        &app,
        "PATCH",
        "/tasks/not-a-uuid",
        Some(json!({"name": "Ghost", "scheduleType": "DAILY"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["code"], json!("not_found"));

    let (status, body) = send(&app, "DELETE", "/tasks/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], json!("not_found"));
}

#[tokio::test]
async fn unparsable_paging_is_a_validation_error() {
    let app = app();
    let (status, body) = send(&app, "GET", "/tasks?page=abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("validation_error"));
}
