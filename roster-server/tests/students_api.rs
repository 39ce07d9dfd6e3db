//! Router-level tests against the in-memory store and a failing store

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use roster_server::{build_router, AppState, CorsPolicy};
use roster_store::{DocumentStore, Fields, MemoryStore, Record, StoreError};

fn memory_app() -> Router {
    let store = MemoryStore::new();
    let state = AppState::new(
        Arc::new(store.collection("students")),
        Arc::new(store.collection("test")),
    );
    build_router(state, &CorsPolicy::Permissive)
}

/// Store whose every call fails like an unreachable backend
struct BrokenStore;

#[async_trait]
impl DocumentStore for BrokenStore {
    fn collection(&self) -> &str {
        "broken"
    }

    async fn add(&self, _fields: Fields) -> roster_store::Result<String> {
        Err(StoreError::remote(503, "backend unavailable"))
    }

    async fn list(&self) -> roster_store::Result<Vec<Record>> {
        Err(StoreError::remote(503, "backend unavailable"))
    }

    async fn get(&self, _id: &str) -> roster_store::Result<Record> {
        Err(StoreError::remote(503, "backend unavailable"))
    }

    async fn update(&self, _id: &str, _fields: Fields) -> roster_store::Result<()> {
        Err(StoreError::remote(503, "backend unavailable"))
    }

    async fn delete(&self, _id: &str) -> roster_store::Result<()> {
        Err(StoreError::remote(503, "backend unavailable"))
    }
}

fn broken_app() -> Router {
    let state = AppState::new(Arc::new(BrokenStore), Arc::new(BrokenStore));
    build_router(state, &CorsPolicy::Permissive)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

fn as_json(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

fn as_text(bytes: &[u8]) -> &str {
    std::str::from_utf8(bytes).unwrap()
}

async fn create(app: &Router, body: Value) -> String {
    let (status, bytes) = send(app, Method::POST, "/students", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    as_json(&bytes)["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn full_lifecycle() {
    let app = memory_app();

    let (status, bytes) = send(
        &app,
        Method::POST,
        "/students",
        Some(json!({"name": "Ana", "age": 20})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let created = as_json(&bytes);
    assert_eq!(created["message"], "Student created successfully");
    let id = created["id"].as_str().unwrap().to_string();
    let uri = format!("/students/{id}");

    let (status, bytes) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&bytes), json!({"id": id, "name": "Ana", "age": 20}));

    let (status, bytes) = send(&app, Method::PUT, &uri, Some(json!({"age": 21}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_text(&bytes), "Student updated successfully");

    let (_, bytes) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(as_json(&bytes), json!({"id": id, "name": "Ana", "age": 21}));

    let (status, bytes) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_text(&bytes), "Student deleted successfully");

    let (status, bytes) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(as_json(&bytes)["error"], "Student not found");
}

#[tokio::test]
async fn created_ids_are_fresh() {
    let app = memory_app();
    let a = create(&app, json!({"name": "Ana"})).await;
    let b = create(&app, json!({"name": "Ana"})).await;
    assert_ne!(a, b);
}

#[tokio::test]
async fn list_returns_heterogeneous_records() {
    let app = memory_app();
    let first = create(&app, json!({"name": "Ana", "age": 20})).await;
    let second = create(&app, json!({"tags": ["x", "y"], "address": {"city": "Hue"}})).await;
    let third = create(&app, json!({})).await;

    let (status, bytes) = send(&app, Method::GET, "/students", None).await;
    assert_eq!(status, StatusCode::OK);

    let listed = as_json(&bytes);
    let records = listed.as_array().unwrap();
    assert_eq!(records.len(), 3);

    let find = |id: &str| records.iter().find(|r| r["id"] == id).cloned().unwrap();
    assert_eq!(find(&first), json!({"id": first, "name": "Ana", "age": 20}));
    assert_eq!(
        find(&second),
        json!({"id": second, "tags": ["x", "y"], "address": {"city": "Hue"}})
    );
    assert_eq!(find(&third), json!({"id": third}));
}

#[tokio::test]
async fn list_of_empty_collection_is_empty_array() {
    let app = memory_app();
    let (status, bytes) = send(&app, Method::GET, "/students", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&bytes), json!([]));
}

#[tokio::test]
async fn deleted_records_leave_the_list() {
    let app = memory_app();
    let keep = create(&app, json!({"name": "Keep"})).await;
    let gone = create(&app, json!({"name": "Gone"})).await;

    send(&app, Method::DELETE, &format!("/students/{gone}"), None).await;

    let (_, bytes) = send(&app, Method::GET, "/students", None).await;
    assert_eq!(as_json(&bytes), json!([{"id": keep, "name": "Keep"}]));
}

#[tokio::test]
async fn update_of_missing_id_is_404() {
    let app = memory_app();
    let (status, bytes) = send(
        &app,
        Method::PUT,
        "/students/does-not-exist",
        Some(json!({"age": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(as_json(&bytes)["error"], "Student not found");
}

#[tokio::test]
async fn delete_of_missing_id_succeeds() {
    let app = memory_app();
    let (status, bytes) = send(&app, Method::DELETE, "/students/does-not-exist", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_text(&bytes), "Student deleted successfully");
}

#[tokio::test]
async fn empty_update_leaves_record_unchanged() {
    let app = memory_app();
    let id = create(&app, json!({"name": "Ana"})).await;
    let uri = format!("/students/{id}");

    let (status, _) = send(&app, Method::PUT, &uri, Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);

    let (_, bytes) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(as_json(&bytes), json!({"id": id, "name": "Ana"}));
}

#[tokio::test]
async fn client_supplied_id_never_replaces_store_id() {
    let app = memory_app();
    let id = create(&app, json!({"id": "spoofed", "name": "Ana"})).await;
    assert_ne!(id, "spoofed");

    let (_, bytes) = send(&app, Method::GET, &format!("/students/{id}"), None).await;
    assert_eq!(as_json(&bytes)["id"], id);
}

#[tokio::test]
async fn non_object_body_is_400() {
    let app = memory_app();

    let (status, bytes) = send(&app, Method::POST, "/students", Some(json!([1, 2, 3]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(as_json(&bytes)["error"], "Invalid request body");

    let request = Request::builder()
        .method(Method::POST)
        .uri("/students")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/students")
        .body(Body::from(r#"{"name":"Ana"}"#))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_body_is_413_in_error_shape() {
    let app = memory_app();
    let padding = "x".repeat(3 * 1024 * 1024);

    let (status, bytes) = send(
        &app,
        Method::POST,
        "/students",
        Some(json!({"name": "Ana", "notes": padding})),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(as_json(&bytes)["error"], "Invalid request body");

    let (_, bytes) = send(&app, Method::GET, "/students", None).await;
    assert_eq!(as_json(&bytes), json!([]));
}

#[tokio::test]
async fn unknown_routes_and_methods_use_error_shape() {
    let app = memory_app();

    let (status, bytes) = send(&app, Method::GET, "/courses", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let body = as_json(&bytes);
    assert_eq!(body["error"], "Route not found");
    assert_eq!(body["details"], "no route for GET /courses");

    let (status, bytes) = send(&app, Method::PATCH, "/students/abc", Some(json!({"a": 1}))).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    let body = as_json(&bytes);
    assert_eq!(body["error"], "Method not allowed");
    assert_eq!(body["details"], "PATCH is not supported on /students/abc");
}

#[tokio::test]
async fn probe_counts_probe_collection() {
    let store = MemoryStore::new();
    let probe = store.collection("test");
    probe.add(Fields::new()).await.unwrap();
    probe.add(Fields::new()).await.unwrap();

    let state = AppState::new(Arc::new(store.collection("students")), Arc::new(probe));
    let app = build_router(state, &CorsPolicy::Permissive);

    let (status, bytes) = send(&app, Method::GET, "/test", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        as_json(&bytes),
        json!({"message": "Test query successful", "count": 2})
    );
}

#[tokio::test]
async fn health_does_not_touch_store() {
    let app = broken_app();
    let (status, bytes) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&bytes)["status"], "ok");
}

#[tokio::test]
async fn store_failures_are_500_with_details() {
    let app = broken_app();
    let cases = [
        (Method::POST, "/students", Some(json!({"a": 1})), "Error creating student"),
        (Method::GET, "/students", None, "Error fetching students"),
        (Method::GET, "/students/x", None, "Error fetching student"),
        (Method::PUT, "/students/x", Some(json!({"a": 1})), "Error updating student"),
        (Method::DELETE, "/students/x", None, "Error deleting student"),
        (Method::GET, "/test", None, "Error in test query"),
    ];

    for (method, uri, body, summary) in cases {
        let (status, bytes) = send(&app, method.clone(), uri, body).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{method} {uri}");

        let body = as_json(&bytes);
        assert_eq!(body["error"], summary, "{method} {uri}");
        assert_eq!(body["details"], "backend unavailable (HTTP 503)");
    }
}

#[tokio::test]
async fn permissive_cors_answers_preflight() {
    let app = memory_app();
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/students")
        .header(header::ORIGIN, "https://frontend.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert!(response.status().is_success());
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}
