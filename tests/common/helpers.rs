//! Shared helper functions for integration tests

use axum::{
    body::{Body, Bytes},
    http::{self, Request, StatusCode},
    Router,
};
use blog_server::config::Config;
use blog_server::repositories::MemoryStore;
use blog_server::{create_router, AppState};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub const DEMO_TOKEN: &str = "demo-token";

pub fn test_config() -> Config {
    let mut config = Config::for_memory("integration-secret");
    config.demo_token = Some(DEMO_TOKEN.to_string());
    config
}

pub fn create_test_app() -> Router {
    create_test_app_with_store(MemoryStore::new())
}

/// Builds the router over a store the test keeps a handle to.
pub fn create_test_app_with_store(store: MemoryStore) -> Router {
    let config = test_config();
    create_router(AppState::new(Arc::new(store), &config), &config)
}

/// Sends one request and returns the status and the raw body bytes.
pub async fn send_raw(
    app: &Router,
    method: http::Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Bytes) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(http::header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes)
}

/// Sends one request and returns the status and the JSON body (`Null` when empty).
pub async fn send(
    app: &Router,
    method: http::Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let (status, bytes) = send_raw(app, method, uri, token, body).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    (status, value)
}

/// Registers a user named `name` and returns their token and id.
pub async fn signup(app: &Router, name: &str) -> (String, Uuid) {
    let (status, body) = send(
        app,
        http::Method::POST,
        "/api/auth/signup",
        None,
        Some(json!({
            "name": name,
            "email": format!("{}-{}@example.com", name.to_lowercase(), Uuid::new_v4().simple()),
            "password": "secret123",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "signup failed: {}", body);
    let token = body["token"].as_str().unwrap().to_string();
    let id = body["user"]["id"].as_str().unwrap().parse().unwrap();
    (token, id)
}

pub async fn create_test_post(app: &Router, token: &str, title: &str, category: &str) -> Uuid {
    let (status, body) = send(
        app,
        http::Method::POST,
        "/api/posts",
        Some(token),
        Some(json!({ "title": title, "content": "Post body", "category": category })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create post failed: {}", body);
    body["id"].as_str().unwrap().parse().unwrap()
}

pub async fn create_test_comment(
    app: &Router,
    token: &str,
    post_id: Uuid,
    content: &str,
    parent_id: Option<Uuid>,
) -> Uuid {
    let (status, body) = send(
        app,
        http::Method::POST,
        &format!("/api/posts/{}/comments", post_id),
        Some(token),
        Some(json!({ "content": content, "parentId": parent_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create comment failed: {}", body);
    body["id"].as_str().unwrap().parse().unwrap()
}

pub async fn comment_tree(app: &Router, post_id: Uuid) -> Value {
    let (status, body) = send(
        app,
        http::Method::GET,
        &format!("/api/posts/{}/comments", post_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body
}
