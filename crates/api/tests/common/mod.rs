#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use opsportal_core::directory::StaticDirectory;
use opsportal_core::engine::{EngineConfig, LifecycleEngine};
use opsportal_core::store::{EntityStore, MemoryStore};
use opsportal_events::EventBus;
use serde_json::Value;
use tower::ServiceExt;

use opsportal_api::config::ServerConfig;
use opsportal_api::router::build_app_router;
use opsportal_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        engine: EngineConfig::default(),
    }
}

/// Finance (head U1) and Engineering (head U3), two employees each.
pub fn test_directory() -> StaticDirectory {
    StaticDirectory::new()
        .with_employee("U1", "Uma", "Finance")
        .with_employee("U2", "Ben", "Engineering")
        .with_employee("U3", "Cy", "Engineering")
        .with_employee("U4", "Dee", "Finance")
        .with_head("Finance", "U1", "Uma")
        .with_head("Engineering", "U3", "Cy")
}

/// A running application plus handles on its collaborators.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub event_bus: Arc<EventBus>,
}

/// Build the full application router over an in-memory store and the test
/// directory, with the production middleware stack.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let store = Arc::new(MemoryStore::new());
    let event_bus = Arc::new(EventBus::default());

    let engine = LifecycleEngine::new(
        Arc::clone(&store) as Arc<dyn EntityStore>,
        Arc::new(test_directory()),
        config.engine.clone(),
    );
    let state = AppState {
        engine: Arc::new(engine),
        config: Arc::new(config.clone()),
        event_bus: Arc::clone(&event_bus),
    };

    TestApp {
        router: build_app_router(state, &config),
        store,
        event_bus,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Send a request as `user` (when given) with an optional JSON body.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn post_json(app: &Router, uri: &str, user: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(user), Some(body)).await
}

pub async fn put_json(app: &Router, uri: &str, user: &str, body: Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(user), Some(body)).await
}

pub async fn delete(app: &Router, uri: &str, user: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(user), None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Create a project as `user` and return its `data` payload.
pub async fn create_project(app: &Router, user: &str, title: &str) -> Value {
    let response = post_json(
        app,
        "/api/v1/projects",
        user,
        serde_json::json!({ "title": title, "description": "Quarter close" }),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["data"].clone()
}
