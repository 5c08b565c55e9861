//! Tests for `AppError` → HTTP response mapping, and for errors surfaced
//! through the router.

mod common;

use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use opsportal_api::error::AppError;
use opsportal_core::error::CoreError;
use serde_json::json;

/// Convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

// ---------------------------------------------------------------------------
// Direct mapping
// ---------------------------------------------------------------------------

#[tokio::test]
async fn not_found_error_returns_404() {
    let (status, json) = error_to_response(AppError::Core(CoreError::not_found("Project", "p-1"))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Project p-1 not found");
}

#[tokio::test]
async fn illegal_transition_returns_409() {
    let err = AppError::Core(CoreError::IllegalTransition {
        entity: "deliverable",
        from: "done".into(),
        to: "in-review".into(),
    });
    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "ILLEGAL_TRANSITION");
    assert_eq!(json["error"], "cannot move deliverable from done to in-review");
}

#[tokio::test]
async fn invalid_attachment_reference_returns_400() {
    let err = AppError::Core(CoreError::InvalidAttachmentReference("empty".into()));
    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_ATTACHMENT_REFERENCE");
}

#[tokio::test]
async fn dependency_unavailable_returns_503_without_details() {
    let err = AppError::Core(CoreError::DependencyUnavailable(
        "pool timed out connecting to db-primary:5432".into(),
    ));
    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["code"], "DEPENDENCY_UNAVAILABLE");
    assert!(!json["error"].as_str().unwrap().contains("db-primary"));
}

#[tokio::test]
async fn internal_error_returns_500_and_sanitizes_message() {
    let (status, json) =
        error_to_response(AppError::InternalError("secret connection string".into())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}

// ---------------------------------------------------------------------------
// Through the router
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_acting_user_returns_400() {
    let app = common::build_test_app();
    let response = common::send(
        &app.router,
        Method::POST,
        "/api/v1/projects",
        None,
        Some(json!({ "title": "Budget", "description": "x" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = common::body_json(response).await;
    assert_eq!(json["code"], "BAD_REQUEST");
    assert_eq!(json["error"], "Missing x-user-id header");
}

#[tokio::test]
async fn unavailable_store_returns_503() {
    let app = common::build_test_app();
    app.store.set_unavailable(true);

    let response = common::get(&app.router, "/api/v1/projects").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn resolve_endpoint_normalizes_and_rejects() {
    let app = common::build_test_app();

    let response = common::post_json(
        &app.router,
        "/api/v1/attachments/resolve",
        "U1",
        json!({ "stored_ref": "/srv/portal/uploads/projects/a/b.txt" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_json(response).await["data"]["key"], "a/b.txt");

    let response = common::post_json(
        &app.router,
        "/api/v1/attachments/resolve",
        "U1",
        json!({ "stored_ref": "uploads/../etc/passwd" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn core_errors_convert_into_app_errors() {
    let err: AppError = CoreError::BlockerNotFound {
        blocker_id: uuid::Uuid::nil(),
    }
    .into();
    assert_matches::assert_matches!(err, AppError::Core(CoreError::BlockerNotFound { .. }));

    let (status, json) = error_to_response(err).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "BLOCKER_NOT_FOUND");
}
