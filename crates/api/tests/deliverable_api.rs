//! Integration tests for deliverables: status machine, blockers, comments,
//! submission and the health they drive.

mod common;

use axum::http::{Method, StatusCode};
use axum::Router;
use common::{body_json, create_project, post_json, put_json};
use serde_json::{json, Value};

/// Create a project led by U1 and a deliverable assigned to U1.
async fn project_with_deliverable(app: &Router, due_date: Option<&str>) -> (String, String) {
    let project = create_project(app, "U1", "Budget").await;
    let id = project["id"].as_str().unwrap().to_string();

    let response = post_json(
        app,
        &format!("/api/v1/projects/{id}/deliverables"),
        "U1",
        json!({
            "title": "Draft forecast",
            "description": "Q3 numbers",
            "due_date": due_date,
            "assignees": ["U1"]
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let deliverable_id = body_json(response).await["data"]["deliverable"]["id"]
        .as_str()
        .unwrap()
        .to_string();
    (id, deliverable_id)
}

async fn set_status(app: &Router, id: &str, did: &str, status: &str) -> axum::response::Response {
    put_json(
        app,
        &format!("/api/v1/projects/{id}/deliverables/{did}/status"),
        "U1",
        json!({ "status": status }),
    )
    .await
}

// ---------------------------------------------------------------------------
// Status machine
// ---------------------------------------------------------------------------

#[tokio::test]
async fn deliverable_status_moves_forward_and_reopens() {
    let app = common::build_test_app();
    let (id, did) = project_with_deliverable(&app.router, None).await;

    let response = set_status(&app.router, &id, &did, "done").await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = set_status(&app.router, &id, &did, "in-review").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "ILLEGAL_TRANSITION");

    let response = set_status(&app.router, &id, &did, "in-progress").await;
    assert_eq!(response.status(), StatusCode::OK);
    let project = body_json(response).await["data"].clone();
    let history = project["deliverables"][0]["status_history"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1]["from"], "done");
    assert_eq!(history[1]["to"], "in-progress");

    let response = set_status(&app.router, &id, &did, "pending").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn assignees_must_be_project_members() {
    let app = common::build_test_app();
    let project = create_project(&app.router, "U1", "Budget").await;
    let id = project["id"].as_str().unwrap();

    let response = post_json(
        &app.router,
        &format!("/api/v1/projects/{id}/deliverables"),
        "U1",
        json!({
            "title": "Draft forecast",
            "description": "Ledger tie-out",
            "assignees": ["U2"]
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn overdue_deliverable_makes_the_project_delayed() {
    let app = common::build_test_app();
    let project = create_project(&app.router, "U1", "Budget").await;
    let id = project["id"].as_str().unwrap();

    let response = post_json(
        &app.router,
        &format!("/api/v1/projects/{id}/deliverables"),
        "U1",
        json!({
            "title": "Late filing",
            "description": "Ledger tie-out",
            "due_date": "2020-01-31",
            "assignees": ["U1"]
        }),
    )
    .await;
    let project = body_json(response).await["data"]["project"].clone();
    assert_eq!(project["health"]["value"], "delayed");
    assert_eq!(project["health"]["source"], "derived");
}

// ---------------------------------------------------------------------------
// Blockers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn blockers_are_resolved_by_id() {
    let app = common::build_test_app();
    let (id, did) = project_with_deliverable(&app.router, Some("2099-12-31")).await;
    let blockers_uri = format!("/api/v1/projects/{id}/deliverables/{did}/blockers");

    let response = post_json(
        &app.router,
        &blockers_uri,
        "U1",
        json!({ "description": "Waiting on ledger export" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["project"]["health"]["value"], "at-risk");
    let blocker_id = data["blocker_id"].as_str().unwrap().to_string();

    let resolve_uri = format!("{blockers_uri}/{blocker_id}/resolve");
    let response = put_json(&app.router, &resolve_uri, "U1", json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let project = body_json(response).await["data"].clone();
    let blocker = &project["deliverables"][0]["blockers"][0];
    assert_eq!(blocker["is_resolved"], true);
    assert_eq!(blocker["resolved_by"], "U1");
    assert_eq!(project["health"]["value"], "healthy");

    let response = put_json(&app.router, &resolve_uri, "U1", json!({})).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn unknown_blocker_returns_404_and_changes_nothing() {
    let app = common::build_test_app();
    let (id, did) = project_with_deliverable(&app.router, None).await;
    let blockers_uri = format!("/api/v1/projects/{id}/deliverables/{did}/blockers");
    post_json(&app.router, &blockers_uri, "U1", json!({ "description": "Open" })).await;

    let response = put_json(
        &app.router,
        &format!("{blockers_uri}/{}/resolve", uuid::Uuid::now_v7()),
        "U1",
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "BLOCKER_NOT_FOUND");

    let project = project_json(&app.router, &id).await;
    assert_eq!(project["deliverables"][0]["blockers"][0]["is_resolved"], false);
}

// ---------------------------------------------------------------------------
// Comments, submission, attachments
// ---------------------------------------------------------------------------

#[tokio::test]
async fn comments_and_submission_leave_status_alone() {
    let app = common::build_test_app();
    let (id, did) = project_with_deliverable(&app.router, None).await;
    let base = format!("/api/v1/projects/{id}/deliverables/{did}");

    let response = post_json(
        &app.router,
        &format!("{base}/comments"),
        "U1",
        json!({ "message": "First pass attached" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = post_json(
        &app.router,
        &format!("{base}/submit"),
        "U1",
        json!({ "note": "Ready for review" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let deliverable = body_json(response).await["data"]["deliverables"][0].clone();
    assert_eq!(deliverable["status"], "pending");
    assert_eq!(deliverable["submission"]["note"], "Ready for review");
    assert_eq!(deliverable["submission"]["submitted_by"], "U1");
    assert_eq!(deliverable["comments"][0]["message"], "First pass attached");

    let response = post_json(&app.router, &format!("{base}/submit"), "U1", json!({ "note": "" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deliverable_attachment_is_downloadable_through_the_project() {
    let app = common::build_test_app();
    let (id, did) = project_with_deliverable(&app.router, None).await;

    let response = post_json(
        &app.router,
        &format!("/api/v1/projects/{id}/deliverables/{did}/attachments"),
        "U1",
        json!({ "name": "forecast.xlsx", "stored_ref": "uploads/projects/forecast.xlsx" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let attachment_id = body_json(response).await["data"]["attachment"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = common::get(
        &app.router,
        &format!("/api/v1/projects/{id}/attachments/{attachment_id}/download"),
    )
    .await;
    assert_eq!(body_json(response).await["data"]["key"], "forecast.xlsx");
}

#[tokio::test]
async fn deliverables_require_an_active_project() {
    let app = common::build_test_app();
    let project = create_project(&app.router, "U1", "Budget").await;
    let id = project["id"].as_str().unwrap();
    put_json(
        &app.router,
        &format!("/api/v1/projects/{id}/status"),
        "U1",
        json!({ "status": "archived" }),
    )
    .await;

    let response = common::send(
        &app.router,
        Method::POST,
        &format!("/api/v1/projects/{id}/deliverables"),
        Some("U1"),
        Some(json!({ "title": "Late", "description": "Ledger tie-out", "assignees": ["U1"] })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

async fn project_json(app: &Router, id: &str) -> Value {
    body_json(common::get(app, &format!("/api/v1/projects/{id}")).await).await["data"].clone()
}
