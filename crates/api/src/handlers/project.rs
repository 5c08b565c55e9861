//! Handlers for the `/projects` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use opsportal_core::aggregate::AggregateKind;
use opsportal_core::engine::ProjectFilter;
use opsportal_core::lifecycle::ProjectStatus;
use opsportal_core::project::{NewProject, Project};
use opsportal_core::types::EntityId;
use opsportal_events::LifecycleEvent;

use super::ChangeStatusRequest;
use crate::error::AppResult;
use crate::middleware::acting_user::ActingUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/projects
///
/// Create a project in the acting user's department, led by them.
pub async fn create_project(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Json(input): Json<NewProject>,
) -> AppResult<(StatusCode, Json<DataResponse<Project>>)> {
    let project = state.engine.create_project(&input, &actor).await?;

    state.event_bus.publish(
        LifecycleEvent::new("project.created")
            .with_source(AggregateKind::Project, project.id)
            .with_actor(actor.user_id)
            .with_payload(serde_json::json!({
                "project_number": project.project_number,
                "department": project.department,
            })),
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: project })))
}

/// GET /api/v1/projects
///
/// Optional `department` and `status` query filters.
pub async fn list_projects(
    State(state): State<AppState>,
    Query(filter): Query<ProjectFilter>,
) -> AppResult<Json<DataResponse<Vec<Project>>>> {
    let projects = state.engine.list_projects(&filter).await?;
    Ok(Json(DataResponse { data: projects }))
}

/// GET /api/v1/projects/{id}
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = state.engine.get_project(id).await?;
    Ok(Json(DataResponse { data: project }))
}

/// PUT /api/v1/projects/{id}/status
pub async fn change_status(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Path(id): Path<EntityId>,
    Json(input): Json<ChangeStatusRequest<ProjectStatus>>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = state
        .engine
        .change_project_status(id, input.status, &actor)
        .await?;

    state.event_bus.publish(
        LifecycleEvent::new("project.status_changed")
            .with_source(AggregateKind::Project, id)
            .with_actor(actor.user_id)
            .with_payload(serde_json::json!({ "to": input.status })),
    );

    Ok(Json(DataResponse { data: project }))
}
