//! Handlers for the `/sprints` resource and its actions.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use opsportal_core::aggregate::AggregateKind;
use opsportal_core::deliverable::DeliverableStatus;
use opsportal_core::engine::SprintFilter;
use opsportal_core::lifecycle::SprintStatus;
use opsportal_core::sprint::{Action, NewAction, NewSprint, Sprint};
use opsportal_core::types::EntityId;
use opsportal_events::LifecycleEvent;
use serde::Serialize;

use super::ChangeStatusRequest;
use crate::error::AppResult;
use crate::middleware::acting_user::ActingUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Response for action creation: the new action and the updated sprint.
#[derive(Debug, Serialize)]
pub struct ActionCreated {
    pub sprint: Sprint,
    pub action: Action,
}

/// POST /api/v1/sprints
pub async fn create_sprint(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Json(input): Json<NewSprint>,
) -> AppResult<(StatusCode, Json<DataResponse<Sprint>>)> {
    let sprint = state.engine.create_sprint(&input, &actor).await?;

    state.event_bus.publish(
        LifecycleEvent::new("sprint.created")
            .with_source(AggregateKind::Sprint, sprint.id)
            .with_actor(actor.user_id)
            .with_payload(serde_json::json!({
                "sprint_number": sprint.sprint_number,
                "project_id": sprint.project_id,
            })),
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: sprint })))
}

/// GET /api/v1/sprints
///
/// Optional `department`, `project_id` and `status` query filters.
pub async fn list_sprints(
    State(state): State<AppState>,
    Query(filter): Query<SprintFilter>,
) -> AppResult<Json<DataResponse<Vec<Sprint>>>> {
    let sprints = state.engine.list_sprints(&filter).await?;
    Ok(Json(DataResponse { data: sprints }))
}

/// GET /api/v1/sprints/{id}
pub async fn get_sprint(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> AppResult<Json<DataResponse<Sprint>>> {
    let sprint = state.engine.get_sprint(id).await?;
    Ok(Json(DataResponse { data: sprint }))
}

/// PUT /api/v1/sprints/{id}/status
pub async fn change_status(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Path(id): Path<EntityId>,
    Json(input): Json<ChangeStatusRequest<SprintStatus>>,
) -> AppResult<Json<DataResponse<Sprint>>> {
    let sprint = state
        .engine
        .change_sprint_status(id, input.status, &actor)
        .await?;

    state.event_bus.publish(
        LifecycleEvent::new("sprint.status_changed")
            .with_source(AggregateKind::Sprint, id)
            .with_actor(actor.user_id)
            .with_payload(serde_json::json!({ "to": input.status })),
    );

    Ok(Json(DataResponse { data: sprint }))
}

/// POST /api/v1/sprints/{id}/actions
pub async fn create_action(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Path(id): Path<EntityId>,
    Json(input): Json<NewAction>,
) -> AppResult<(StatusCode, Json<DataResponse<ActionCreated>>)> {
    let (sprint, action) = state.engine.create_action(id, &input, &actor).await?;

    state.event_bus.publish(
        LifecycleEvent::new("action.created")
            .with_source(AggregateKind::Sprint, id)
            .with_actor(actor.user_id)
            .with_payload(serde_json::json!({ "action_id": action.id })),
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: ActionCreated { sprint, action },
        }),
    ))
}

/// PUT /api/v1/sprints/{id}/actions/{action_id}/status
pub async fn change_action_status(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Path((id, action_id)): Path<(EntityId, EntityId)>,
    Json(input): Json<ChangeStatusRequest<DeliverableStatus>>,
) -> AppResult<Json<DataResponse<Sprint>>> {
    let sprint = state
        .engine
        .change_action_status(id, action_id, input.status, &actor)
        .await?;

    state.event_bus.publish(
        LifecycleEvent::new("action.status_changed")
            .with_source(AggregateKind::Sprint, id)
            .with_actor(actor.user_id)
            .with_payload(serde_json::json!({
                "action_id": action_id,
                "to": input.status,
            })),
    );

    Ok(Json(DataResponse { data: sprint }))
}
