//! Handlers for deliverables embedded in a project.
//!
//! Each response echoes the updated project snapshot.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use opsportal_core::aggregate::AggregateKind;
use opsportal_core::attachment::{Attachment, NewAttachment};
use opsportal_core::deliverable::{Deliverable, DeliverableStatus, NewDeliverable};
use opsportal_core::project::Project;
use opsportal_core::types::EntityId;
use opsportal_events::LifecycleEvent;
use serde::{Deserialize, Serialize};

use super::{ChangeStatusRequest, MessageRequest};
use crate::error::AppResult;
use crate::middleware::acting_user::ActingUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct AddBlockerRequest {
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub note: String,
}

#[derive(Debug, Serialize)]
pub struct DeliverableCreated {
    pub project: Project,
    pub deliverable: Deliverable,
}

#[derive(Debug, Serialize)]
pub struct BlockerAdded {
    pub project: Project,
    pub blocker_id: EntityId,
}

#[derive(Debug, Serialize)]
pub struct DeliverableAttachmentAdded {
    pub project: Project,
    pub attachment: Attachment,
}

fn deliverable_event(event_type: &str, project_id: EntityId, actor: String) -> LifecycleEvent {
    LifecycleEvent::new(event_type)
        .with_source(AggregateKind::Project, project_id)
        .with_actor(actor)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/projects/{id}/deliverables
pub async fn create_deliverable(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Path(id): Path<EntityId>,
    Json(input): Json<NewDeliverable>,
) -> AppResult<(StatusCode, Json<DataResponse<DeliverableCreated>>)> {
    let (project, deliverable) = state
        .engine
        .create_deliverable(id, &input, &actor)
        .await?;

    state.event_bus.publish(
        deliverable_event("deliverable.created", id, actor.user_id)
            .with_payload(serde_json::json!({ "deliverable_id": deliverable.id })),
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: DeliverableCreated {
                project,
                deliverable,
            },
        }),
    ))
}

/// PUT /api/v1/projects/{id}/deliverables/{deliverable_id}/status
pub async fn change_status(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Path((id, deliverable_id)): Path<(EntityId, EntityId)>,
    Json(input): Json<ChangeStatusRequest<DeliverableStatus>>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = state
        .engine
        .change_deliverable_status(id, deliverable_id, input.status, &actor)
        .await?;

    state.event_bus.publish(
        deliverable_event("deliverable.status_changed", id, actor.user_id).with_payload(
            serde_json::json!({
                "deliverable_id": deliverable_id,
                "to": input.status,
            }),
        ),
    );

    Ok(Json(DataResponse { data: project }))
}

/// POST /api/v1/projects/{id}/deliverables/{deliverable_id}/blockers
pub async fn add_blocker(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Path((id, deliverable_id)): Path<(EntityId, EntityId)>,
    Json(input): Json<AddBlockerRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<BlockerAdded>>)> {
    let (project, blocker_id) = state
        .engine
        .add_blocker(id, deliverable_id, &input.description, &actor)
        .await?;

    state.event_bus.publish(
        deliverable_event("blocker.added", id, actor.user_id).with_payload(serde_json::json!({
            "deliverable_id": deliverable_id,
            "blocker_id": blocker_id,
        })),
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: BlockerAdded {
                project,
                blocker_id,
            },
        }),
    ))
}

/// PUT /api/v1/projects/{id}/deliverables/{deliverable_id}/blockers/{blocker_id}/resolve
pub async fn resolve_blocker(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Path((id, deliverable_id, blocker_id)): Path<(EntityId, EntityId, EntityId)>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = state
        .engine
        .resolve_blocker(id, deliverable_id, blocker_id, &actor)
        .await?;

    state.event_bus.publish(
        deliverable_event("blocker.resolved", id, actor.user_id).with_payload(
            serde_json::json!({
                "deliverable_id": deliverable_id,
                "blocker_id": blocker_id,
            }),
        ),
    );

    Ok(Json(DataResponse { data: project }))
}

/// POST /api/v1/projects/{id}/deliverables/{deliverable_id}/comments
pub async fn add_comment(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Path((id, deliverable_id)): Path<(EntityId, EntityId)>,
    Json(input): Json<MessageRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Project>>)> {
    let project = state
        .engine
        .add_comment(id, deliverable_id, &input.message, &actor)
        .await?;

    state.event_bus.publish(
        deliverable_event("comment.added", id, actor.user_id)
            .with_payload(serde_json::json!({ "deliverable_id": deliverable_id })),
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: project })))
}

/// POST /api/v1/projects/{id}/deliverables/{deliverable_id}/submit
///
/// Records the submission note; the status is left alone.
pub async fn submit(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Path((id, deliverable_id)): Path<(EntityId, EntityId)>,
    Json(input): Json<SubmitRequest>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = state
        .engine
        .submit_deliverable(id, deliverable_id, &input.note, &actor)
        .await?;

    state.event_bus.publish(
        deliverable_event("deliverable.submitted", id, actor.user_id)
            .with_payload(serde_json::json!({ "deliverable_id": deliverable_id })),
    );

    Ok(Json(DataResponse { data: project }))
}

/// POST /api/v1/projects/{id}/deliverables/{deliverable_id}/attachments
pub async fn add_attachment(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Path((id, deliverable_id)): Path<(EntityId, EntityId)>,
    Json(input): Json<NewAttachment>,
) -> AppResult<(StatusCode, Json<DataResponse<DeliverableAttachmentAdded>>)> {
    let (project, attachment) = state
        .engine
        .add_deliverable_attachment(id, deliverable_id, &input, &actor)
        .await?;

    state.event_bus.publish(
        deliverable_event("attachment.added", id, actor.user_id).with_payload(
            serde_json::json!({
                "deliverable_id": deliverable_id,
                "attachment_id": attachment.id,
            }),
        ),
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: DeliverableAttachmentAdded {
                project,
                attachment,
            },
        }),
    ))
}
