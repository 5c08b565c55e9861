//! Handlers shared by projects and sprints: members, lead, health, chat and
//! attachments.
//!
//! Each handler is generic over the aggregate and mounted once per resource,
//! e.g. `post(add_member::<Project>)`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use opsportal_core::aggregate::Aggregate;
use opsportal_core::attachment::{Attachment, NewAttachment};
use opsportal_core::engine::MemberChange;
use opsportal_core::health::Health;
use opsportal_core::member::MemberRole;
use opsportal_core::types::{EmployeeId, EntityId};
use opsportal_events::LifecycleEvent;
use serde::{Deserialize, Serialize};

use super::MessageRequest;
use crate::error::AppResult;
use crate::middleware::acting_user::ActingUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub user_id: EmployeeId,
    /// Defaults to `member`, or `lead` for a project without one.
    pub role: Option<MemberRole>,
}

#[derive(Debug, Deserialize)]
pub struct ReassignLeadRequest {
    pub user_id: EmployeeId,
}

#[derive(Debug, Deserialize)]
pub struct SetHealthRequest {
    pub health: Health,
}

#[derive(Debug, Serialize)]
pub struct LeadReassigned<A> {
    pub aggregate: A,
    pub previous_lead: Option<EmployeeId>,
}

#[derive(Debug, Serialize)]
pub struct AttachmentAdded<A> {
    pub aggregate: A,
    pub attachment: Attachment,
}

#[derive(Debug, Serialize)]
pub struct DownloadReference {
    pub attachment_id: EntityId,
    /// Storage-relative key to hand to the file store.
    pub key: String,
}

fn event<A: Aggregate>(event_type: &str, id: EntityId, actor: EmployeeId) -> LifecycleEvent {
    LifecycleEvent::new(event_type)
        .with_source(A::KIND, id)
        .with_actor(actor)
}

// ---------------------------------------------------------------------------
// Members
// ---------------------------------------------------------------------------

/// POST /api/v1/{projects,sprints}/{id}/members
///
/// Returns 201 when members were added and 200 when the candidate was
/// already active.
pub async fn add_member<A: Aggregate>(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Path(id): Path<EntityId>,
    Json(input): Json<AddMemberRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<MemberChange<A>>>)> {
    let change = state
        .engine
        .add_member::<A>(id, &input.user_id, input.role, &actor)
        .await?;

    if change.already_member {
        return Ok((StatusCode::OK, Json(DataResponse { data: change })));
    }

    let added: Vec<_> = change
        .added
        .iter()
        .map(|m| serde_json::json!({ "user_id": m.user_id, "role": m.role }))
        .collect();
    state.event_bus.publish(
        event::<A>("member.added", id, actor.user_id).with_payload(serde_json::json!({
            "added": added,
            "escalation": change.escalation,
        })),
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: change })))
}

/// DELETE /api/v1/{projects,sprints}/{id}/members/{user_id}
pub async fn remove_member<A: Aggregate>(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Path((id, user_id)): Path<(EntityId, EmployeeId)>,
) -> AppResult<Json<DataResponse<A>>> {
    let aggregate = state
        .engine
        .remove_member::<A>(id, &user_id, &actor)
        .await?;

    state.event_bus.publish(
        event::<A>("member.removed", id, actor.user_id)
            .with_payload(serde_json::json!({ "user_id": user_id })),
    );

    Ok(Json(DataResponse { data: aggregate }))
}

/// PUT /api/v1/{projects,sprints}/{id}/lead
pub async fn reassign_lead<A: Aggregate>(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Path(id): Path<EntityId>,
    Json(input): Json<ReassignLeadRequest>,
) -> AppResult<Json<DataResponse<LeadReassigned<A>>>> {
    let (aggregate, previous_lead) = state
        .engine
        .reassign_lead::<A>(id, &input.user_id, &actor)
        .await?;

    state.event_bus.publish(
        event::<A>("lead.reassigned", id, actor.user_id).with_payload(serde_json::json!({
            "lead": input.user_id,
            "previous_lead": previous_lead,
        })),
    );

    Ok(Json(DataResponse {
        data: LeadReassigned {
            aggregate,
            previous_lead,
        },
    }))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

/// PUT /api/v1/{projects,sprints}/{id}/health
///
/// Operator override; replaced by the next automatic recomputation.
pub async fn set_health<A: Aggregate>(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Path(id): Path<EntityId>,
    Json(input): Json<SetHealthRequest>,
) -> AppResult<Json<DataResponse<A>>> {
    let aggregate = state
        .engine
        .set_health::<A>(id, input.health, &actor)
        .await?;

    state.event_bus.publish(
        event::<A>("health.set", id, actor.user_id)
            .with_payload(serde_json::json!({ "health": input.health })),
    );

    Ok(Json(DataResponse { data: aggregate }))
}

/// POST /api/v1/{projects,sprints}/{id}/health/recompute
pub async fn recompute_health<A: Aggregate>(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Path(id): Path<EntityId>,
) -> AppResult<Json<DataResponse<A>>> {
    let aggregate = state.engine.recompute_health::<A>(id).await?;

    state.event_bus.publish(event::<A>("health.recomputed", id, actor.user_id));

    Ok(Json(DataResponse { data: aggregate }))
}

// ---------------------------------------------------------------------------
// Chat and attachments
// ---------------------------------------------------------------------------

/// POST /api/v1/{projects,sprints}/{id}/chat
pub async fn add_chat_message<A: Aggregate>(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Path(id): Path<EntityId>,
    Json(input): Json<MessageRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<A>>)> {
    let aggregate = state
        .engine
        .add_chat_message::<A>(id, &input.message, &actor)
        .await?;

    state.event_bus.publish(event::<A>("chat.message_added", id, actor.user_id));

    Ok((StatusCode::CREATED, Json(DataResponse { data: aggregate })))
}

/// POST /api/v1/{projects,sprints}/{id}/attachments
pub async fn add_attachment<A: Aggregate>(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Path(id): Path<EntityId>,
    Json(input): Json<NewAttachment>,
) -> AppResult<(StatusCode, Json<DataResponse<AttachmentAdded<A>>>)> {
    let (aggregate, attachment) = state
        .engine
        .add_attachment::<A>(id, &input, &actor)
        .await?;

    state.event_bus.publish(
        event::<A>("attachment.added", id, actor.user_id)
            .with_payload(serde_json::json!({ "attachment_id": attachment.id })),
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: AttachmentAdded {
                aggregate,
                attachment,
            },
        }),
    ))
}

/// GET /api/v1/{projects,sprints}/{id}/attachments/{attachment_id}/download
///
/// Resolves the storage key of an attachment recorded anywhere in the
/// aggregate, deliverables included.
pub async fn download_reference<A: Aggregate>(
    State(state): State<AppState>,
    Path((id, attachment_id)): Path<(EntityId, EntityId)>,
) -> AppResult<Json<DataResponse<DownloadReference>>> {
    let key = state
        .engine
        .download_reference::<A>(id, attachment_id)
        .await?;
    Ok(Json(DataResponse {
        data: DownloadReference { attachment_id, key },
    }))
}
