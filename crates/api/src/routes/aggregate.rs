use axum::routing::{delete, get, post, put};
use axum::Router;
use opsportal_core::aggregate::Aggregate;

use crate::handlers::aggregate;
use crate::state::AppState;

/// Routes every aggregate resource carries, mounted under its own prefix.
///
/// ```text
/// POST   /{id}/members                                   add member
/// DELETE /{id}/members/{user_id}                         remove member
/// PUT    /{id}/lead                                      reassign lead
/// PUT    /{id}/health                                    set health
/// POST   /{id}/health/recompute                          recompute health
/// POST   /{id}/chat                                      add chat message
/// POST   /{id}/attachments                               add attachment
/// GET    /{id}/attachments/{attachment_id}/download      download reference
/// ```
pub fn router<A: Aggregate>() -> Router<AppState> {
    Router::new()
        .route("/{id}/members", post(aggregate::add_member::<A>))
        .route(
            "/{id}/members/{user_id}",
            delete(aggregate::remove_member::<A>),
        )
        .route("/{id}/lead", put(aggregate::reassign_lead::<A>))
        .route("/{id}/health", put(aggregate::set_health::<A>))
        .route(
            "/{id}/health/recompute",
            post(aggregate::recompute_health::<A>),
        )
        .route("/{id}/chat", post(aggregate::add_chat_message::<A>))
        .route("/{id}/attachments", post(aggregate::add_attachment::<A>))
        .route(
            "/{id}/attachments/{attachment_id}/download",
            get(aggregate::download_reference::<A>),
        )
}
