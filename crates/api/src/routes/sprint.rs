use axum::routing::{get, post, put};
use axum::Router;
use opsportal_core::sprint::Sprint;

use crate::handlers::sprint;
use crate::state::AppState;

/// Routes mounted at `/sprints`.
///
/// ```text
/// GET, POST  /                                       list, create
/// GET        /{id}                                   get
/// PUT        /{id}/status                            change status
/// POST       /{id}/actions                           create action
/// PUT        /{id}/actions/{action_id}/status        change action status
/// ```
///
/// Members, lead, health, chat and attachments come from
/// [`super::aggregate::router`].
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(sprint::list_sprints).post(sprint::create_sprint))
        .route("/{id}", get(sprint::get_sprint))
        .route("/{id}/status", put(sprint::change_status))
        .route("/{id}/actions", post(sprint::create_action))
        .route(
            "/{id}/actions/{action_id}/status",
            put(sprint::change_action_status),
        )
        .merge(super::aggregate::router::<Sprint>())
}
