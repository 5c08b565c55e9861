use axum::routing::{get, post, put};
use axum::Router;
use opsportal_core::project::Project;

use crate::handlers::{deliverable, project};
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET, POST  /                                                        list, create
/// GET        /{id}                                                    get
/// PUT        /{id}/status                                             change status
///
/// POST       /{id}/deliverables                                       create deliverable
/// PUT        /{id}/deliverables/{deliverable_id}/status               change status
/// POST       /{id}/deliverables/{deliverable_id}/blockers             add blocker
/// PUT        /{id}/deliverables/{deliverable_id}/blockers/{blocker_id}/resolve
/// POST       /{id}/deliverables/{deliverable_id}/comments             add comment
/// POST       /{id}/deliverables/{deliverable_id}/submit               submit
/// POST       /{id}/deliverables/{deliverable_id}/attachments          add attachment
/// ```
///
/// Members, lead, health, chat and attachments come from
/// [`super::aggregate::router`].
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(project::list_projects).post(project::create_project))
        .route("/{id}", get(project::get_project))
        .route("/{id}/status", put(project::change_status))
        .route(
            "/{id}/deliverables",
            post(deliverable::create_deliverable),
        )
        .route(
            "/{id}/deliverables/{deliverable_id}/status",
            put(deliverable::change_status),
        )
        .route(
            "/{id}/deliverables/{deliverable_id}/blockers",
            post(deliverable::add_blocker),
        )
        .route(
            "/{id}/deliverables/{deliverable_id}/blockers/{blocker_id}/resolve",
            put(deliverable::resolve_blocker),
        )
        .route(
            "/{id}/deliverables/{deliverable_id}/comments",
            post(deliverable::add_comment),
        )
        .route(
            "/{id}/deliverables/{deliverable_id}/submit",
            post(deliverable::submit),
        )
        .route(
            "/{id}/deliverables/{deliverable_id}/attachments",
            post(deliverable::add_attachment),
        )
        .merge(super::aggregate::router::<Project>())
}
