pub mod aggregate;
pub mod attachment;
pub mod health;
pub mod project;
pub mod sprint;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /projects                     projects, deliverables, members, health, chat
/// /sprints                      sprints, actions, members, health, chat
/// /attachments/resolve          stored reference -> storage key
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/projects", project::router())
        .nest("/sprints", sprint::router())
        .nest("/attachments", attachment::router())
}
