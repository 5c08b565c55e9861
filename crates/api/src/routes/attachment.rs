use axum::routing::post;
use axum::Router;

use crate::handlers::attachment;
use crate::state::AppState;

/// Routes mounted at `/attachments`.
///
/// ```text
/// POST /resolve      normalize a stored reference into a storage key
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/resolve", post(attachment::resolve_reference))
}
