//! Acting-user extractor for Axum handlers.
//!
//! Authentication happens upstream; the gateway forwards the authenticated
//! identity in `x-user-id` (required) and `x-user-name` (optional).

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use opsportal_core::types::Actor;

use crate::error::AppError;
use crate::state::AppState;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_NAME_HEADER: &str = "x-user-name";

/// The acting user of a request, handed to every engine operation.
///
/// ```ignore
/// async fn my_handler(ActingUser(actor): ActingUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = %actor.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ActingUser(pub Actor);

impl FromRequestParts<AppState> for ActingUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = header_value(parts, USER_ID_HEADER)
            .ok_or_else(|| AppError::BadRequest(format!("Missing {USER_ID_HEADER} header")))?;

        // Display name is cosmetic; fall back to the id.
        let name = header_value(parts, USER_NAME_HEADER).unwrap_or_else(|| user_id.clone());

        Ok(ActingUser(Actor::new(user_id, name)))
    }
}

fn header_value(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
