//! Stateless attachment reference resolution.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ResolveReferenceRequest {
    /// Filesystem path or storage key as recorded at upload time.
    pub stored_ref: String,
}

#[derive(Debug, Serialize)]
pub struct ResolvedReference {
    pub key: String,
}

/// POST /api/v1/attachments/resolve
pub async fn resolve_reference(
    State(state): State<AppState>,
    Json(input): Json<ResolveReferenceRequest>,
) -> AppResult<Json<DataResponse<ResolvedReference>>> {
    let key = state.engine.resolve_download_reference(&input.stored_ref)?;
    Ok(Json(DataResponse {
        data: ResolvedReference { key },
    }))
}
