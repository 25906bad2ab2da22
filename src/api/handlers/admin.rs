use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use crate::api::response::{ApiError, JSend};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct PurgeResponse {
    pub categories_deleted: u64,
    pub files_deleted: u64,
    pub users_deleted: u64,
}

pub async fn health() -> Json<JSend<HealthResponse>> {
    JSend::success(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn admin_purge(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JSend<PurgeResponse>>, ApiError> {
    let db = state.db.clone();
    let stats = tokio::task::spawn_blocking(move || db.purge_all())
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?
        .map_err(|e| ApiError::internal(e.to_string()))?;

    tracing::warn!(
        users = stats.users,
        categories = stats.categories,
        files = stats.files,
        "Purged all data"
    );

    Ok(JSend::success(PurgeResponse {
        categories_deleted: stats.categories,
        files_deleted: stats.files,
        users_deleted: stats.users,
    }))
}
