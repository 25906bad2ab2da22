use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use super::unit_of_work;
use crate::api::identity::Requester;
use crate::api::response::{ApiError, JSend};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub external_id: i64,
    pub file_count: u64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

pub async fn profile(
    State(state): State<Arc<AppState>>,
    requester: Requester,
) -> Result<Json<JSend<ProfileResponse>>, ApiError> {
    let profile = unit_of_work(&state, move |session| {
        let user = session.resolve_user(requester.external_id, &requester.hints)?;
        let file_count = session.count_files(user.id)?;
        Ok(ProfileResponse {
            external_id: user.external_id,
            file_count,
            first_name: user.first_name,
            last_name: user.last_name,
            username: user.username,
        })
    })
    .await?;

    Ok(JSend::success(profile))
}
