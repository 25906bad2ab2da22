use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;

use super::unit_of_work;
use crate::api::identity::Requester;
use crate::api::response::{ApiError, AppJson, JSend};
use crate::storage::models::CategoryRecord;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SetCurrentCategoryRequest {
    /// `null` clears the selection; the next upload falls back to the default.
    pub category_id: Option<u64>,
}

/// Categories that hold at least one of the requester's files.
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    requester: Requester,
) -> Result<Json<JSend<Vec<CategoryRecord>>>, ApiError> {
    let categories = unit_of_work(&state, move |session| {
        let user = session.resolve_user(requester.external_id, &requester.hints)?;
        session.list_user_categories(user.id)
    })
    .await?;

    Ok(JSend::success(categories))
}

/// Resolve a category by name and make it the requester's current one.
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    requester: Requester,
    AppJson(req): AppJson<CreateCategoryRequest>,
) -> Result<Json<JSend<CategoryRecord>>, ApiError> {
    let category = unit_of_work(&state, move |session| {
        let user = session.resolve_user(requester.external_id, &requester.hints)?;
        let category = session.resolve_category(&req.name)?;
        session.set_current_category(user.id, Some(category.id))?;
        Ok(category)
    })
    .await?;

    Ok(JSend::success(category))
}

pub async fn get_current_category(
    State(state): State<Arc<AppState>>,
    requester: Requester,
) -> Result<Json<JSend<CategoryRecord>>, ApiError> {
    let category = unit_of_work(&state, move |session| {
        let user = session.resolve_user(requester.external_id, &requester.hints)?;
        session.get_current_category(user.id)
    })
    .await?;

    Ok(JSend::success(category))
}

pub async fn set_current_category(
    State(state): State<Arc<AppState>>,
    requester: Requester,
    AppJson(req): AppJson<SetCurrentCategoryRequest>,
) -> Result<Json<JSend<Option<CategoryRecord>>>, ApiError> {
    let category = unit_of_work(&state, move |session| {
        let user = session.resolve_user(requester.external_id, &requester.hints)?;
        session.set_current_category(user.id, req.category_id)?;
        req.category_id
            .map(|id| session.get_category(id))
            .transpose()
    })
    .await?;

    Ok(JSend::success(category))
}
