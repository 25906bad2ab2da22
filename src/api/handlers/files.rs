use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::unit_of_work;
use crate::api::identity::Requester;
use crate::api::response::{ApiError, AppJson, AppQuery, JSend, PaginatedData, Pagination};
use crate::storage::models::{CategoryRecord, FileRecord, FileType, NewFile};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub byte_size: Option<u64>,
    pub category_id: u64,
    pub created_at: String,
    pub file_type: FileType,
    pub mime_type: String,
    pub name: String,
    pub public_id: String,
    pub storage_ref: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub category: CategoryRecord,
    pub file: FileResponse,
}

#[derive(Debug, Deserialize)]
pub struct ListFilesParams {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub page_size: Option<u32>,
}

fn first_page() -> u32 {
    1
}

// ============================================================================
// Handlers
// ============================================================================

/// File the upload under the requester's current category.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    requester: Requester,
    AppJson(new_file): AppJson<NewFile>,
) -> Result<Json<JSend<UploadResponse>>, ApiError> {
    let (file, category) = unit_of_work(&state, move |session| {
        let user = session.resolve_user(requester.external_id, &requester.hints)?;
        let category = session.get_current_category(user.id)?;
        let file = session.create_file(user.id, category.id, new_file)?;
        Ok((file, category))
    })
    .await?;

    Ok(JSend::success(UploadResponse {
        category,
        file: file_to_response(&file),
    }))
}

pub async fn list_files(
    State(state): State<Arc<AppState>>,
    requester: Requester,
    AppQuery(params): AppQuery<ListFilesParams>,
) -> Result<Json<JSend<PaginatedData<FileResponse>>>, ApiError> {
    let limits = &state.config.pagination;
    let page_size = params.page_size.unwrap_or(limits.default_page_size);
    if page_size > limits.max_page_size {
        return Err(ApiError::bad_request(format!(
            "page_size must not exceed {}",
            limits.max_page_size
        )));
    }

    let page = unit_of_work(&state, move |session| {
        let user = session.resolve_user(requester.external_id, &requester.hints)?;
        session.list_files(user.id, params.page, page_size)
    })
    .await?;

    let items = page.items.iter().map(file_to_response).collect();
    Ok(PaginatedData::success(items, Pagination::from(&page)))
}

/// Retrieve-by-id; only the owner gets the file back.
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    requester: Requester,
    Path(public_id): Path<String>,
) -> Result<Json<JSend<FileResponse>>, ApiError> {
    let public_id = public_id.trim().to_string();
    tracing::info!(external_id = requester.external_id, public_id = %public_id, "File requested");

    let file = unit_of_work(&state, move |session| {
        session.resolve_for_owner(&public_id, requester.external_id)
    })
    .await?;

    Ok(JSend::success(file_to_response(&file)))
}

// ============================================================================
// Helpers
// ============================================================================

fn file_to_response(file: &FileRecord) -> FileResponse {
    FileResponse {
        byte_size: file.byte_size,
        category_id: file.category_id,
        created_at: file.created_at.to_rfc3339(),
        file_type: file.file_type,
        mime_type: file.mime_type.clone(),
        name: file.name.clone(),
        public_id: file.public_id.clone(),
        storage_ref: file.storage_ref.clone(),
        updated_at: file.updated_at.to_rfc3339(),
    }
}
