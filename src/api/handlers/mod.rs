mod admin;
mod categories;
mod files;
mod users;

use std::sync::Arc;

use tracing::Instrument;

use crate::api::response::ApiError;
use crate::storage::{RegistryError, Session};
use crate::AppState;

pub use admin::{admin_purge, health};
pub use categories::{create_category, get_current_category, list_categories, set_current_category};
pub use files::{get_file, list_files, upload_file};
pub use users::profile;

/// Run `work` as one unit of work on the blocking pool.
///
/// The session commits if `work` succeeds and rolls back otherwise.
async fn unit_of_work<T, F>(state: &Arc<AppState>, work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&Session) -> Result<T, RegistryError> + Send + 'static,
{
    let db = state.db.clone();
    let span = tracing::info_span!("unit_of_work", request_id = %uuid::Uuid::new_v4());
    let inner = span.clone();

    tokio::task::spawn_blocking(move || inner.in_scope(|| db.transaction(work)))
        .instrument(span)
        .await
        .map_err(|e| ApiError::internal(format!("Unit of work did not complete: {e}")))?
        .map_err(ApiError::from)
}
