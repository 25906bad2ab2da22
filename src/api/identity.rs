//! The platform identity attached to every inbound event.
//!
//! The transport verifies the account before forwarding the event and passes
//! it along in headers; nothing here re-checks it.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use super::response::ApiError;
use crate::storage::models::DisplayHints;

pub const EXTERNAL_USER_ID_HEADER: &str = "x-external-user-id";
pub const USERNAME_HEADER: &str = "x-username";
pub const FIRST_NAME_HEADER: &str = "x-first-name";
pub const LAST_NAME_HEADER: &str = "x-last-name";

/// Who sent the event, as reported by the platform.
#[derive(Debug, Clone)]
pub struct Requester {
    pub external_id: i64,
    pub hints: DisplayHints,
}

fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Requester
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, ApiError> {
        let raw = header_text(&parts.headers, EXTERNAL_USER_ID_HEADER).ok_or_else(|| {
            ApiError::bad_request(format!("{EXTERNAL_USER_ID_HEADER} header is required"))
        })?;
        let external_id = raw.parse::<i64>().map_err(|_| {
            ApiError::bad_request(format!("{EXTERNAL_USER_ID_HEADER} must be an integer"))
        })?;

        Ok(Requester {
            external_id,
            hints: DisplayHints {
                username: header_text(&parts.headers, USERNAME_HEADER),
                first_name: header_text(&parts.headers, FIRST_NAME_HEADER),
                last_name: header_text(&parts.headers, LAST_NAME_HEADER),
            },
        })
    }
}
