//! Shared test helpers for file-keeper in-crate tests.

use std::sync::Arc;

use crate::config::{Config, PaginationConfig};
use crate::storage::Database;
use crate::AppState;

/// Create a test AppState with a temporary database.
pub fn test_state(temp_dir: &tempfile::TempDir) -> Arc<AppState> {
    let data_dir = temp_dir.path().join("data");

    let config = Config {
        bind_address: "127.0.0.1:0".to_string(),
        data_dir: data_dir.to_string_lossy().to_string(),
        pagination: PaginationConfig::default(),
        test_mode: true,
    };

    let db = Database::open(&data_dir).expect("Failed to open test database");

    Arc::new(AppState { config, db })
}
