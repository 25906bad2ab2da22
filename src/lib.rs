//! file-keeper - A personal file registry fronted by a chat transport
//!
//! The chat platform keeps the bytes; this crate keeps the bookkeeping:
//! - Users resolved from the platform identity on first contact
//! - Categories in a shared, case-insensitive namespace, with a per-user
//!   current category that new uploads land in
//! - File references with short public ids, paginated listings and
//!   owner-checked retrieval
//! - redb embedded database, one write transaction per request

pub mod api;
pub mod config;
pub mod storage;
#[cfg(test)]
pub mod testutil;

use config::Config;
use storage::Database;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub db: Database,
}
