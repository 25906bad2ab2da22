mod categories;
mod current_category;
pub mod db;
mod files;
pub mod models;
pub mod public_id;
mod session;
mod tables;
mod users;

pub use categories::{validate_category_name, MAX_CATEGORY_NAME_LEN, MIN_CATEGORY_NAME_LEN};
pub use db::{Database, DatabaseError, PurgeStats};
pub use session::{Insertion, RegistryError, Session};
pub use tables::*;
