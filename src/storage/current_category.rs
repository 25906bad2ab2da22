use chrono::Utc;

use super::models::CategoryRecord;
use super::session::{RegistryError, Session};

impl Session {
    // ========================================================================
    // Current category
    // ========================================================================

    /// The category new uploads from `user_id` land in.
    ///
    /// A user without one (or whose pointer no longer resolves) is assigned
    /// the default category, and that assignment is written in this session.
    pub fn get_current_category(&self, user_id: u64) -> Result<CategoryRecord, RegistryError> {
        let mut user = self.get_user(user_id)?;

        if let Some(category_id) = user.current_category_id {
            match self.get_category(category_id) {
                Ok(category) => return Ok(category),
                Err(RegistryError::NotFound(_)) => {
                    tracing::warn!(user_id, category_id, "Current category is dangling, resetting");
                }
                Err(e) => return Err(e),
            }
        }

        let default = self.get_default_category()?;
        user.current_category_id = Some(default.id);
        user.updated_at = Utc::now();
        self.put_user(&user)?;

        tracing::debug!(user_id, category_id = default.id, "Assigned default category");
        Ok(default)
    }

    /// Point `user_id` at `category_id`, or clear the pointer with `None`.
    pub fn set_current_category(
        &self,
        user_id: u64,
        category_id: Option<u64>,
    ) -> Result<(), RegistryError> {
        let mut user = self.get_user(user_id)?;
        if let Some(id) = category_id {
            self.get_category(id)?;
        }

        user.current_category_id = category_id;
        user.updated_at = Utc::now();
        self.put_user(&user)?;

        tracing::debug!(user_id, ?category_id, "Set current category");
        Ok(())
    }
}
