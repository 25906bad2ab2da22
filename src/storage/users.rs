use chrono::Utc;
use redb::TableHandle;

use super::db::DatabaseError;
use super::models::{DisplayHints, UserRecord};
use super::session::{Insertion, RegistryError, Session};
use super::tables::*;

impl Session {
    // ========================================================================
    // Identity resolution
    // ========================================================================

    /// Find the user for a platform identity, creating it on first contact.
    ///
    /// Display hints are only recorded at creation; later contacts return the
    /// stored record untouched.
    pub fn resolve_user(
        &self,
        external_id: i64,
        hints: &DisplayHints,
    ) -> Result<UserRecord, RegistryError> {
        if let Some(user) = self.find_user_by_external_id(external_id)? {
            return Ok(user);
        }

        let now = Utc::now();
        let user = UserRecord {
            id: self.next_id(USERS.name())?,
            external_id,
            username: hints.username.clone(),
            first_name: hints.first_name.clone(),
            last_name: hints.last_name.clone(),
            current_category_id: None,
            created_at: now,
            updated_at: now,
        };

        match self.claim(USER_IDENTITIES, external_id, user.id)? {
            Insertion::Claimed => {
                self.put_record(USERS, user.id, &user)?;
                tracing::info!(user_id = user.id, external_id, "Registered new user");
                Ok(user)
            }
            // Backstop: the lookup above already ran in this transaction.
            Insertion::Conflict(existing) => {
                tracing::warn!(external_id, "User identity already claimed, re-reading");
                self.get_user(existing)
            }
        }
    }

    pub fn find_user_by_external_id(
        &self,
        external_id: i64,
    ) -> Result<Option<UserRecord>, DatabaseError> {
        match self.lookup(USER_IDENTITIES, external_id)? {
            Some(id) => self.get_record(USERS, id),
            None => Ok(None),
        }
    }

    pub fn get_user(&self, id: u64) -> Result<UserRecord, RegistryError> {
        self.get_record(USERS, id)?
            .ok_or_else(|| RegistryError::not_found("User"))
    }

    pub(super) fn put_user(&self, user: &UserRecord) -> Result<(), DatabaseError> {
        self.put_record(USERS, user.id, user)
    }

    /// Delete a user together with every file it owns.
    pub fn delete_user(&self, id: u64) -> Result<bool, RegistryError> {
        let Some(user) = self.get_record::<UserRecord>(USERS, id)? else {
            return Ok(false);
        };

        let owned = self.owned_entries(id)?;

        for &(_, _, file_id) in &owned {
            self.remove_file(file_id)?;
        }
        {
            let mut index = self.txn().open_table(USER_FILES)?;
            for key in &owned {
                index.remove(key)?;
            }
        }
        {
            let mut identities = self.txn().open_table(USER_IDENTITIES)?;
            identities.remove(user.external_id)?;
        }
        {
            let mut users = self.txn().open_table(USERS)?;
            users.remove(id)?;
        }

        tracing::debug!(user_id = id, files = owned.len(), "Deleted user");
        Ok(true)
    }
}
