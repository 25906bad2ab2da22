use chrono::Utc;
use redb::{ReadableTable, TableHandle};

use super::db::DatabaseError;
use super::models::{FilePage, FileRecord, FileType, NewFile, UNKNOWN_MIME_TYPE, UNNAMED_FILE};
use super::public_id::{self, MAX_ATTEMPTS};
use super::session::{Insertion, RegistryError, Session};
use super::tables::*;

/// Use `value` unless it is missing or blank.
fn non_blank_or(value: Option<String>, fallback: &str) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// Bounds of the ownership index covering every file of `user_id`.
pub(super) fn owned_range(user_id: u64) -> std::ops::RangeInclusive<(u64, i64, u64)> {
    (user_id, i64::MIN, 0)..=(user_id, i64::MAX, u64::MAX)
}

impl Session {
    // ========================================================================
    // File operations
    // ========================================================================

    /// Record an uploaded file for `owner_id` under `category_id`.
    pub fn create_file(
        &self,
        owner_id: u64,
        category_id: u64,
        new_file: NewFile,
    ) -> Result<FileRecord, RegistryError> {
        let storage_ref = new_file.storage_ref.trim();
        if storage_ref.is_empty() {
            return Err(RegistryError::validation("storage reference is required"));
        }

        self.get_user(owner_id)?;
        self.get_category(category_id)?;

        let id = self.next_id(FILES.name())?;
        let public_id = self.claim_public_id(id)?;
        let mime_type = non_blank_or(new_file.mime_type, UNKNOWN_MIME_TYPE);
        let now = Utc::now();

        let file = FileRecord {
            id,
            public_id,
            name: non_blank_or(new_file.name, UNNAMED_FILE),
            file_type: FileType::from_mime(&mime_type),
            mime_type,
            byte_size: new_file.byte_size,
            storage_ref: storage_ref.to_string(),
            user_id: owner_id,
            category_id,
            created_at: now,
            updated_at: now,
        };

        self.put_record(FILES, file.id, &file)?;
        {
            let mut index = self.txn().open_table(USER_FILES)?;
            index.insert((owner_id, now.timestamp_micros(), file.id), ())?;
        }

        tracing::debug!(file_id = file.id, public_id = %file.public_id, owner_id, "Created file");
        Ok(file)
    }

    /// Draw public ids until one is free, and reserve it for `file_id`.
    fn claim_public_id(&self, file_id: u64) -> Result<String, RegistryError> {
        for attempt in 1..=MAX_ATTEMPTS {
            let candidate = public_id::generate();
            match self.claim(FILE_PUBLIC_IDS, candidate.as_str(), file_id)? {
                Insertion::Claimed => return Ok(candidate),
                Insertion::Conflict(_) => {
                    tracing::warn!(
                        attempt,
                        public_id = %candidate,
                        "Public id collision, regenerating"
                    );
                }
            }
        }
        Err(DatabaseError::KeySpaceExhausted("public id").into())
    }

    /// One page of a user's files, newest first.
    ///
    /// `page` is 1-indexed. A page past the end is empty but still reports the
    /// full total.
    pub fn list_files(
        &self,
        owner_id: u64,
        page: u32,
        page_size: u32,
    ) -> Result<FilePage, RegistryError> {
        if page == 0 {
            return Err(RegistryError::validation("page must be greater than 0"));
        }
        if page_size == 0 {
            return Err(RegistryError::validation("page_size must be greater than 0"));
        }

        let start = u64::from(page - 1) * u64::from(page_size);
        let end = start + u64::from(page_size);

        let mut total = 0u64;
        let mut window = Vec::new();
        {
            let index = self.txn().open_table(USER_FILES)?;
            // Keys sort by (created_at, id), so reverse order is newest first
            // with ties broken by descending id.
            for entry in index.range(owned_range(owner_id))?.rev() {
                let (key, _) = entry?;
                if (start..end).contains(&total) {
                    window.push(key.value().2);
                }
                total += 1;
            }
        }

        let mut items = Vec::with_capacity(window.len());
        for file_id in window {
            if let Some(file) = self.get_record(FILES, file_id)? {
                items.push(file);
            }
        }

        Ok(FilePage {
            items,
            total,
            page,
            page_size,
        })
    }

    /// Number of files owned by `user_id`.
    pub fn count_files(&self, user_id: u64) -> Result<u64, RegistryError> {
        let index = self.txn().open_table(USER_FILES)?;
        let mut count = 0;
        for entry in index.range(owned_range(user_id))? {
            entry?;
            count += 1;
        }
        Ok(count)
    }

    pub fn get_by_public_id(&self, public_id: &str) -> Result<FileRecord, RegistryError> {
        let file = match self.lookup(FILE_PUBLIC_IDS, public_id)? {
            Some(id) => self.get_record(FILES, id)?,
            None => None,
        };
        file.ok_or_else(|| RegistryError::not_found("File"))
    }

    /// Fetch a file on behalf of a platform identity.
    ///
    /// Missing files are `NotFound`; files owned by someone else are
    /// `PermissionDenied`.
    pub fn resolve_for_owner(
        &self,
        public_id: &str,
        requester_external_id: i64,
    ) -> Result<FileRecord, RegistryError> {
        let file = self.get_by_public_id(public_id)?;
        let owner = self.get_user(file.user_id)?;
        if owner.external_id != requester_external_id {
            return Err(RegistryError::PermissionDenied);
        }
        Ok(file)
    }

    /// Ownership index entries of `user_id`, oldest first.
    pub(super) fn owned_entries(
        &self,
        user_id: u64,
    ) -> Result<Vec<(u64, i64, u64)>, DatabaseError> {
        let index = self.txn().open_table(USER_FILES)?;
        let keys = index
            .range(owned_range(user_id))?
            .map(|r| r.map(|(k, _)| k.value()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }

    /// Internal ids of every file owned by `user_id`, oldest first.
    pub(super) fn owned_file_ids(&self, user_id: u64) -> Result<Vec<u64>, DatabaseError> {
        Ok(self
            .owned_entries(user_id)?
            .into_iter()
            .map(|(_, _, file_id)| file_id)
            .collect())
    }

    /// Remove a file record and its public id. The ownership index entry is
    /// left to the caller.
    pub(super) fn remove_file(&self, file_id: u64) -> Result<(), DatabaseError> {
        let Some(file) = self.get_record::<FileRecord>(FILES, file_id)? else {
            return Ok(());
        };
        {
            let mut public_ids = self.txn().open_table(FILE_PUBLIC_IDS)?;
            public_ids.remove(file.public_id.as_str())?;
        }
        {
            let mut files = self.txn().open_table(FILES)?;
            files.remove(file_id)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::DisplayHints;
    use crate::storage::Database;

    fn new_file(storage_ref: &str) -> NewFile {
        NewFile {
            storage_ref: storage_ref.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_list_files_breaks_timestamp_ties_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path()).unwrap();
        let session = db.session().unwrap();

        let user = session.resolve_user(1, &DisplayHints::default()).unwrap();
        let category = session.get_default_category().unwrap();
        let first = session.create_file(user.id, category.id, new_file("a")).unwrap();
        let second = session.create_file(user.id, category.id, new_file("b")).unwrap();
        let third = session.create_file(user.id, category.id, new_file("c")).unwrap();

        // Put every file on the same instant so only the id can order them.
        {
            let mut index = session.txn().open_table(USER_FILES).unwrap();
            for file in [&first, &second, &third] {
                index
                    .remove((user.id, file.created_at.timestamp_micros(), file.id))
                    .unwrap();
                index.insert((user.id, 1_000_000, file.id), ()).unwrap();
            }
        }

        let page = session.list_files(user.id, 1, 10).unwrap();
        let ids: Vec<u64> = page.items.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![third.id, second.id, first.id]);

        let page = session.list_files(user.id, 2, 2).unwrap();
        let ids: Vec<u64> = page.items.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![first.id]);
        assert_eq!(page.total, 3);
    }
}
