use std::collections::BTreeSet;

use redb::{ReadableTable, TableHandle};

use super::db::DatabaseError;
use super::models::{CategoryRecord, FileRecord, DEFAULT_CATEGORY_NAME};
use super::session::{Insertion, RegistryError, Session};
use super::tables::*;

pub const MIN_CATEGORY_NAME_LEN: usize = 3;
pub const MAX_CATEGORY_NAME_LEN: usize = 50;

/// Check a user-supplied category name and return it without surrounding whitespace.
pub fn validate_category_name(name: &str) -> Result<&str, RegistryError> {
    let name = name.trim();
    let len = name.chars().count();
    if !(MIN_CATEGORY_NAME_LEN..=MAX_CATEGORY_NAME_LEN).contains(&len) {
        return Err(RegistryError::validation(format!(
            "category name must be {MIN_CATEGORY_NAME_LEN}-{MAX_CATEGORY_NAME_LEN} characters"
        )));
    }
    Ok(name)
}

/// Key under which a category name is unique.
fn fold_name(name: &str) -> String {
    name.to_lowercase()
}

impl Session {
    // ========================================================================
    // Category resolution
    // ========================================================================

    /// Resolve a user-supplied name to its category, creating it with the
    /// caller's casing if no category matches case-insensitively.
    pub fn resolve_category(&self, name: &str) -> Result<CategoryRecord, RegistryError> {
        let name = validate_category_name(name)?;
        self.find_or_create_category(name)
    }

    /// The reserved fallback category, created on first use.
    pub fn get_default_category(&self) -> Result<CategoryRecord, RegistryError> {
        self.find_or_create_category(DEFAULT_CATEGORY_NAME)
    }

    pub fn get_category(&self, id: u64) -> Result<CategoryRecord, RegistryError> {
        self.get_record(CATEGORIES, id)?
            .ok_or_else(|| RegistryError::not_found("Category"))
    }

    pub fn find_category_by_name(
        &self,
        name: &str,
    ) -> Result<Option<CategoryRecord>, DatabaseError> {
        match self.lookup(CATEGORY_NAMES, fold_name(name).as_str())? {
            Some(id) => self.get_record(CATEGORIES, id),
            None => Ok(None),
        }
    }

    fn find_or_create_category(&self, name: &str) -> Result<CategoryRecord, RegistryError> {
        if let Some(category) = self.find_category_by_name(name)? {
            return Ok(category);
        }

        let category = CategoryRecord {
            id: self.next_id(CATEGORIES.name())?,
            name: name.to_string(),
        };

        match self.claim(CATEGORY_NAMES, fold_name(name).as_str(), category.id)? {
            Insertion::Claimed => {
                self.put_record(CATEGORIES, category.id, &category)?;
                tracing::debug!(category_id = category.id, name, "Created category");
                Ok(category)
            }
            // Backstop: the lookup above already ran in this transaction.
            Insertion::Conflict(existing) => {
                tracing::warn!(name, "Category name already claimed, re-reading");
                self.get_category(existing)
            }
        }
    }

    /// Categories holding at least one file owned by `user_id`, ordered by name.
    ///
    /// The namespace is shared; visibility is per user.
    pub fn list_user_categories(&self, user_id: u64) -> Result<Vec<CategoryRecord>, RegistryError> {
        let file_ids = self.owned_file_ids(user_id)?;

        let mut category_ids = BTreeSet::new();
        {
            let files = self.txn().open_table(FILES)?;
            for file_id in file_ids {
                if let Some(data) = files.get(file_id)? {
                    let file: FileRecord = rmp_serde::from_slice(data.value())?;
                    category_ids.insert(file.category_id);
                }
            }
        }

        let mut categories = Vec::with_capacity(category_ids.len());
        for id in category_ids {
            categories.push(self.get_category(id)?);
        }
        categories.sort_by_key(|c| fold_name(&c.name));
        Ok(categories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_trims_and_accepts_bounds() {
        assert_eq!(validate_category_name("  Work  ").unwrap(), "Work");
        assert!(validate_category_name("abc").is_ok());
        assert!(validate_category_name(&"x".repeat(50)).is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_bounds() {
        assert!(matches!(
            validate_category_name("ab"),
            Err(RegistryError::Validation(_))
        ));
        assert!(matches!(
            validate_category_name("   "),
            Err(RegistryError::Validation(_))
        ));
        assert!(matches!(
            validate_category_name(&"x".repeat(51)),
            Err(RegistryError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_counts_characters_not_bytes() {
        // three characters, six bytes
        assert!(validate_category_name("édé").is_ok());
    }
}
