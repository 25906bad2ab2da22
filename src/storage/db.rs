use redb::{Database as RedbDatabase, ReadableTableMetadata, TableHandle, WriteTransaction};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use super::session::{RegistryError, Session};
use super::tables::*;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Commit error: {0}")]
    Commit(Box<redb::CommitError>),
    #[error("Database error: {0}")]
    Redb(Box<redb::Error>),
    #[error("Database error: {0}")]
    RedbDatabase(Box<redb::DatabaseError>),
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] rmp_serde::decode::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not allocate a unique {0}")]
    KeySpaceExhausted(&'static str),
    #[error("Serialization error: {0}")]
    Serialization(#[from] rmp_serde::encode::Error),
    #[error("Storage error: {0}")]
    Storage(Box<redb::StorageError>),
    #[error("Table error: {0}")]
    Table(Box<redb::TableError>),
    #[error("Transaction error: {0}")]
    Transaction(Box<redb::TransactionError>),
}

impl From<redb::CommitError> for DatabaseError {
    fn from(e: redb::CommitError) -> Self {
        DatabaseError::Commit(Box::new(e))
    }
}

impl From<redb::DatabaseError> for DatabaseError {
    fn from(e: redb::DatabaseError) -> Self {
        DatabaseError::RedbDatabase(Box::new(e))
    }
}

impl From<redb::Error> for DatabaseError {
    fn from(e: redb::Error) -> Self {
        DatabaseError::Redb(Box::new(e))
    }
}

impl From<redb::StorageError> for DatabaseError {
    fn from(e: redb::StorageError) -> Self {
        DatabaseError::Storage(Box::new(e))
    }
}

impl From<redb::TableError> for DatabaseError {
    fn from(e: redb::TableError) -> Self {
        DatabaseError::Table(Box::new(e))
    }
}

impl From<redb::TransactionError> for DatabaseError {
    fn from(e: redb::TransactionError) -> Self {
        DatabaseError::Transaction(Box::new(e))
    }
}

pub struct Database {
    db: Arc<RedbDatabase>,
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
        }
    }
}

/// Statistics from a purge operation
#[derive(Debug, Default)]
pub struct PurgeStats {
    pub categories: u64,
    pub files: u64,
    pub users: u64,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self, DatabaseError> {
        std::fs::create_dir_all(data_dir.as_ref())?;
        let db_path = data_dir.as_ref().join("file-keeper.redb");
        let db = Arc::new(RedbDatabase::create(db_path)?);

        // Initialize application tables
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(CATEGORIES)?;
            let _ = write_txn.open_table(FILES)?;
            let _ = write_txn.open_table(USER_IDENTITIES)?;
            let _ = write_txn.open_table(CATEGORY_NAMES)?;
            let _ = write_txn.open_table(FILE_PUBLIC_IDS)?;
            let _ = write_txn.open_table(USER_FILES)?;
            let _ = write_txn.open_table(SEQUENCES)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> Result<WriteTransaction, DatabaseError> {
        Ok(self.db.begin_write()?)
    }

    /// Acquire the session for one unit of work.
    ///
    /// Blocks while another unit of work holds the writer. The session aborts
    /// if it is dropped without [`Session::commit`].
    pub fn session(&self) -> Result<Session, DatabaseError> {
        Ok(Session::new(self.begin_write()?))
    }

    /// Run `work` as a single unit of work: commit when it returns `Ok`,
    /// roll back when it returns `Err` or panics.
    pub fn transaction<T, F>(&self, work: F) -> Result<T, RegistryError>
    where
        F: FnOnce(&Session) -> Result<T, RegistryError>,
    {
        let session = self.session()?;
        match work(&session) {
            Ok(value) => {
                session.commit()?;
                Ok(value)
            }
            Err(e) => {
                if let Err(abort_err) = session.abort() {
                    tracing::warn!(error = %abort_err, "Failed to abort unit of work");
                }
                Err(e)
            }
        }
    }

    // ========================================================================
    // Admin operations
    // ========================================================================

    /// Purge all data - for testing only
    pub fn purge_all(&self) -> Result<PurgeStats, DatabaseError> {
        let write_txn = self.begin_write()?;
        let stats = PurgeStats {
            categories: clear_table(&write_txn, CATEGORIES)?,
            files: clear_table(&write_txn, FILES)?,
            users: clear_table(&write_txn, USERS)?,
        };

        clear_table(&write_txn, USER_IDENTITIES)?;
        clear_table(&write_txn, CATEGORY_NAMES)?;
        clear_table(&write_txn, FILE_PUBLIC_IDS)?;
        clear_table(&write_txn, USER_FILES)?;
        clear_table(&write_txn, SEQUENCES)?;

        write_txn.commit()?;
        Ok(stats)
    }
}

/// Remove every row of a table, returning how many were removed.
fn clear_table<K, V>(
    write_txn: &WriteTransaction,
    definition: redb::TableDefinition<'static, K, V>,
) -> Result<u64, DatabaseError>
where
    K: redb::Key + 'static,
    V: redb::Value + 'static,
{
    let removed = write_txn.open_table(definition)?.len()?;
    write_txn.delete_table(definition)?;
    let _ = write_txn.open_table(definition)?;
    tracing::debug!(table = definition.name(), removed, "Cleared table");
    Ok(removed)
}
