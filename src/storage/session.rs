//! The per-request unit of work and the primitives the registry is built on.

use std::borrow::Borrow;

use redb::{Key, ReadableTable, WriteTransaction};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use super::db::DatabaseError;
use super::tables::{RecordTable, UniqueIndex, SEQUENCES};

/// Failures surfaced by registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Permission denied")]
    PermissionDenied,
    #[error("Persistence failure: {0}")]
    Persistence(#[from] DatabaseError),
}

impl RegistryError {
    pub fn validation(message: impl Into<String>) -> Self {
        RegistryError::Validation(message.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        RegistryError::NotFound(what.into())
    }
}

macro_rules! persistence_from {
    ($($error:ty),* $(,)?) => {
        $(
            impl From<$error> for RegistryError {
                fn from(e: $error) -> Self {
                    RegistryError::Persistence(e.into())
                }
            }
        )*
    };
}

persistence_from!(
    redb::CommitError,
    redb::StorageError,
    redb::TableError,
    redb::TransactionError,
    rmp_serde::decode::Error,
    rmp_serde::encode::Error,
);

/// Outcome of inserting into a unique index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// The key was free and now maps to the new row.
    Claimed,
    /// The key already maps to this row; nothing was written.
    Conflict(u64),
}

/// One unit of work against the registry.
///
/// Wraps a single write transaction. Dropping a session without calling
/// [`Session::commit`] rolls back everything it wrote.
pub struct Session {
    txn: WriteTransaction,
}

impl Session {
    pub(super) fn new(txn: WriteTransaction) -> Self {
        Self { txn }
    }

    pub fn commit(self) -> Result<(), DatabaseError> {
        self.txn.commit()?;
        Ok(())
    }

    pub fn abort(self) -> Result<(), DatabaseError> {
        self.txn.abort()?;
        Ok(())
    }

    pub(super) fn txn(&self) -> &WriteTransaction {
        &self.txn
    }

    /// Issue the next id of a sequence, starting at 1.
    pub(super) fn next_id(&self, sequence: &str) -> Result<u64, DatabaseError> {
        let mut table = self.txn.open_table(SEQUENCES)?;
        let next = table.get(sequence)?.map(|v| v.value()).unwrap_or(0) + 1;
        table.insert(sequence, next)?;
        Ok(next)
    }

    pub(super) fn get_record<T: DeserializeOwned>(
        &self,
        definition: RecordTable,
        id: u64,
    ) -> Result<Option<T>, DatabaseError> {
        let table = self.txn.open_table(definition)?;
        let record = match table.get(id)? {
            Some(data) => Some(rmp_serde::from_slice(data.value())?),
            None => None,
        };
        Ok(record)
    }

    pub(super) fn put_record<T: Serialize>(
        &self,
        definition: RecordTable,
        id: u64,
        record: &T,
    ) -> Result<(), DatabaseError> {
        let data = rmp_serde::to_vec_named(record)?;
        let mut table = self.txn.open_table(definition)?;
        table.insert(id, data.as_slice())?;
        Ok(())
    }

    pub(super) fn lookup<'k, K: Key + 'static>(
        &self,
        index: UniqueIndex<K>,
        key: impl Borrow<K::SelfType<'k>>,
    ) -> Result<Option<u64>, DatabaseError> {
        let table = self.txn.open_table(index)?;
        let id = table.get(key)?.map(|v| v.value());
        Ok(id)
    }

    /// Map `key` to `id` in a unique index unless the key is already taken.
    ///
    /// Sessions are serialized by the single write transaction and callers
    /// look the key up first, so `Conflict` only surfaces when that lookup
    /// was skipped. It never overwrites the existing mapping.
    pub(super) fn claim<'k, K: Key + 'static>(
        &self,
        index: UniqueIndex<K>,
        key: impl Borrow<K::SelfType<'k>> + Copy,
        id: u64,
    ) -> Result<Insertion, DatabaseError> {
        let mut table = self.txn.open_table(index)?;
        let existing = table.get(key)?.map(|v| v.value());
        if let Some(existing) = existing {
            return Ok(Insertion::Conflict(existing));
        }
        table.insert(key, id)?;
        Ok(Insertion::Claimed)
    }
}
