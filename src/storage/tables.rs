use redb::TableDefinition;

/// User records: internal id -> UserRecord (msgpack)
pub const USERS: TableDefinition<u64, &[u8]> = TableDefinition::new("users");

/// Category records: internal id -> CategoryRecord (msgpack)
pub const CATEGORIES: TableDefinition<u64, &[u8]> = TableDefinition::new("categories");

/// File records: internal id -> FileRecord (msgpack)
pub const FILES: TableDefinition<u64, &[u8]> = TableDefinition::new("files");

/// Unique index: platform user identity -> user id
pub const USER_IDENTITIES: TableDefinition<i64, u64> = TableDefinition::new("user_identities");

/// Unique index: lower-cased category name -> category id
pub const CATEGORY_NAMES: TableDefinition<&str, u64> = TableDefinition::new("category_names");

/// Unique index: public id -> file id
pub const FILE_PUBLIC_IDS: TableDefinition<&str, u64> = TableDefinition::new("file_public_ids");

/// Ownership index: (user id, created_at micros, file id) -> ()
///
/// Iterated in reverse for newest-first listings; also drives cascade deletes.
pub const USER_FILES: TableDefinition<(u64, i64, u64), ()> = TableDefinition::new("user_files");

/// Id sequences: table name -> last issued id
pub const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

/// Shape shared by the msgpack record tables.
pub type RecordTable = TableDefinition<'static, u64, &'static [u8]>;

/// Shape shared by the unique indexes, whatever their key type.
pub type UniqueIndex<K> = TableDefinition<'static, K, u64>;
