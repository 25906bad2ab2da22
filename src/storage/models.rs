use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name of the reserved fallback category.
pub const DEFAULT_CATEGORY_NAME: &str = "General";

/// Stored name for uploads that arrive without one.
pub const UNNAMED_FILE: &str = "Unnamed File";

/// Stored MIME type for uploads that arrive without one.
pub const UNKNOWN_MIME_TYPE: &str = "unknown/type";

/// Classification of a file derived from its MIME type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Audio,
    Binary,
    Document,
    Image,
    Video,
}

impl FileType {
    /// Derive a file type classification from a MIME type string.
    pub fn from_mime(mime_type: &str) -> Self {
        let (primary, sub) = mime_type.split_once('/').unwrap_or((mime_type, ""));
        match primary {
            "audio" => FileType::Audio,
            "image" => FileType::Image,
            "video" => FileType::Video,
            "text" => FileType::Document,
            "application" => match sub {
                "pdf"
                | "msword"
                | "rtf"
                | "vnd.openxmlformats-officedocument.wordprocessingml.document"
                | "vnd.openxmlformats-officedocument.spreadsheetml.sheet"
                | "vnd.openxmlformats-officedocument.presentationml.presentation"
                | "vnd.ms-excel"
                | "vnd.ms-powerpoint" => FileType::Document,
                _ => FileType::Binary,
            },
            _ => FileType::Binary,
        }
    }
}

/// A platform account known to the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: u64,
    pub external_id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub current_category_id: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A named bucket shared by all users
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: u64,
    pub name: String,
}

/// A stored file reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: u64,
    pub public_id: String,
    pub name: String,
    pub mime_type: String,
    pub file_type: FileType,
    #[serde(default)]
    pub byte_size: Option<u64>,
    /// Opaque handle the messaging platform uses to re-send the bytes
    pub storage_ref: String,
    pub user_id: u64,
    pub category_id: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Optional profile fields supplied by the platform with each event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayHints {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Metadata for an upload event, as reported by the transport.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewFile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub byte_size: Option<u64>,
    pub storage_ref: String,
}

/// One window of a user's files plus the size of the whole listing.
#[derive(Debug, Clone)]
pub struct FilePage {
    pub items: Vec<FileRecord>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

impl FilePage {
    /// ceil(total / page_size)
    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.page_size))
    }
}
