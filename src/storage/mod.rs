//! Storage module for persisting finished sitemaps
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Saving a sitemap (pages, link graph, fetch order) as a run
//! - Reloading a stored run for re-rendering without crawling

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(StorageError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// Represents a stored run
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub id: i64,
    pub root_url: String,
    pub max_depth: Option<u32>,
    pub saved_at: String,
    pub config_hash: String,
    pub status: RunStatus,
    pub page_count: u64,
    pub link_count: u64,
}

/// Status of a stored run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// The frontier was exhausted
    Completed,

    /// The crawl was cancelled with pages still pending
    Partial,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Partial => "partial",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(Self::Completed),
            "partial" => Some(Self::Partial),
            _ => None,
        }
    }
}
