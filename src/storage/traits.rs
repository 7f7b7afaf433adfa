//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::sitemap::Sitemap;
use crate::storage::RunRecord;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("No stored runs")]
    NoRuns,

    #[error("Corrupt stored data: {0}")]
    Corrupt(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// A backend keeps finished sitemaps, one per run, and can rebuild any of
/// them for re-rendering.
pub trait Storage {
    /// Stores a finished sitemap as a new run
    ///
    /// # Arguments
    ///
    /// * `sitemap` - The traversal result
    /// * `config_hash` - Hash of the configuration that produced it
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn save_sitemap(&mut self, sitemap: &Sitemap, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run, if any
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// All runs, newest first
    fn list_runs(&self) -> StorageResult<Vec<RunRecord>>;

    /// Rebuilds the sitemap stored for a run
    fn load_sitemap(&self, run_id: i64) -> StorageResult<Sitemap>;

    /// Rebuilds the sitemap of the most recent run
    fn load_latest_sitemap(&self) -> StorageResult<Sitemap> {
        let run = self.get_latest_run()?.ok_or(StorageError::NoRuns)?;
        self.load_sitemap(run.id)
    }
}
