//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::sitemap::{PageId, PageRecord, Sitemap};
use crate::state::FetchStatus;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus};
use crate::url::normalize_url;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::path::Path;

const RUN_COLUMNS: &str =
    "id, root_url, max_depth, saved_at, config_hash, status, page_count, link_count";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

/// A `pages` row before validation
struct StoredPage {
    page_id: i64,
    url: String,
    depth: u32,
    discovered_from: Option<i64>,
    state: String,
    state_detail: Option<String>,
    title: Option<String>,
    summary: Option<String>,
    status_code: Option<u16>,
    content_type: Option<String>,
    final_url: Option<String>,
    visit_rank: Option<i64>,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        // Initialize schema
        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
        Ok(RunRecord {
            id: row.get(0)?,
            root_url: row.get(1)?,
            max_depth: row.get(2)?,
            saved_at: row.get(3)?,
            config_hash: row.get(4)?,
            status: RunStatus::from_db_string(&row.get::<_, String>(5)?)
                .unwrap_or(RunStatus::Completed),
            page_count: row.get::<_, i64>(6)?.max(0) as u64,
            link_count: row.get::<_, i64>(7)?.max(0) as u64,
        })
    }

    fn load_pages(&self, run_id: i64) -> StorageResult<Vec<StoredPage>> {
        let mut stmt = self.conn.prepare(
            "SELECT page_id, url, depth, discovered_from, state, state_detail, title, summary,
                    status_code, content_type, final_url, visit_rank
             FROM pages WHERE run_id = ?1 ORDER BY page_id",
        )?;

        let pages = stmt
            .query_map(params![run_id], |row| {
                Ok(StoredPage {
                    page_id: row.get(0)?,
                    url: row.get(1)?,
                    depth: row.get(2)?,
                    discovered_from: row.get(3)?,
                    state: row.get(4)?,
                    state_detail: row.get(5)?,
                    title: row.get(6)?,
                    summary: row.get(7)?,
                    status_code: row.get(8)?,
                    content_type: row.get(9)?,
                    final_url: row.get(10)?,
                    visit_rank: row.get(11)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(pages)
    }

    fn load_links(&self, run_id: i64) -> StorageResult<Vec<(PageId, PageId)>> {
        let mut stmt = self.conn.prepare(
            "SELECT from_page, to_page FROM links WHERE run_id = ?1 ORDER BY from_page, position",
        )?;

        let links = stmt
            .query_map(params![run_id], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        links
            .into_iter()
            .map(|(from, to)| Ok((to_page_id(from)?, to_page_id(to)?)))
            .collect()
    }
}

/// Converts a stored id back to an arena index
fn to_page_id(value: i64) -> StorageResult<PageId> {
    PageId::try_from(value).map_err(|_| StorageError::Corrupt(format!("negative page id {}", value)))
}

impl StoredPage {
    fn into_record(self) -> StorageResult<PageRecord> {
        let url = normalize_url(&self.url, None)
            .map_err(|e| StorageError::Corrupt(format!("stored URL {}: {}", self.url, e)))?;
        let status = FetchStatus::from_db_parts(&self.state, self.state_detail.as_deref())
            .ok_or_else(|| {
                StorageError::Corrupt(format!("unknown state {} for {}", self.state, self.url))
            })?;
        let discovered_from = self.discovered_from.map(to_page_id).transpose()?;

        let mut record = PageRecord::new(to_page_id(self.page_id)?, url, self.depth, discovered_from);
        record.status = status;
        record.title = self.title;
        record.summary = self.summary;
        record.status_code = self.status_code;
        record.content_type = self.content_type;
        record.final_url = self.final_url;
        Ok(record)
    }
}

impl Storage for SqliteStorage {
    fn save_sitemap(&mut self, sitemap: &Sitemap, config_hash: &str) -> StorageResult<i64> {
        let status = if sitemap
            .pages()
            .any(|record| matches!(record.status, FetchStatus::Pending | FetchStatus::Fetching))
        {
            RunStatus::Partial
        } else {
            RunStatus::Completed
        };
        let ranks: HashMap<PageId, i64> = sitemap
            .visit_order()
            .iter()
            .enumerate()
            .map(|(rank, &id)| (id, rank as i64))
            .collect();
        let now = Utc::now().to_rfc3339();

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO runs (root_url, max_depth, saved_at, config_hash, status, page_count, link_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                sitemap.root().url.as_str(),
                sitemap.max_depth(),
                now,
                config_hash,
                status.to_db_string(),
                sitemap.len() as i64,
                sitemap.edge_count() as i64
            ],
        )?;
        let run_id = tx.last_insert_rowid();

        {
            let mut insert_page = tx.prepare(
                "INSERT INTO pages (run_id, page_id, url, depth, discovered_from, state, state_detail,
                                    title, summary, status_code, content_type, final_url, visit_rank)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            )?;
            let mut insert_link = tx.prepare(
                "INSERT INTO links (run_id, from_page, to_page, position) VALUES (?1, ?2, ?3, ?4)",
            )?;

            for record in sitemap.pages() {
                let (state, detail) = record.status.to_db_parts();
                insert_page.execute(params![
                    run_id,
                    record.id as i64,
                    record.url.as_str(),
                    record.depth,
                    record.discovered_from.map(|id| id as i64),
                    state,
                    detail,
                    record.title,
                    record.summary,
                    record.status_code,
                    record.content_type,
                    record.final_url,
                    ranks.get(&record.id).copied()
                ])?;

                for (position, &to) in record.outbound().iter().enumerate() {
                    insert_link.execute(params![run_id, record.id as i64, to as i64, position as i64])?;
                }
            }
        }

        tx.commit()?;
        tracing::info!(
            "Saved run {} ({} pages, {} links)",
            run_id,
            sitemap.len(),
            sitemap.edge_count()
        );
        Ok(run_id)
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                Self::run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                &format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS),
                [],
                Self::run_from_row,
            )
            .optional()?;
        Ok(run)
    }

    fn list_runs(&self) -> StorageResult<Vec<RunRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM runs ORDER BY id DESC", RUN_COLUMNS))?;
        let runs = stmt
            .query_map([], Self::run_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(runs)
    }

    fn load_sitemap(&self, run_id: i64) -> StorageResult<Sitemap> {
        let run = self.get_run(run_id)?;
        let stored = self.load_pages(run_id)?;

        let mut ranked: Vec<(i64, PageId)> = Vec::new();
        let mut records = Vec::with_capacity(stored.len());
        for page in stored {
            let rank = page.visit_rank;
            let record = page.into_record()?;
            if let Some(rank) = rank {
                ranked.push((rank, record.id));
            }
            records.push(record);
        }
        ranked.sort_unstable();
        let visit_order = ranked.into_iter().map(|(_, id)| id).collect();

        let links = self.load_links(run_id)?;
        let sitemap = Sitemap::restore(run.max_depth, records, &links, visit_order)
            .map_err(|e| StorageError::Corrupt(e.to_string()))?;

        tracing::debug!("Loaded run {} ({} pages)", run_id, sitemap.len());
        Ok(sitemap)
    }
}
