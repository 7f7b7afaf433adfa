//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Sitemapper
//! database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per stored traversal
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    root_url TEXT NOT NULL,
    max_depth INTEGER,
    saved_at TEXT NOT NULL,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    page_count INTEGER NOT NULL,
    link_count INTEGER NOT NULL
);

-- Every discovered URL of a run, keyed by its arena id
CREATE TABLE IF NOT EXISTS pages (
    run_id INTEGER NOT NULL REFERENCES runs(id) ON DELETE CASCADE,
    page_id INTEGER NOT NULL,
    url TEXT NOT NULL,
    depth INTEGER NOT NULL,
    discovered_from INTEGER,
    state TEXT NOT NULL,
    state_detail TEXT,
    title TEXT,
    summary TEXT,
    status_code INTEGER,
    content_type TEXT,
    final_url TEXT,
    visit_rank INTEGER,
    PRIMARY KEY (run_id, page_id),
    UNIQUE (run_id, url)
);

CREATE INDEX IF NOT EXISTS idx_pages_state ON pages(run_id, state);

-- Link graph edges, in first-seen order per source page
CREATE TABLE IF NOT EXISTS links (
    run_id INTEGER NOT NULL REFERENCES runs(id) ON DELETE CASCADE,
    from_page INTEGER NOT NULL,
    to_page INTEGER NOT NULL,
    position INTEGER NOT NULL,
    PRIMARY KEY (run_id, from_page, to_page)
);

CREATE INDEX IF NOT EXISTS idx_links_to ON links(run_id, to_page);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
