//! Database schema definitions
//!
//! This module contains the SQL schema for the resources table.

use rusqlite::Connection;

/// SQL schema for the resources table
pub const SCHEMA_SQL: &str = r#"
-- Resources table: one row per tracked submission
CREATE TABLE IF NOT EXISTS resources (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    original_url TEXT NOT NULL,
    title TEXT,
    content_markdown TEXT,
    ai_summary TEXT,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Index for URL deduplication lookups
CREATE INDEX IF NOT EXISTS idx_resources_original_url ON resources(original_url);

-- Index for status aggregation
CREATE INDEX IF NOT EXISTS idx_resources_status ON resources(status);

-- Index for per-user lookups
CREATE INDEX IF NOT EXISTS idx_resources_user_id ON resources(user_id);
"#;

/// Initializes the database schema
///
/// Creates the resources table and indexes if they don't exist.
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
