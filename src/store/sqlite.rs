//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the ResourceStore trait.

use chrono::{SecondsFormat, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use uuid::Uuid;

use async_trait::async_trait;

use super::schema::initialize_schema;
use super::traits::{ResourceStore, StoreError, StoreResult};
use crate::resource::{Resource, ResourceStatus};

const SELECT_COLUMNS: &str =
    "id, user_id, original_url, title, content_markdown, ai_summary, status";

/// Resource store writing to a SQLite database
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Creates a new store, initializing the schema if needed
    pub fn new<P: AsRef<Path>>(db_path: P) -> StoreResult<Self> {
        let conn = Connection::open(db_path.as_ref())?;
        Self::configure(&conn)?;

        tracing::debug!("Resource store opened at {}", db_path.as_ref().display());

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory store for testing
    #[cfg(test)]
    pub fn new_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn configure(conn: &Connection) -> rusqlite::Result<()> {
        // The queue may share this database file, so wait out its writes
        // instead of failing fast on SQLITE_BUSY.
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA temp_store = MEMORY;
             PRAGMA busy_timeout = 5000;",
        )?;
        initialize_schema(conn)
    }
}

fn now_text() -> String {
    // Fixed-width UTC timestamps keep lexicographic ORDER BY correct
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn row_to_resource(row: &rusqlite::Row<'_>) -> rusqlite::Result<Resource> {
    let id_text: String = row.get(0)?;
    let id = Uuid::parse_str(&id_text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let status_text: String = row.get(6)?;
    let status = ResourceStatus::from_db_string(&status_text).unwrap_or(ResourceStatus::Failed);

    Ok(Resource::rehydrate(
        id,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        status,
    ))
}

#[async_trait]
impl ResourceStore for SqliteStore {
    async fn insert(&self, resource: &Resource) -> StoreResult<()> {
        let now = now_text();
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO resources (id, user_id, original_url, title, content_markdown, ai_summary, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                resource.id().to_string(),
                resource.user_id(),
                resource.original_url(),
                resource.title(),
                resource.content_markdown(),
                resource.ai_summary(),
                resource.status().to_db_string(),
                now,
                now,
            ],
        )?;
        Ok(())
    }

    async fn update(
        &self,
        resource: &Resource,
        expected_status: ResourceStatus,
    ) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        let affected = conn.execute(
            "UPDATE resources
             SET title = ?1, content_markdown = ?2, ai_summary = ?3, status = ?4, updated_at = ?5
             WHERE id = ?6 AND status = ?7",
            params![
                resource.title(),
                resource.content_markdown(),
                resource.ai_summary(),
                resource.status().to_db_string(),
                now_text(),
                resource.id().to_string(),
                expected_status.to_db_string(),
            ],
        )?;

        if affected == 0 {
            return Err(StoreError::ConcurrentChange {
                id: resource.id(),
                expected: expected_status,
            });
        }
        Ok(())
    }

    async fn find_by_id_and_user(
        &self,
        id: Uuid,
        user_id: &str,
    ) -> StoreResult<Option<Resource>> {
        let conn = self.conn.lock().unwrap();
        let resource = conn
            .query_row(
                &format!(
                    "SELECT {} FROM resources WHERE id = ?1 AND user_id = ?2",
                    SELECT_COLUMNS
                ),
                params![id.to_string(), user_id],
                row_to_resource,
            )
            .optional()?;
        Ok(resource)
    }

    async fn find_by_url(&self, url: &str) -> StoreResult<Vec<Resource>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM resources WHERE original_url = ?1
             ORDER BY updated_at DESC, rowid DESC",
            SELECT_COLUMNS
        ))?;
        let rows = stmt.query_map(params![url], row_to_resource)?;

        let mut resources = Vec::new();
        for row in rows {
            resources.push(row?);
        }
        Ok(resources)
    }

    async fn find_by_urls(&self, urls: &[String]) -> StoreResult<Vec<Resource>> {
        if urls.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; urls.len()].join(", ");
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM resources WHERE original_url IN ({})
             ORDER BY updated_at DESC, rowid DESC",
            SELECT_COLUMNS, placeholders
        ))?;
        let rows = stmt.query_map(params_from_iter(urls.iter()), row_to_resource)?;

        let mut resources = Vec::new();
        for row in rows {
            resources.push(row?);
        }
        Ok(resources)
    }

    async fn count_by_status(&self) -> StoreResult<HashMap<ResourceStatus, u64>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM resources GROUP BY status")?;
        let rows = stmt.query_map([], |row| {
            let status: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            Ok((status, count))
        })?;

        let mut counts = HashMap::new();
        for row in rows {
            let (status_text, count) = row?;
            let status =
                ResourceStatus::from_db_string(&status_text).unwrap_or(ResourceStatus::Failed);
            *counts.entry(status).or_insert(0) += count as u64;
        }
        Ok(counts)
    }
}
