//! Store module for persisting resources
//!
//! This module handles all database operations for tracked resources, including:
//! - SQLite database initialization and schema management
//! - Resource persistence with status-guarded updates
//! - URL and status lookups for deduplication and reporting

mod schema;
mod sqlite;
mod traits;

pub use schema::{initialize_schema, SCHEMA_SQL};
pub use sqlite::SqliteStore;
pub use traits::{ResourceStore, StoreError, StoreResult};
