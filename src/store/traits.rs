//! Store traits and error types
//!
//! This module defines the trait interface for resource persistence and
//! associated error types.

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::resource::{Resource, ResourceStatus};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Concurrent change: resource {id} is no longer {expected}")]
    ConcurrentChange { id: Uuid, expected: ResourceStatus },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Trait for persisting and querying resources
///
/// Implementations must be safe to share across worker tasks.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Persists a newly created resource
    async fn insert(&self, resource: &Resource) -> StoreResult<()>;

    /// Persists the resource's current fields, guarded by its prior status
    ///
    /// The write only applies while the stored row still carries
    /// `expected_status`. If another writer got there first, the update
    /// affects no rows and `ConcurrentChange` is returned, leaving the
    /// newer state untouched.
    async fn update(&self, resource: &Resource, expected_status: ResourceStatus)
        -> StoreResult<()>;

    /// Looks up a resource by id, scoped to its owning user
    async fn find_by_id_and_user(&self, id: Uuid, user_id: &str)
        -> StoreResult<Option<Resource>>;

    /// Returns every resource recorded for a URL, freshest first
    async fn find_by_url(&self, url: &str) -> StoreResult<Vec<Resource>>;

    /// Returns every resource recorded for any of the URLs, freshest first
    async fn find_by_urls(&self, urls: &[String]) -> StoreResult<Vec<Resource>>;

    /// Counts stored resources grouped by status
    async fn count_by_status(&self) -> StoreResult<HashMap<ResourceStatus, u64>>;
}
