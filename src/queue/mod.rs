//! Durable job queue module
//!
//! This module provides at-least-once delivery of crawl jobs, including:
//! - A SQLite-backed queue that survives restarts
//! - Lease-based consumption with explicit ack and fail
//! - Retry scheduling with exponential backoff
//! - A dead letter table for jobs that exhaust their attempts

mod job;
mod retry;
mod sqlite;

pub use job::{CrawlJob, DeadLetter};
pub use retry::RetryPolicy;
pub use sqlite::SqliteQueue;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during queue operations
#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Queue is closed")]
    Closed,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;

/// Job counts per queue state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueCounts {
    pub ready: u64,
    pub scheduled: u64,
    pub running: u64,
    pub dead: u64,
}

impl QueueCounts {
    /// Returns true when no job is waiting or in flight
    pub fn is_drained(&self) -> bool {
        self.ready == 0 && self.scheduled == 0 && self.running == 0
    }
}

/// Trait for enqueueing and leasing crawl jobs
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Makes a job available for delivery
    async fn enqueue(&self, job: &CrawlJob) -> QueueResult<()>;

    /// Waits for a job and leases it to the caller
    ///
    /// The job is invisible to other consumers until the lease is settled
    /// with `ack` or `fail`. Returns `None` only if the implementation has
    /// no more jobs to hand out and never will.
    async fn lease(&self) -> QueueResult<Option<Box<dyn JobLease>>>;

    /// Returns job counts per state
    async fn counts(&self) -> QueueResult<QueueCounts>;

    /// Returns the jobs that exhausted their attempts
    async fn dead_letters(&self) -> QueueResult<Vec<DeadLetter>>;
}

/// A leased job awaiting settlement
#[async_trait]
pub trait JobLease: Send {
    /// The leased job payload
    fn job(&self) -> &CrawlJob;

    /// Which delivery this is, starting at 1
    fn attempt(&self) -> u32;

    /// Settles the lease as done, removing the job
    async fn ack(self: Box<Self>) -> QueueResult<()>;

    /// Settles the lease as failed, scheduling a retry or dead-lettering
    async fn fail(self: Box<Self>, error: &str) -> QueueResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_drained() {
        let drained = QueueCounts::default();
        assert!(drained.is_drained());

        let busy = QueueCounts {
            ready: 0,
            scheduled: 1,
            running: 0,
            dead: 0,
        };
        assert!(!busy.is_drained());
    }

    #[test]
    fn test_dead_jobs_do_not_block_drain() {
        let counts = QueueCounts {
            ready: 0,
            scheduled: 0,
            running: 0,
            dead: 3,
        };
        assert!(counts.is_drained());
    }
}
