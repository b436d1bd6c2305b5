//! SQLite queue implementation
//!
//! Jobs move through three states: ready (claimable), running (leased),
//! and scheduled (waiting out a retry backoff). Rows survive restarts,
//! and jobs left running by a crash are recovered to ready on open.

use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, error, warn};

use async_trait::async_trait;

use super::job::{CrawlJob, DeadLetter};
use super::retry::RetryPolicy;
use super::{JobLease, JobQueue, QueueCounts, QueueResult};

const STATE_READY: &str = "ready";
const STATE_SCHEDULED: &str = "scheduled";
const STATE_RUNNING: &str = "running";

/// SQL schema for the job queue tables
pub const QUEUE_SCHEMA_SQL: &str = r#"
-- Live jobs: ready to claim, leased, or waiting out a backoff
CREATE TABLE IF NOT EXISTS crawl_jobs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    payload TEXT NOT NULL,
    state TEXT NOT NULL,
    attempts INTEGER NOT NULL DEFAULT 0,
    next_run_at INTEGER,
    last_error TEXT,
    enqueued_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_crawl_jobs_state ON crawl_jobs(state);

-- Jobs that exhausted their delivery attempts
CREATE TABLE IF NOT EXISTS crawl_dead_letters (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    payload TEXT NOT NULL,
    attempts INTEGER NOT NULL,
    last_error TEXT NOT NULL,
    dead_at TEXT NOT NULL
);
"#;

fn now_text() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Durable crawl job queue writing to a SQLite database
pub struct SqliteQueue {
    conn: Arc<Mutex<Connection>>,
    notify: Arc<Notify>,
    policy: RetryPolicy,
}

impl SqliteQueue {
    /// Opens the queue, initializing its schema and recovering leases
    /// abandoned by a previous process
    pub fn open<P: AsRef<Path>>(db_path: P, policy: RetryPolicy) -> QueueResult<Self> {
        let conn = Connection::open(db_path.as_ref())?;
        Self::configure(&conn)?;
        Self::recover_interrupted(&conn)?;

        debug!("Job queue opened at {}", db_path.as_ref().display());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            notify: Arc::new(Notify::new()),
            policy,
        })
    }

    /// Creates an in-memory queue for testing
    #[cfg(test)]
    pub fn new_in_memory(policy: RetryPolicy) -> QueueResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            notify: Arc::new(Notify::new()),
            policy,
        })
    }

    fn configure(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        conn.execute_batch(QUEUE_SCHEMA_SQL)
    }

    /// Puts jobs a dead process left running back up for delivery
    fn recover_interrupted(conn: &Connection) -> rusqlite::Result<()> {
        let recovered = conn.execute(
            "UPDATE crawl_jobs
             SET state = ?1, next_run_at = NULL, updated_at = ?2
             WHERE state = ?3",
            params![STATE_READY, now_text(), STATE_RUNNING],
        )?;
        if recovered > 0 {
            warn!("Recovered {} interrupted job(s) back to ready", recovered);
        }
        Ok(())
    }

    /// Attempts to claim one job, promoting due retries first
    fn try_claim(&self) -> QueueResult<Option<SqliteLease>> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "UPDATE crawl_jobs
             SET state = ?1, next_run_at = NULL, updated_at = ?2
             WHERE state = ?3 AND next_run_at <= ?4",
            params![STATE_READY, now_text(), STATE_SCHEDULED, now_millis()],
        )?;

        let claimed = conn
            .query_row(
                &format!(
                    "SELECT id, payload, attempts FROM crawl_jobs
                     WHERE state = '{}' ORDER BY id LIMIT 1",
                    STATE_READY
                ),
                [],
                |row| {
                    let id: i64 = row.get(0)?;
                    let payload: String = row.get(1)?;
                    let attempts: i64 = row.get(2)?;
                    Ok((id, payload, attempts))
                },
            )
            .optional()?;

        let (row_id, payload, attempts) = match claimed {
            Some(row) => row,
            None => return Ok(None),
        };

        conn.execute(
            "UPDATE crawl_jobs
             SET state = ?1, attempts = attempts + 1, updated_at = ?2
             WHERE id = ?3",
            params![STATE_RUNNING, now_text(), row_id],
        )?;

        let job: CrawlJob = serde_json::from_str(&payload)?;
        Ok(Some(SqliteLease {
            conn: Arc::clone(&self.conn),
            notify: Arc::clone(&self.notify),
            policy: self.policy.clone(),
            row_id,
            job,
            attempt: attempts as u32 + 1,
        }))
    }

    /// Time until the earliest scheduled retry becomes due
    fn next_scheduled_delay(&self) -> QueueResult<Option<Duration>> {
        let conn = self.conn.lock().unwrap();
        let earliest: Option<i64> = conn.query_row(
            &format!(
                "SELECT MIN(next_run_at) FROM crawl_jobs WHERE state = '{}'",
                STATE_SCHEDULED
            ),
            [],
            |row| row.get(0),
        )?;

        Ok(earliest.map(|at| {
            let millis = (at - now_millis()).max(0) as u64;
            Duration::from_millis(millis)
        }))
    }
}

#[async_trait]
impl JobQueue for SqliteQueue {
    async fn enqueue(&self, job: &CrawlJob) -> QueueResult<()> {
        let payload = serde_json::to_string(job)?;
        let now = now_text();
        {
            let conn = self.conn.lock().unwrap();
            conn.execute(
                "INSERT INTO crawl_jobs (payload, state, enqueued_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![payload, STATE_READY, now, now],
            )?;
        }

        debug!("Enqueued crawl job for resource {}", job.resource_id);
        self.notify.notify_one();
        Ok(())
    }

    async fn lease(&self) -> QueueResult<Option<Box<dyn JobLease>>> {
        loop {
            if let Some(lease) = self.try_claim()? {
                // Pass the wakeup along in case further jobs are ready
                self.notify.notify_one();
                return Ok(Some(Box::new(lease)));
            }

            match self.next_scheduled_delay()? {
                Some(delay) => {
                    tokio::select! {
                        _ = self.notify.notified() => {}
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                None => self.notify.notified().await,
            }
        }
    }

    async fn counts(&self) -> QueueResult<QueueCounts> {
        let conn = self.conn.lock().unwrap();
        let mut counts = QueueCounts::default();

        let mut stmt = conn.prepare("SELECT state, COUNT(*) FROM crawl_jobs GROUP BY state")?;
        let rows = stmt.query_map([], |row| {
            let state: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            Ok((state, count))
        })?;
        for row in rows {
            let (state, count) = row?;
            match state.as_str() {
                STATE_READY => counts.ready = count as u64,
                STATE_SCHEDULED => counts.scheduled = count as u64,
                STATE_RUNNING => counts.running = count as u64,
                other => warn!("Ignoring unknown job state '{}' in counts", other),
            }
        }

        let dead: i64 = conn.query_row("SELECT COUNT(*) FROM crawl_dead_letters", [], |row| {
            row.get(0)
        })?;
        counts.dead = dead as u64;
        Ok(counts)
    }

    async fn dead_letters(&self) -> QueueResult<Vec<DeadLetter>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT payload, attempts, last_error, dead_at FROM crawl_dead_letters ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            let payload: String = row.get(0)?;
            let attempts: i64 = row.get(1)?;
            let last_error: String = row.get(2)?;
            let dead_at: String = row.get(3)?;
            Ok((payload, attempts, last_error, dead_at))
        })?;

        let mut letters = Vec::new();
        for row in rows {
            let (payload, attempts, last_error, dead_at) = row?;
            let job: CrawlJob = serde_json::from_str(&payload)?;
            letters.push(DeadLetter {
                job,
                attempts: attempts as u32,
                last_error,
                dead_at,
            });
        }
        Ok(letters)
    }
}

/// Lease over a single claimed row of the jobs table
struct SqliteLease {
    conn: Arc<Mutex<Connection>>,
    notify: Arc<Notify>,
    policy: RetryPolicy,
    row_id: i64,
    job: CrawlJob,
    attempt: u32,
}

#[async_trait]
impl JobLease for SqliteLease {
    fn job(&self) -> &CrawlJob {
        &self.job
    }

    fn attempt(&self) -> u32 {
        self.attempt
    }

    async fn ack(self: Box<Self>) -> QueueResult<()> {
        {
            let conn = self.conn.lock().unwrap();
            conn.execute("DELETE FROM crawl_jobs WHERE id = ?1", params![self.row_id])?;
        }
        debug!(
            "Acked crawl job for resource {} on attempt {}",
            self.job.resource_id, self.attempt
        );
        Ok(())
    }

    async fn fail(self: Box<Self>, error_text: &str) -> QueueResult<()> {
        if self.policy.is_exhausted(self.attempt) {
            error!(
                "Crawl job for resource {} failed on attempt {} of {}, dead-lettering: {}",
                self.job.resource_id,
                self.attempt,
                self.policy.max_attempts(),
                error_text
            );

            let payload = serde_json::to_string(&self.job)?;
            let mut conn = self.conn.lock().unwrap();
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO crawl_dead_letters (payload, attempts, last_error, dead_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![payload, self.attempt, error_text, now_text()],
            )?;
            tx.execute("DELETE FROM crawl_jobs WHERE id = ?1", params![self.row_id])?;
            tx.commit()?;
            return Ok(());
        }

        let delay = self.policy.backoff(self.attempt);
        warn!(
            "Crawl job for resource {} failed on attempt {} of {}, retrying in {:?}: {}",
            self.job.resource_id,
            self.attempt,
            self.policy.max_attempts(),
            delay,
            error_text
        );

        {
            let next_run_at = now_millis() + delay.as_millis() as i64;
            let conn = self.conn.lock().unwrap();
            conn.execute(
                "UPDATE crawl_jobs
                 SET state = ?1, next_run_at = ?2, last_error = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![
                    STATE_SCHEDULED,
                    next_run_at,
                    error_text,
                    now_text(),
                    self.row_id
                ],
            )?;
        }

        // A waiting consumer may be sleeping toward a later deadline
        self.notify.notify_one();
        Ok(())
    }
}
