//! Crawl job payload definitions

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payload carried by a crawl job
///
/// The payload names the resource to crawl rather than carrying resource
/// state, so a redelivered job always works against the current row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlJob {
    pub resource_id: Uuid,
    pub url: String,
    pub user_id: String,
}

impl CrawlJob {
    pub fn new(resource_id: Uuid, url: String, user_id: String) -> Self {
        Self {
            resource_id,
            url,
            user_id,
        }
    }
}

/// A job that exhausted its delivery attempts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadLetter {
    pub job: CrawlJob,
    pub attempts: u32,
    pub last_error: String,
    pub dead_at: String,
}
