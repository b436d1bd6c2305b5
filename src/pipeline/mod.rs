//! Submission, crawl, and status pipeline
//!
//! This module ties the store, queue, and fetcher together:
//! - Submissions create pending resources and enqueue crawl jobs
//! - Workers lease those jobs and crawl their URLs
//! - The status service reports normalized progress per URL

mod pool;
mod status;
mod submit;
mod worker;

pub use pool::WorkerPool;
pub use status::{ResourceSnapshot, StatusService};
pub use submit::SubmissionService;
pub use worker::CrawlWorker;

use url::Url;

use crate::resource::Resource;
use crate::ValidationError;

/// Validates a URL submitted for crawling
pub(crate) fn validate_url(raw: &str) -> Result<(), ValidationError> {
    if raw.trim().is_empty() {
        return Err(ValidationError::EmptyUrl);
    }

    let parsed = Url::parse(raw).map_err(|e| ValidationError::InvalidUrl {
        url: raw.to_string(),
        message: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ValidationError::InvalidUrl {
                url: raw.to_string(),
                message: format!("unsupported scheme '{}'", other),
            })
        }
    }

    if parsed.host_str().is_none() {
        return Err(ValidationError::InvalidUrl {
            url: raw.to_string(),
            message: "missing host".to_string(),
        });
    }
    Ok(())
}

/// Picks the resource that represents a URL among its recorded rows
///
/// Rows arrive freshest first. The first one that has not failed wins;
/// if every row failed, the freshest failure stands for the URL.
pub(crate) fn pick_candidate<'a, I>(mut candidates: I) -> Option<&'a Resource>
where
    I: Iterator<Item = &'a Resource> + Clone,
{
    match candidates.clone().find(|r| !r.status().is_failed()) {
        Some(resource) => Some(resource),
        None => candidates.next(),
    }
}
