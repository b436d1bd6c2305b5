//! URL submission service

use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::queue::{CrawlJob, JobQueue};
use crate::resource::{Resource, ResourceStatus};
use crate::store::ResourceStore;

/// Accepts URL submissions, deduplicating against known resources
pub struct SubmissionService {
    store: Arc<dyn ResourceStore>,
    queue: Arc<dyn JobQueue>,
}

impl SubmissionService {
    pub fn new(store: Arc<dyn ResourceStore>, queue: Arc<dyn JobQueue>) -> Self {
        Self { store, queue }
    }

    /// Submits a URL for crawling and returns the tracking resource id
    ///
    /// A URL already represented by a live resource is not crawled again;
    /// the existing resource id comes back instead. Only when every known
    /// row for the URL has failed (or none exists) does a fresh resource
    /// get created and a crawl job enqueued.
    pub async fn submit(&self, url: &str, user_id: &str) -> crate::Result<Uuid> {
        super::validate_url(url)?;

        let existing = self.store.find_by_url(url).await?;
        if let Some(live) = existing.iter().find(|r| !r.status().is_failed()) {
            info!("Reusing resource {} for {}", live.id(), url);
            return Ok(live.id());
        }

        let id = Uuid::new_v4();
        let resource = Resource::create(id, user_id.to_string(), url.to_string());
        self.store.insert(&resource).await?;

        let job = CrawlJob::new(id, url.to_string(), user_id.to_string());
        if let Err(e) = self.queue.enqueue(&job).await {
            // A pending row with no in-flight job would never advance; fail
            // it before surfacing the enqueue error.
            error!("Failed to enqueue crawl job for resource {}: {}", id, e);
            let mut failed = resource;
            failed.mark_failed();
            self.store.update(&failed, ResourceStatus::Pending).await?;
            return Err(e.into());
        }

        info!("Submitted {} as resource {}", url, id);
        Ok(id)
    }
}
