//! Crawl job processing

use std::sync::Arc;
use tracing::{info, warn};

use crate::fetcher::ContentFetcher;
use crate::queue::CrawlJob;
use crate::store::{ResourceStore, StoreError};

/// Processes leased crawl jobs against the resource store
pub struct CrawlWorker {
    store: Arc<dyn ResourceStore>,
    fetcher: Arc<dyn ContentFetcher>,
}

impl CrawlWorker {
    pub fn new(store: Arc<dyn ResourceStore>, fetcher: Arc<dyn ContentFetcher>) -> Self {
        Self { store, fetcher }
    }

    /// Processes one delivered crawl job
    ///
    /// Fetch failures fail the resource and still settle the job as done;
    /// re-crawling a dead page is pointless. A delivery for a resource
    /// that is gone or has already moved on is dropped without effect.
    /// Only storage faults propagate, because those are the one failure
    /// a retried delivery can actually fix.
    pub async fn process(&self, job: &CrawlJob) -> Result<(), StoreError> {
        let found = self
            .store
            .find_by_id_and_user(job.resource_id, &job.user_id)
            .await?;
        let mut resource = match found {
            Some(resource) => resource,
            None => {
                warn!(
                    "Resource {} not found for user {}, dropping job",
                    job.resource_id, job.user_id
                );
                return Ok(());
            }
        };

        let previous_status = resource.status();
        match self.fetcher.fetch(&job.url).await {
            Ok(fetched) => match resource.mark_crawled(fetched.title, fetched.content) {
                Ok(()) => info!("Crawled {} for resource {}", job.url, job.resource_id),
                Err(e) => {
                    warn!(
                        "Dropping stale delivery for resource {}: {}",
                        job.resource_id, e
                    );
                    return Ok(());
                }
            },
            Err(e) => {
                warn!("Crawl failed for resource {}: {}", job.resource_id, e);
                resource.mark_failed();
            }
        }

        match self.store.update(&resource, previous_status).await {
            Ok(()) => Ok(()),
            Err(StoreError::ConcurrentChange { id, expected }) => {
                warn!(
                    "Resource {} changed away from {} mid-crawl, dropping result",
                    id, expected
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
