//! Worker pool driving crawl jobs from the queue

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::worker::CrawlWorker;
use crate::queue::JobQueue;

/// A set of tasks leasing and processing crawl jobs
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    shutdown: watch::Sender<bool>,
}

impl WorkerPool {
    /// Spawns `count` worker tasks consuming from the queue
    pub fn spawn(queue: Arc<dyn JobQueue>, worker: Arc<CrawlWorker>, count: usize) -> Self {
        let (shutdown, _) = watch::channel(false);
        let mut handles = Vec::with_capacity(count);

        for _ in 0..count {
            let queue = Arc::clone(&queue);
            let worker = Arc::clone(&worker);
            let mut shutdown_rx = shutdown.subscribe();
            handles.push(tokio::spawn(async move {
                worker_loop(queue, worker, &mut shutdown_rx).await;
            }));
        }

        info!("Started {} crawl worker(s)", count);
        Self { handles, shutdown }
    }

    /// Signals the workers to stop and waits for them to finish
    ///
    /// A worker mid-job completes that job before exiting.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for handle in self.handles {
            let _ = handle.await;
        }
        info!("Crawl workers stopped");
    }
}

async fn worker_loop(
    queue: Arc<dyn JobQueue>,
    worker: Arc<CrawlWorker>,
    shutdown: &mut watch::Receiver<bool>,
) {
    loop {
        let lease = tokio::select! {
            _ = shutdown.changed() => break,
            leased = queue.lease() => match leased {
                Ok(Some(lease)) => lease,
                Ok(None) => break,
                Err(e) => {
                    error!("Queue lease failed: {}", e);
                    break;
                }
            },
        };

        let settled = match worker.process(lease.job()).await {
            Ok(()) => lease.ack().await,
            Err(e) => lease.fail(&e.to_string()).await,
        };
        if let Err(e) = settled {
            error!("Failed to settle crawl job lease: {}", e);
        }
    }
}
