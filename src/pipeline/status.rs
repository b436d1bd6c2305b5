//! Status reporting over submitted URLs

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::resource::{ReportedStatus, Resource};
use crate::store::ResourceStore;
use crate::ValidationError;

/// Longest content excerpt included in a snapshot
const PREVIEW_MAX_CHARS: usize = 200;

/// Point-in-time view of one URL's resource
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSnapshot {
    pub url: String,
    pub id: Uuid,
    pub title: Option<String>,
    pub preview_content: Option<String>,
    pub ai_summary: Option<String>,
    pub status: ReportedStatus,
}

/// Answers status queries for batches of URLs
pub struct StatusService {
    store: Arc<dyn ResourceStore>,
}

impl StatusService {
    pub fn new(store: Arc<dyn ResourceStore>) -> Self {
        Self { store }
    }

    /// Reports one snapshot per known URL, in request order
    ///
    /// URLs never submitted are omitted rather than reported as missing.
    /// When a URL has accumulated several rows, the freshest live one
    /// stands for it; only if every row failed is the failure reported.
    pub async fn check_status(&self, urls: &[String]) -> crate::Result<Vec<ResourceSnapshot>> {
        if urls.is_empty() {
            return Err(ValidationError::EmptyUrlList.into());
        }
        if urls.iter().any(|u| u.trim().is_empty()) {
            return Err(ValidationError::BlankUrlEntry.into());
        }

        let resources = self.store.find_by_urls(urls).await?;

        // Rows come back freshest first; grouping keeps that order per URL
        let mut by_url: HashMap<&str, Vec<&Resource>> = HashMap::new();
        for resource in &resources {
            by_url
                .entry(resource.original_url())
                .or_default()
                .push(resource);
        }

        let mut snapshots = Vec::new();
        for url in urls {
            let candidates = match by_url.get(url.as_str()) {
                Some(candidates) => candidates,
                None => continue,
            };
            if let Some(resource) = super::pick_candidate(candidates.iter().copied()) {
                snapshots.push(snapshot_of(url, resource));
            }
        }
        Ok(snapshots)
    }
}

fn snapshot_of(url: &str, resource: &Resource) -> ResourceSnapshot {
    ResourceSnapshot {
        url: url.to_string(),
        id: resource.id(),
        title: resource.title().map(str::to_string),
        preview_content: resource.content_markdown().map(preview),
        ai_summary: resource.ai_summary().map(str::to_string),
        status: resource.status().into(),
    }
}

fn preview(content: &str) -> String {
    content.chars().take(PREVIEW_MAX_CHARS).collect()
}
