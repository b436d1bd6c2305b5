//! Content fetching module
//!
//! Crawling goes through a reader service that renders a page to markdown,
//! rather than fetching and parsing raw HTML locally.

mod reader;

pub use reader::ReaderClient;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while fetching content
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP error fetching {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Timeout fetching {url}")]
    Timeout { url: String },

    #[error("Reader rejected {url} with code {code}")]
    ReaderCode { url: String, code: i64 },

    #[error("Malformed reader response for {url}: {message}")]
    Malformed { url: String, message: String },

    #[error("Reader returned empty content for {url}")]
    EmptyContent { url: String },
}

/// Content extracted from a fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedContent {
    pub title: Option<String>,
    pub content: String,
}

/// Trait for fetching a URL's content as markdown
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedContent, FetchError>;
}
