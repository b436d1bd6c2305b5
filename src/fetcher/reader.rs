//! Reader service client
//!
//! This module handles all HTTP requests to the reader service, including:
//! - Building the HTTP client with timeouts and compression
//! - Request headers for format, auth, and content targeting
//! - Decoding and checking the reader's response envelope

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

use async_trait::async_trait;

use super::{ContentFetcher, FetchError, FetchedContent};
use crate::config::FetcherConfig;

const USER_AGENT: &str = concat!("inkdrop/", env!("CARGO_PKG_VERSION"));

/// Response envelope returned by the reader service
#[derive(Debug, Deserialize)]
struct ReaderEnvelope {
    code: i64,
    #[serde(default)]
    data: Option<ReaderDocument>,
}

#[derive(Debug, Deserialize)]
struct ReaderDocument {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

/// Fetches pages through a reader service that renders them to markdown
pub struct ReaderClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl ReaderClient {
    /// Creates a new reader client from fetcher configuration
    pub fn new(config: &FetcherConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }
}

/// Returns true for hosts whose pages hide the article behind app chrome
fn targets_social_shell(url: &str) -> bool {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(_) => return false,
    };
    match parsed.host_str() {
        Some(host) => {
            host == "x.com"
                || host == "twitter.com"
                || host.ends_with(".x.com")
                || host.ends_with(".twitter.com")
        }
        None => false,
    }
}

#[async_trait]
impl ContentFetcher for ReaderClient {
    async fn fetch(&self, url: &str) -> Result<FetchedContent, FetchError> {
        let endpoint = format!("{}/{}", self.base_url, url);
        let mut request = self
            .client
            .get(&endpoint)
            .header("Accept", "application/json")
            .header("X-Return-Format", "markdown");

        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        if targets_social_shell(url) {
            // Social shells bury the article body; ask the reader to target it
            request = request.header("X-Target-Selector", "article");
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Http {
                    url: url.to_string(),
                    source: e,
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::ReaderCode {
                url: url.to_string(),
                code: status.as_u16() as i64,
            });
        }

        let body = response.text().await.map_err(|e| FetchError::Http {
            url: url.to_string(),
            source: e,
        })?;
        let envelope: ReaderEnvelope =
            serde_json::from_str(&body).map_err(|e| FetchError::Malformed {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        if envelope.code != 200 {
            return Err(FetchError::ReaderCode {
                url: url.to_string(),
                code: envelope.code,
            });
        }
        let document = envelope.data.ok_or_else(|| FetchError::Malformed {
            url: url.to_string(),
            message: "missing data field".to_string(),
        })?;

        let content = document.content.unwrap_or_default();
        if content.trim().is_empty() {
            return Err(FetchError::EmptyContent {
                url: url.to_string(),
            });
        }

        debug!("Fetched {} ({} markdown chars)", url, content.chars().count());
        Ok(FetchedContent {
            title: document.title,
            content,
        })
    }
}
