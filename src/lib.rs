//! Inkdrop: a URL ingestion pipeline
//!
//! This crate tracks submitted URLs as resources, crawls them through a
//! reader service via a durable job queue, and answers status queries
//! with a normalized view of each URL's progress.

pub mod analysis;
pub mod config;
pub mod fetcher;
pub mod pipeline;
pub mod queue;
pub mod resource;
pub mod store;

use thiserror::Error;

/// Main error type for Inkdrop operations
#[derive(Debug, Error)]
pub enum InkdropError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("Queue error: {0}")]
    Queue(#[from] queue::QueueError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] fetcher::FetchError),

    #[error("Transition error: {0}")]
    Transition(#[from] resource::TransitionError),

    #[error("Analysis error: {0}")]
    Analysis(#[from] analysis::AnalysisError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Submission validation errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("URL cannot be empty")]
    EmptyUrl,

    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("URL list cannot be empty")]
    EmptyUrlList,

    #[error("URL list cannot contain blank entries")]
    BlankUrlEntry,
}

/// Result type alias for Inkdrop operations
pub type Result<T> = std::result::Result<T, InkdropError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use pipeline::{CrawlWorker, StatusService, SubmissionService, WorkerPool};
pub use resource::{ReportedStatus, Resource, ResourceStatus};
