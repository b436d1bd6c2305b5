//! Content analysis module
//!
//! Analysis runs a short chain of text stages (query rewriting, then
//! summarization) against a pluggable completion backend.

mod service;
mod stages;

pub use service::{AnalysisReport, AnalysisService};
pub use stages::{run_stages, AnalysisState};

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::resource::TransitionError;
use crate::store::StoreError;

/// Error returned by a text completion backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Agent error: {0}")]
pub struct AgentError(pub String);

/// Trait for a text completion backend
#[async_trait]
pub trait TextAgent: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, AgentError>;
}

/// Errors that can occur during analysis
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Resource {0} not found")]
    ResourceNotFound(Uuid),

    #[error("Resource {0} has no crawled content to analyze")]
    ContentMissing(Uuid),

    #[error("Transition error: {0}")]
    Transition(#[from] TransitionError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
