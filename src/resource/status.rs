/// Resource status definitions for tracking ingestion progress
///
/// This module defines the lifecycle states of a resource and the
/// normalized status enumeration reported to external callers.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the current lifecycle state of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceStatus {
    // ===== Active States =====
    /// Submitted, crawl job enqueued, no content yet
    Pending,

    /// Content fetched and rendered to markdown
    Crawled,

    /// Embedding of the content is in progress
    Embedding,

    /// Embedding completed
    Embedded,

    /// Analysis of the content is in progress
    Analyzing,

    /// Analysis completed, summary available
    Analyzed,

    // ===== Terminal State =====
    /// Terminal failure; a fresh submission creates a new resource
    Failed,
}

impl ResourceStatus {
    /// Returns true if this is the absorbing failure state
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Returns true if crawled content is available in this state
    pub fn has_content(&self) -> bool {
        matches!(
            self,
            Self::Crawled | Self::Embedding | Self::Embedded | Self::Analyzing | Self::Analyzed
        )
    }

    /// Converts the status to a database string representation
    ///
    /// This is used for storing the status in the SQLite database.
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Crawled => "crawled",
            Self::Embedding => "embedding",
            Self::Embedded => "embedded",
            Self::Analyzing => "analyzing",
            Self::Analyzed => "analyzed",
            Self::Failed => "failed",
        }
    }

    /// Parses a status from a database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "crawled" => Some(Self::Crawled),
            "embedding" => Some(Self::Embedding),
            "embedded" => Some(Self::Embedded),
            "analyzing" => Some(Self::Analyzing),
            "analyzed" => Some(Self::Analyzed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns all possible statuses
    pub fn all_statuses() -> Vec<Self> {
        vec![
            Self::Pending,
            Self::Crawled,
            Self::Embedding,
            Self::Embedded,
            Self::Analyzing,
            Self::Analyzed,
            Self::Failed,
        ]
    }
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

/// Normalized status reported to external callers
///
/// The internal state machine evolves (embedding and analysis sub-states),
/// but the external contract stays stable: everything that carries crawled
/// content short of a finished embedding reads as `Crawled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportedStatus {
    Pending,
    Crawled,
    Embedded,
    Failed,
}

impl From<ResourceStatus> for ReportedStatus {
    fn from(status: ResourceStatus) -> Self {
        match status {
            ResourceStatus::Pending => Self::Pending,
            ResourceStatus::Crawled
            | ResourceStatus::Embedding
            | ResourceStatus::Analyzing
            | ResourceStatus::Analyzed => Self::Crawled,
            ResourceStatus::Embedded => Self::Embedded,
            ResourceStatus::Failed => Self::Failed,
        }
    }
}

impl ReportedStatus {
    /// Returns the wire representation of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Crawled => "CRAWLED",
            Self::Embedded => "EMBEDDED",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for ReportedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
