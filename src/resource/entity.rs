//! Resource entity and its guarded state transitions
//!
//! Every transition checks the current status before mutating, so replayed
//! or out-of-order job deliveries are rejected here rather than silently
//! rewriting newer state.

use thiserror::Error;
use uuid::Uuid;

use super::status::ResourceStatus;

/// Errors raised when a transition is attempted from the wrong state
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Invalid state transition: {action} expects {expected}, but resource is {actual}")]
    InvalidStateTransition {
        action: &'static str,
        expected: &'static str,
        actual: ResourceStatus,
    },
}

/// A submitted URL tracked through crawl, embedding, and analysis
///
/// Fields are private so that the status can only change through the
/// guarded transition methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    id: Uuid,
    user_id: String,
    original_url: String,
    title: Option<String>,
    content_markdown: Option<String>,
    ai_summary: Option<String>,
    status: ResourceStatus,
}

impl Resource {
    /// Creates a new pending resource for a submitted URL
    pub fn create(id: Uuid, user_id: String, original_url: String) -> Self {
        Self {
            id,
            user_id,
            original_url,
            title: None,
            content_markdown: None,
            ai_summary: None,
            status: ResourceStatus::Pending,
        }
    }

    /// Reconstructs a resource from stored fields without transition checks
    #[allow(clippy::too_many_arguments)]
    pub fn rehydrate(
        id: Uuid,
        user_id: String,
        original_url: String,
        title: Option<String>,
        content_markdown: Option<String>,
        ai_summary: Option<String>,
        status: ResourceStatus,
    ) -> Self {
        Self {
            id,
            user_id,
            original_url,
            title,
            content_markdown,
            ai_summary,
            status,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn original_url(&self) -> &str {
        &self.original_url
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn content_markdown(&self) -> Option<&str> {
        self.content_markdown.as_deref()
    }

    pub fn ai_summary(&self) -> Option<&str> {
        self.ai_summary.as_deref()
    }

    pub fn status(&self) -> ResourceStatus {
        self.status
    }

    /// Records fetched content and moves the resource to crawled
    ///
    /// Accepted from pending (first delivery) and from crawled (a redelivered
    /// job refreshing the same content). Once the resource has moved further
    /// along the pipeline, a late crawl result is stale and gets rejected.
    pub fn mark_crawled(
        &mut self,
        title: Option<String>,
        content: String,
    ) -> Result<(), TransitionError> {
        match self.status {
            ResourceStatus::Pending | ResourceStatus::Crawled => {
                self.title = title;
                self.content_markdown = Some(content);
                self.status = ResourceStatus::Crawled;
                Ok(())
            }
            actual => Err(TransitionError::InvalidStateTransition {
                action: "mark_crawled",
                expected: "pending or crawled",
                actual,
            }),
        }
    }

    /// Moves the resource into the absorbing failed state
    ///
    /// Failure is reachable from every state, so this never errors.
    pub fn mark_failed(&mut self) {
        self.status = ResourceStatus::Failed;
    }

    /// Starts embedding of the crawled content
    pub fn mark_embedding(&mut self) -> Result<(), TransitionError> {
        match self.status {
            ResourceStatus::Crawled => {
                self.status = ResourceStatus::Embedding;
                Ok(())
            }
            actual => Err(TransitionError::InvalidStateTransition {
                action: "mark_embedding",
                expected: "crawled",
                actual,
            }),
        }
    }

    /// Completes embedding
    pub fn mark_embedded(&mut self) -> Result<(), TransitionError> {
        match self.status {
            ResourceStatus::Embedding => {
                self.status = ResourceStatus::Embedded;
                Ok(())
            }
            actual => Err(TransitionError::InvalidStateTransition {
                action: "mark_embedded",
                expected: "embedding",
                actual,
            }),
        }
    }

    /// Starts analysis of the crawled content
    ///
    /// Analysis branches off once content exists, so both crawled and
    /// embedded resources qualify.
    pub fn mark_analyzing(&mut self) -> Result<(), TransitionError> {
        match self.status {
            ResourceStatus::Crawled | ResourceStatus::Embedded => {
                self.status = ResourceStatus::Analyzing;
                Ok(())
            }
            actual => Err(TransitionError::InvalidStateTransition {
                action: "mark_analyzing",
                expected: "crawled or embedded",
                actual,
            }),
        }
    }

    /// Completes analysis and records the produced summary
    pub fn mark_analyzed(&mut self, summary: String) -> Result<(), TransitionError> {
        match self.status {
            ResourceStatus::Analyzing => {
                self.ai_summary = Some(summary);
                self.status = ResourceStatus::Analyzed;
                Ok(())
            }
            actual => Err(TransitionError::InvalidStateTransition {
                action: "mark_analyzed",
                expected: "analyzing",
                actual,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_resource() -> Resource {
        Resource::create(
            Uuid::new_v4(),
            "user-1".to_string(),
            "https://example.com/article".to_string(),
        )
    }

    fn resource_in_status(status: ResourceStatus) -> Resource {
        Resource::rehydrate(
            Uuid::new_v4(),
            "user-1".to_string(),
            "https://example.com/article".to_string(),
            Some("Title".to_string()),
            Some("# Content".to_string()),
            None,
            status,
        )
    }

    #[test]
    fn test_create_starts_pending() {
        let resource = test_resource();
        assert_eq!(resource.status(), ResourceStatus::Pending);
        assert_eq!(resource.user_id(), "user-1");
        assert_eq!(resource.original_url(), "https://example.com/article");
        assert!(resource.title().is_none());
        assert!(resource.content_markdown().is_none());
        assert!(resource.ai_summary().is_none());
    }

    #[test]
    fn test_mark_crawled_from_pending() {
        let mut resource = test_resource();
        resource
            .mark_crawled(Some("Title".to_string()), "# Body".to_string())
            .unwrap();

        assert_eq!(resource.status(), ResourceStatus::Crawled);
        assert_eq!(resource.title(), Some("Title"));
        assert_eq!(resource.content_markdown(), Some("# Body"));
    }

    #[test]
    fn test_mark_crawled_again_replaces_content() {
        let mut resource = test_resource();
        resource
            .mark_crawled(Some("First".to_string()), "old".to_string())
            .unwrap();
        resource
            .mark_crawled(Some("Second".to_string()), "new".to_string())
            .unwrap();

        assert_eq!(resource.status(), ResourceStatus::Crawled);
        assert_eq!(resource.title(), Some("Second"));
        assert_eq!(resource.content_markdown(), Some("new"));
    }

    #[test]
    fn test_mark_crawled_without_title() {
        let mut resource = test_resource();
        resource.mark_crawled(None, "# Body".to_string()).unwrap();

        assert_eq!(resource.status(), ResourceStatus::Crawled);
        assert!(resource.title().is_none());
    }

    #[test]
    fn test_mark_crawled_rejected_once_advanced() {
        for status in [
            ResourceStatus::Embedding,
            ResourceStatus::Embedded,
            ResourceStatus::Analyzing,
            ResourceStatus::Analyzed,
            ResourceStatus::Failed,
        ] {
            let mut resource = resource_in_status(status);
            let err = resource
                .mark_crawled(None, "late".to_string())
                .unwrap_err();

            assert_eq!(
                err,
                TransitionError::InvalidStateTransition {
                    action: "mark_crawled",
                    expected: "pending or crawled",
                    actual: status,
                }
            );
            // The rejected call must not touch the resource
            assert_eq!(resource.status(), status);
            assert_eq!(resource.content_markdown(), Some("# Content"));
        }
    }

    #[test]
    fn test_mark_failed_from_any_state() {
        for status in ResourceStatus::all_statuses() {
            let mut resource = resource_in_status(status);
            resource.mark_failed();
            assert_eq!(resource.status(), ResourceStatus::Failed);
        }
    }

    #[test]
    fn test_mark_embedding_requires_crawled() {
        let mut resource = resource_in_status(ResourceStatus::Crawled);
        resource.mark_embedding().unwrap();
        assert_eq!(resource.status(), ResourceStatus::Embedding);

        for status in [
            ResourceStatus::Pending,
            ResourceStatus::Embedding,
            ResourceStatus::Embedded,
            ResourceStatus::Analyzing,
            ResourceStatus::Analyzed,
            ResourceStatus::Failed,
        ] {
            let mut resource = resource_in_status(status);
            assert!(resource.mark_embedding().is_err());
            assert_eq!(resource.status(), status);
        }
    }

    #[test]
    fn test_mark_embedded_requires_embedding() {
        let mut resource = resource_in_status(ResourceStatus::Embedding);
        resource.mark_embedded().unwrap();
        assert_eq!(resource.status(), ResourceStatus::Embedded);

        for status in [
            ResourceStatus::Pending,
            ResourceStatus::Crawled,
            ResourceStatus::Embedded,
            ResourceStatus::Analyzing,
            ResourceStatus::Analyzed,
            ResourceStatus::Failed,
        ] {
            let mut resource = resource_in_status(status);
            assert!(resource.mark_embedded().is_err());
            assert_eq!(resource.status(), status);
        }
    }

    #[test]
    fn test_mark_analyzing_from_crawled_or_embedded() {
        let mut resource = resource_in_status(ResourceStatus::Crawled);
        resource.mark_analyzing().unwrap();
        assert_eq!(resource.status(), ResourceStatus::Analyzing);

        let mut resource = resource_in_status(ResourceStatus::Embedded);
        resource.mark_analyzing().unwrap();
        assert_eq!(resource.status(), ResourceStatus::Analyzing);

        for status in [
            ResourceStatus::Pending,
            ResourceStatus::Embedding,
            ResourceStatus::Analyzing,
            ResourceStatus::Analyzed,
            ResourceStatus::Failed,
        ] {
            let mut resource = resource_in_status(status);
            assert!(resource.mark_analyzing().is_err());
            assert_eq!(resource.status(), status);
        }
    }

    #[test]
    fn test_mark_analyzed_requires_analyzing() {
        let mut resource = resource_in_status(ResourceStatus::Analyzing);
        resource.mark_analyzed("summary".to_string()).unwrap();
        assert_eq!(resource.status(), ResourceStatus::Analyzed);
        assert_eq!(resource.ai_summary(), Some("summary"));

        for status in [
            ResourceStatus::Pending,
            ResourceStatus::Crawled,
            ResourceStatus::Embedding,
            ResourceStatus::Embedded,
            ResourceStatus::Analyzed,
            ResourceStatus::Failed,
        ] {
            let mut resource = resource_in_status(status);
            assert!(resource.mark_analyzed("late".to_string()).is_err());
            assert_eq!(resource.status(), status);
            assert!(resource.ai_summary().is_none());
        }
    }

    #[test]
    fn test_full_embedding_path() {
        let mut resource = test_resource();
        resource.mark_crawled(None, "content".to_string()).unwrap();
        resource.mark_embedding().unwrap();
        resource.mark_embedded().unwrap();
        assert_eq!(resource.status(), ResourceStatus::Embedded);
    }

    #[test]
    fn test_analysis_after_embedding() {
        let mut resource = test_resource();
        resource.mark_crawled(None, "content".to_string()).unwrap();
        resource.mark_embedding().unwrap();
        resource.mark_embedded().unwrap();
        resource.mark_analyzing().unwrap();
        resource.mark_analyzed("done".to_string()).unwrap();
        assert_eq!(resource.status(), ResourceStatus::Analyzed);
    }

    #[test]
    fn test_failed_is_absorbing() {
        let mut resource = resource_in_status(ResourceStatus::Failed);

        assert!(resource.mark_crawled(None, "x".to_string()).is_err());
        assert!(resource.mark_embedding().is_err());
        assert!(resource.mark_embedded().is_err());
        assert!(resource.mark_analyzing().is_err());
        assert!(resource.mark_analyzed("x".to_string()).is_err());
        assert_eq!(resource.status(), ResourceStatus::Failed);
    }

    #[test]
    fn test_transition_error_message() {
        let mut resource = resource_in_status(ResourceStatus::Analyzed);
        let err = resource.mark_crawled(None, "x".to_string()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid state transition: mark_crawled expects pending or crawled, but resource is analyzed"
        );
    }
}
