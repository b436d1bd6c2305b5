//! Analysis service over stored resources

use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::stages::{run_stages, AnalysisState};
use super::{AnalysisError, TextAgent};
use crate::store::ResourceStore;

/// Outcome of analyzing one resource
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub resource_id: Uuid,
    pub url: String,
    pub rewritten_query: String,
    pub summary: String,
}

/// Runs the analysis stages over a crawled resource and persists the result
pub struct AnalysisService {
    store: Arc<dyn ResourceStore>,
    agent: Arc<dyn TextAgent>,
}

impl AnalysisService {
    pub fn new(store: Arc<dyn ResourceStore>, agent: Arc<dyn TextAgent>) -> Self {
        Self { store, agent }
    }

    /// Analyzes a resource's crawled content against a user query
    ///
    /// The resource moves through analyzing to analyzed, with the produced
    /// summary stored on it. Resources without crawled content cannot be
    /// analyzed.
    pub async fn analyze(
        &self,
        resource_id: Uuid,
        user_id: &str,
        user_query: &str,
    ) -> Result<AnalysisReport, AnalysisError> {
        let found = self
            .store
            .find_by_id_and_user(resource_id, user_id)
            .await?;
        let mut resource = match found {
            Some(resource) => resource,
            None => return Err(AnalysisError::ResourceNotFound(resource_id)),
        };
        let content = match resource.content_markdown() {
            Some(content) => content.to_string(),
            None => return Err(AnalysisError::ContentMissing(resource_id)),
        };

        let before = resource.status();
        resource.mark_analyzing()?;
        self.store.update(&resource, before).await?;

        let state = AnalysisState::new(
            user_query.to_string(),
            resource.original_url().to_string(),
            content,
        );
        let state = run_stages(self.agent.as_ref(), state).await;

        let rewritten_query = state
            .rewritten_query
            .unwrap_or_else(|| user_query.to_string());
        let summary = state.summary.unwrap_or_default();

        let before = resource.status();
        resource.mark_analyzed(summary.clone())?;
        self.store.update(&resource, before).await?;

        info!(
            "Analyzed resource {} ({})",
            resource_id,
            resource.original_url()
        );

        Ok(AnalysisReport {
            resource_id,
            url: resource.original_url().to_string(),
            rewritten_query,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AgentError;
    use crate::resource::{Resource, ResourceStatus};
    use crate::store::SqliteStore;
    use async_trait::async_trait;

    struct ScriptedAgent;

    #[async_trait]
    impl TextAgent for ScriptedAgent {
        async fn complete(&self, prompt: &str) -> Result<String, AgentError> {
            if prompt.starts_with("Rewrite") {
                Ok("rewritten".to_string())
            } else {
                Ok("summary".to_string())
            }
        }
    }

    struct FailingAgent;

    #[async_trait]
    impl TextAgent for FailingAgent {
        async fn complete(&self, _prompt: &str) -> Result<String, AgentError> {
            Err(AgentError("model unavailable".to_string()))
        }
    }

    fn row_with_status(status: ResourceStatus) -> Resource {
        let content = match status {
            ResourceStatus::Pending => None,
            _ => Some("# Article body".to_string()),
        };
        Resource::rehydrate(
            Uuid::new_v4(),
            "user-1".to_string(),
            "https://example.com/article".to_string(),
            Some("Article".to_string()),
            content,
            None,
            status,
        )
    }

    async fn service_with(row: &Resource) -> (AnalysisService, Arc<SqliteStore>) {
        let store = Arc::new(SqliteStore::new_in_memory().unwrap());
        store.insert(row).await.unwrap();
        (
            AnalysisService::new(store.clone(), Arc::new(ScriptedAgent)),
            store,
        )
    }

    #[tokio::test]
    async fn test_analyze_crawled_resource() {
        let row = row_with_status(ResourceStatus::Crawled);
        let (service, store) = service_with(&row).await;

        let report = service
            .analyze(row.id(), "user-1", "what is this about")
            .await
            .unwrap();
        assert_eq!(report.rewritten_query, "rewritten");
        assert_eq!(report.summary, "summary");

        let found = store
            .find_by_id_and_user(row.id(), "user-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.status(), ResourceStatus::Analyzed);
        assert_eq!(found.ai_summary(), Some("summary"));
    }

    #[tokio::test]
    async fn test_analyze_embedded_resource() {
        let row = row_with_status(ResourceStatus::Embedded);
        let (service, store) = service_with(&row).await;

        service
            .analyze(row.id(), "user-1", "query")
            .await
            .unwrap();

        let found = store
            .find_by_id_and_user(row.id(), "user-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.status(), ResourceStatus::Analyzed);
    }

    #[tokio::test]
    async fn test_analyze_missing_resource() {
        let store = Arc::new(SqliteStore::new_in_memory().unwrap());
        let service = AnalysisService::new(store, Arc::new(ScriptedAgent));

        let err = service
            .analyze(Uuid::new_v4(), "user-1", "query")
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::ResourceNotFound(_)));
    }

    #[tokio::test]
    async fn test_analyze_pending_resource_has_no_content() {
        let row = row_with_status(ResourceStatus::Pending);
        let (service, _store) = service_with(&row).await;

        let err = service
            .analyze(row.id(), "user-1", "query")
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::ContentMissing(_)));
    }

    #[tokio::test]
    async fn test_analyze_rejects_mid_embedding_resource() {
        let row = row_with_status(ResourceStatus::Embedding);
        let (service, store) = service_with(&row).await;

        let err = service
            .analyze(row.id(), "user-1", "query")
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Transition(_)));

        let found = store
            .find_by_id_and_user(row.id(), "user-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.status(), ResourceStatus::Embedding);
    }

    #[tokio::test]
    async fn test_analyze_survives_agent_failure() {
        let row = row_with_status(ResourceStatus::Crawled);
        let store = Arc::new(SqliteStore::new_in_memory().unwrap());
        store.insert(&row).await.unwrap();
        let service = AnalysisService::new(store.clone(), Arc::new(FailingAgent));

        let report = service
            .analyze(row.id(), "user-1", "original query")
            .await
            .unwrap();
        assert_eq!(report.rewritten_query, "original query");
        assert_eq!(report.summary, "# Article body");

        let found = store
            .find_by_id_and_user(row.id(), "user-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.status(), ResourceStatus::Analyzed);
    }
}
