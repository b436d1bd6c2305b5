//! Analysis stages and the state threaded through them

use tracing::warn;

use super::TextAgent;

/// Longest excerpt used when summarization falls back to raw content
const FALLBACK_SUMMARY_CHARS: usize = 500;

/// Inputs and accumulated outputs flowing through the stages
#[derive(Debug, Clone)]
pub struct AnalysisState {
    pub user_query: String,
    pub url: String,
    pub content: String,
    pub rewritten_query: Option<String>,
    pub summary: Option<String>,
}

impl AnalysisState {
    pub fn new(user_query: String, url: String, content: String) -> Self {
        Self {
            user_query,
            url,
            content,
            rewritten_query: None,
            summary: None,
        }
    }

    fn apply(&mut self, update: StageUpdate) {
        if let Some(rewritten) = update.rewritten_query {
            self.rewritten_query = Some(rewritten);
        }
        if let Some(summary) = update.summary {
            self.summary = Some(summary);
        }
    }
}

/// Fields a stage contributes back to the state
#[derive(Debug, Default)]
struct StageUpdate {
    rewritten_query: Option<String>,
    summary: Option<String>,
}

/// Rewrites the user query for retrieval
///
/// An agent failure keeps the original query rather than aborting.
async fn rewrite_query(agent: &dyn TextAgent, state: &AnalysisState) -> StageUpdate {
    let prompt = format!(
        "Rewrite the following query to better retrieve relevant information. \
         Reply with the rewritten query only.\n\nQuery: {}",
        state.user_query
    );

    let rewritten = match agent.complete(&prompt).await {
        Ok(rewritten) => rewritten,
        Err(e) => {
            warn!("Query rewrite failed, keeping original query: {}", e);
            state.user_query.clone()
        }
    };
    StageUpdate {
        rewritten_query: Some(rewritten),
        ..Default::default()
    }
}

/// Summarizes the crawled content
///
/// An agent failure falls back to a leading excerpt of the content.
async fn summarize(agent: &dyn TextAgent, state: &AnalysisState) -> StageUpdate {
    let prompt = format!(
        "The following is content crawled from {}. Summarize the core information.\n\n{}",
        state.url, state.content
    );

    let summary = match agent.complete(&prompt).await {
        Ok(summary) => summary,
        Err(e) => {
            warn!("Summarization failed, falling back to an excerpt: {}", e);
            state.content.chars().take(FALLBACK_SUMMARY_CHARS).collect()
        }
    };
    StageUpdate {
        summary: Some(summary),
        ..Default::default()
    }
}

/// Runs the analysis stages in order, folding their outputs into the state
pub async fn run_stages(agent: &dyn TextAgent, mut state: AnalysisState) -> AnalysisState {
    let update = rewrite_query(agent, &state).await;
    state.apply(update);

    let update = summarize(agent, &state).await;
    state.apply(update);

    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AgentError;
    use async_trait::async_trait;
    use std::sync::Mutex;

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

    struct RecordingAgent {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextAgent for RecordingAgent {
        async fn complete(&self, prompt: &str) -> Result<String, AgentError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("ok".to_string())
        }
    }

    fn sample_state() -> AnalysisState {
        AnalysisState::new(
            "what is this about".to_string(),
            "https://example.com/article".to_string(),
            "# Article\n\nThe body.".to_string(),
        )
    }

    #[tokio::test]
    async fn test_stages_fill_both_outputs() {
        let state = run_stages(&ScriptedAgent, sample_state()).await;

        assert_eq!(state.rewritten_query.as_deref(), Some("rewritten"));
        assert_eq!(state.summary.as_deref(), Some("summary"));
    }

    #[tokio::test]
    async fn test_rewrite_failure_keeps_original_query() {
        let state = run_stages(&FailingAgent, sample_state()).await;

        assert_eq!(state.rewritten_query.as_deref(), Some("what is this about"));
    }

    #[tokio::test]
    async fn test_summary_failure_excerpts_content() {
        let mut input = sample_state();
        input.content = "y".repeat(800);
        let state = run_stages(&FailingAgent, input).await;

        let summary = state.summary.unwrap();
        assert_eq!(summary.chars().count(), FALLBACK_SUMMARY_CHARS);
        assert!(summary.chars().all(|c| c == 'y'));
    }

    #[tokio::test]
    async fn test_prompts_carry_query_and_content() {
        let agent = RecordingAgent {
            prompts: Mutex::new(Vec::new()),
        };
        run_stages(&agent, sample_state()).await;

        let prompts = agent.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("what is this about"));
        assert!(prompts[1].contains("https://example.com/article"));
        assert!(prompts[1].contains("The body."));
    }
}
