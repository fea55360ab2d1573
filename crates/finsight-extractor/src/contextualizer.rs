//! Rewrites task labels into detailed retrieval questions

use crate::error::ExtractorError;
use crate::prompt::contextualizer_prompt;
use finsight_domain::traits::LlmProvider;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// Turns a short task label into a self-contained question
pub struct Contextualizer<L: LlmProvider> {
    llm: Arc<L>,
    timeout: Duration,
}

impl<L: LlmProvider> Contextualizer<L> {
    /// Create a contextualizer bounded by `timeout` per call
    pub fn new(llm: Arc<L>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    /// One free-text call; the reply is trimmed and must not be empty
    pub async fn contextualize(&self, task_label: &str) -> Result<String, ExtractorError> {
        let prompt = contextualizer_prompt(task_label);

        let reply = timeout(self.timeout, self.llm.generate(&prompt))
            .await
            .map_err(|_| ExtractorError::Timeout {
                stage: "contextualizer",
                secs: self.timeout.as_secs(),
            })?
            .map_err(|e| ExtractorError::Llm(e.to_string()))?;

        let question = reply.trim();
        if question.is_empty() {
            return Err(ExtractorError::InvalidFormat(
                "contextualizer returned an empty question".to_string(),
            ));
        }

        debug!(task = task_label, question_len = question.len(), "Contextualized task");
        Ok(question.to_string())
    }
}
