//! Finsight LLM Provider Layer
//!
//! Implementations of the `LlmProvider` trait from `finsight-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Scripted mock for testing
//! - `OllamaProvider`: Local Ollama API integration
//!
//! # Examples
//!
//! ```
//! use finsight_llm::MockProvider;
//! use finsight_domain::traits::LlmProvider;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let provider = MockProvider::new("Hello from LLM!");
//! let result = provider.generate("test prompt").await.unwrap();
//! assert_eq!(result, "Hello from LLM!");
//! # });
//! ```

#![warn(missing_docs)]

pub mod ollama;

use async_trait::async_trait;
use finsight_domain::traits::LlmProvider as LlmProviderTrait;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

pub use ollama::OllamaProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Error(String),
}

#[derive(Debug, Default)]
struct Script {
    text_rules: Vec<(String, Reply)>,
    structured_rules: Vec<(String, Reply)>,
    prompts: Vec<String>,
    call_count: usize,
}

/// Mock LLM provider for deterministic testing
///
/// Replies are scripted by substring: the first rule whose pattern occurs in
/// the prompt wins, otherwise the default response is returned. Free-text
/// and structured calls have separate rule lists. Clones share the script,
/// so a test can keep a clone to inspect calls after handing one away.
///
/// # Examples
///
/// ```
/// use finsight_llm::MockProvider;
/// use finsight_domain::traits::LlmProvider;
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let provider = MockProvider::default();
/// provider.add_response("Revenue", "What was the consolidated revenue?");
/// provider.add_structured_response("Revenue", r#"{"status": "NOT_FOUND"}"#);
///
/// let question = provider.generate("Task: Revenue").await.unwrap();
/// assert_eq!(question, "What was the consolidated revenue?");
/// assert_eq!(provider.call_count(), 1);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    script: Arc<Mutex<Script>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            script: Arc::new(Mutex::new(Script::default())),
        }
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Reply to free-text prompts containing `pattern`
    pub fn add_response(&self, pattern: impl Into<String>, response: impl Into<String>) {
        self.script()
            .text_rules
            .push((pattern.into(), Reply::Text(response.into())));
    }

    /// Fail free-text prompts containing `pattern`
    pub fn add_error(&self, pattern: impl Into<String>) {
        self.script()
            .text_rules
            .push((pattern.into(), Reply::Error("Mock error".to_string())));
    }

    /// Reply to structured prompts containing `pattern`
    pub fn add_structured_response(&self, pattern: impl Into<String>, response: impl Into<String>) {
        self.script()
            .structured_rules
            .push((pattern.into(), Reply::Text(response.into())));
    }

    /// Fail structured prompts containing `pattern`
    pub fn add_structured_error(&self, pattern: impl Into<String>) {
        self.script()
            .structured_rules
            .push((pattern.into(), Reply::Error("Mock structured error".to_string())));
    }

    /// Get the number of times either generate method was called
    pub fn call_count(&self) -> usize {
        self.script().call_count
    }

    /// Reset the call count and recorded prompts
    pub fn reset_call_count(&self) {
        let mut script = self.script();
        script.call_count = 0;
        script.prompts.clear();
    }

    /// Prompts received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.script().prompts.clone()
    }

    fn reply(&self, prompt: &str, structured: bool) -> Result<String, LlmError> {
        let mut script = self.script();
        script.call_count += 1;
        script.prompts.push(prompt.to_string());

        let rules = if structured {
            &script.structured_rules
        } else {
            &script.text_rules
        };

        match rules.iter().find(|(pattern, _)| prompt.contains(pattern.as_str())) {
            Some((_, Reply::Text(response))) => Ok(response.clone()),
            Some((_, Reply::Error(message))) => Err(LlmError::Other(message.clone())),
            None => Ok(self.default_response.clone()),
        }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

#[async_trait]
impl LlmProviderTrait for MockProvider {
    type Error = LlmError;

    async fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        self.reply(prompt, false)
    }

    async fn generate_structured(&self, prompt: &str, _schema: &str) -> Result<String, Self::Error> {
        self.reply(prompt, true)
    }
}
