//! Configuration for the Extractor

use crate::error::ExtractorError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What to do when a figure is only reported in a unit other than the one
/// the task asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionMode {
    /// The model must answer NOT_FOUND for wrong-unit figures
    Strict,
    /// The model reports the figure as written and the converter normalizes it
    #[default]
    Convert,
}

/// Configuration for the Extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Unit conversion policy
    pub conversion_mode: ConversionMode,

    /// Snippets retrieved per corpus
    pub top_k: usize,

    /// Maximum time for the question contextualizer call (seconds)
    pub contextualize_timeout_secs: u64,

    /// Maximum time for a single extraction call (seconds)
    pub extraction_timeout_secs: u64,

    /// Upper bound on the rendered context handed to the model (characters, 0 = unlimited)
    pub max_context_chars: usize,
}

impl ExtractorConfig {
    /// Get the contextualizer timeout as a Duration
    pub fn contextualize_timeout(&self) -> Duration {
        Duration::from_secs(self.contextualize_timeout_secs)
    }

    /// Get the extraction timeout as a Duration
    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ExtractorError> {
        if self.top_k == 0 {
            return Err(ExtractorError::Config("top_k must be greater than 0".to_string()));
        }
        if self.contextualize_timeout_secs == 0 {
            return Err(ExtractorError::Config(
                "contextualize_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.extraction_timeout_secs == 0 {
            return Err(ExtractorError::Config(
                "extraction_timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ExtractorConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            conversion_mode: ConversionMode::Convert,
            top_k: 5,
            contextualize_timeout_secs: 30,
            extraction_timeout_secs: 120,
            max_context_chars: 24_000,
        }
    }
}

impl ExtractorConfig {
    /// Aggressive preset: fewer snippets and shorter timeouts for faster runs
    pub fn aggressive() -> Self {
        Self {
            top_k: 3,
            contextualize_timeout_secs: 15,
            extraction_timeout_secs: 60,
            max_context_chars: 12_000,
            ..Self::default()
        }
    }

    /// Lenient preset: more snippets and longer timeouts for better recall
    pub fn lenient() -> Self {
        Self {
            top_k: 8,
            contextualize_timeout_secs: 60,
            extraction_timeout_secs: 300,
            max_context_chars: 0,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ExtractorError> {
        toml::from_str(toml_str)
            .map_err(|e| ExtractorError::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ExtractorError> {
        toml::to_string_pretty(self)
            .map_err(|e| ExtractorError::Config(format!("Failed to serialize to TOML: {}", e)))
    }
}
