//! Configuration file parsing for the server and the CLI.
//!
//! One TOML file carries the bind address, the storage locations and a
//! section per collaborator. Every field has a default, so an empty file is
//! a valid configuration.

use finsight_agent::AgentConfig;
use finsight_extractor::ExtractorConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("Failed to serialize config TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// A section failed validation
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Ollama connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Ollama base URL
    pub endpoint: String,

    /// Model used to rewrite task labels into questions
    pub contextualizer_model: String,

    /// Model used for schema-constrained extraction
    pub extraction_model: String,

    /// Attempts per call on transport errors
    pub max_retries: u32,

    /// HTTP request timeout
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: finsight_llm::ollama::DEFAULT_ENDPOINT.to_string(),
            contextualizer_model: "llama3.1".to_string(),
            extraction_model: "llama3.1".to_string(),
            max_retries: finsight_llm::ollama::DEFAULT_MAX_RETRIES,
            timeout_secs: finsight_llm::ollama::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Exchange-rate source settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencyConfig {
    /// Rate endpoint returning `{"rates": {"USD": ...}}`
    pub endpoint: String,

    /// How long a fetched rate stays valid
    pub cache_ttl_secs: u64,

    /// HTTP request timeout
    pub timeout_secs: u64,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            endpoint: finsight_currency::DEFAULT_RATE_ENDPOINT.to_string(),
            cache_ttl_secs: finsight_currency::DEFAULT_CACHE_TTL_SECS,
            timeout_secs: finsight_currency::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Server configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1")
    pub bind_address: String,

    /// Bind port (e.g., 8000)
    pub bind_port: u16,

    /// SQLite audit database
    pub database_path: PathBuf,

    /// Directory of prepared `<stem>.json` documents
    pub documents_dir: PathBuf,

    /// Directory of built `<stem>_text.json` / `<stem>_tables.json` corpora
    pub corpus_dir: PathBuf,

    /// LLM provider
    pub llm: LlmConfig,

    /// Exchange rates
    pub currency: CurrencyConfig,

    /// Extraction pipeline
    pub extractor: ExtractorConfig,

    /// Task catalog extensions and run queue
    pub agent: AgentConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            bind_port: 8000,
            database_path: PathBuf::from("finsight.db"),
            documents_dir: PathBuf::from("data/documents"),
            corpus_dir: PathBuf::from("data/corpus"),
            llm: LlmConfig::default(),
            currency: CurrencyConfig::default(),
            extractor: ExtractorConfig::default(),
            agent: AgentConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("llm.endpoint must not be empty".to_string()));
        }
        self.extractor
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.agent
            .catalog()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(())
    }

    /// Create a default configuration for testing
    ///
    /// Storage paths live under `root`.
    pub fn default_test_config(root: &Path) -> Self {
        ServerConfig {
            bind_address: "127.0.0.1".to_string(),
            bind_port: 0,
            database_path: root.join("finsight.db"),
            documents_dir: root.join("documents"),
            corpus_dir: root.join("corpus"),
            ..ServerConfig::default()
        }
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }
}
