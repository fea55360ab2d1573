//! Configuration for the Agent

use crate::catalog::TaskCatalog;
use crate::error::AgentError;
use finsight_domain::TaskDefinition;
use serde::{Deserialize, Serialize};

/// Catalog extensions and the run queue
///
/// ```toml
/// queue = ["Consolidated Revenue (USD Billion)"]
///
/// [[tasks]]
/// label = "Standalone Revenue"
/// kind = "revenue"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Labels to run, in order; empty means every catalog task
    pub queue: Vec<String>,

    /// Definitions added to (or replacing entries of) the default catalog
    pub tasks: Vec<TaskDefinition>,
}

impl AgentConfig {
    /// The default catalog extended with `tasks`
    pub fn catalog(&self) -> Result<TaskCatalog, AgentError> {
        TaskCatalog::default_catalog().extend(self.tasks.clone())
    }

    /// The run queue against `catalog`
    ///
    /// Queue labels are not checked against the catalog; unknown ones are
    /// skipped when the run reaches them.
    pub fn queue(&self, catalog: &TaskCatalog) -> Vec<String> {
        if self.queue.is_empty() {
            catalog.labels()
        } else {
            self.queue.clone()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, AgentError> {
        toml::from_str(toml_str).map_err(|e| AgentError::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, AgentError> {
        toml::to_string_pretty(self)
            .map_err(|e| AgentError::Config(format!("Failed to serialize to TOML: {}", e)))
    }
}
