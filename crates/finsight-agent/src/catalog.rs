//! The catalog of extraction tasks

use crate::error::AgentError;
use finsight_domain::{TaskDefinition, TaskKind};
use std::collections::HashSet;

/// The label → definition table consulted by the planner
///
/// Labels are unique and non-empty; catalog order is the default run queue.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskCatalog {
    tasks: Vec<TaskDefinition>,
}

impl TaskCatalog {
    /// Build a catalog from explicit definitions
    pub fn from_tasks(tasks: Vec<TaskDefinition>) -> Result<Self, AgentError> {
        let catalog = Self { tasks };
        catalog.validate()?;
        Ok(catalog)
    }

    /// The six annual-report tasks
    pub fn default_catalog() -> Self {
        Self {
            tasks: vec![
                TaskDefinition::new(
                    "Consolidated Revenue (USD Billion)",
                    TaskKind::Revenue,
                    "Total consolidated revenue from operations for the latest financial year",
                )
                .with_target_unit("USD Billion"),
                TaskDefinition::new(
                    "Consolidated Net Income (Profit After Tax)",
                    TaskKind::NetIncome,
                    "Consolidated profit after tax attributable to the group",
                ),
                TaskDefinition::new(
                    "Diluted Earnings Per Share (EPS in INR)",
                    TaskKind::Eps,
                    "Diluted earnings per equity share",
                )
                .with_default_unit("INR"),
                TaskDefinition::new(
                    "Percentage contribution of the top 3 operating segments (e.g., BFSI, Retail)",
                    TaskKind::SegmentContribution,
                    "Revenue share of the three largest operating segments",
                ),
                TaskDefinition::new(
                    "Employee Utilization Rate (excluding trainees)",
                    TaskKind::Utilization,
                    "Utilization of billable employees, excluding trainees",
                ),
                TaskDefinition::new(
                    "Top 2-3 most critical risks from the Management Discussion & Analysis",
                    TaskKind::KeyRisks,
                    "The most critical risks cited by management",
                ),
            ],
        }
    }

    /// Add definitions; a definition whose label already exists replaces it in place
    pub fn extend(mut self, tasks: Vec<TaskDefinition>) -> Result<Self, AgentError> {
        for task in tasks {
            match self.tasks.iter_mut().find(|t| t.label == task.label) {
                Some(existing) => *existing = task,
                None => self.tasks.push(task),
            }
        }
        self.validate()?;
        Ok(self)
    }

    /// Check that labels are non-empty and unique
    pub fn validate(&self) -> Result<(), AgentError> {
        let mut seen = HashSet::new();
        for task in &self.tasks {
            if task.label.trim().is_empty() {
                return Err(AgentError::Config("task label must not be empty".to_string()));
            }
            if !seen.insert(task.label.as_str()) {
                return Err(AgentError::Config(format!("duplicate task label '{}'", task.label)));
            }
        }
        Ok(())
    }

    /// Look up a definition by exact label
    pub fn get(&self, label: &str) -> Option<&TaskDefinition> {
        self.tasks.iter().find(|t| t.label == label)
    }

    /// Labels in catalog order
    pub fn labels(&self) -> Vec<String> {
        self.tasks.iter().map(|t| t.label.clone()).collect()
    }

    /// All definitions in catalog order
    pub fn tasks(&self) -> &[TaskDefinition] {
        &self.tasks
    }

    /// Number of definitions
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the catalog has no definitions
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl Default for TaskCatalog {
    fn default() -> Self {
        Self::default_catalog()
    }
}
