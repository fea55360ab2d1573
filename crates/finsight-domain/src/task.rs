//! Task module - extraction goals and the schema each one is bound to

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of data a task extracts
///
/// Each kind fixes the output schema handed to the LLM and the aggregate
/// slot its records merge into:
/// - Scalar kinds (`Revenue`, `NetIncome`, `Eps`, `Utilization`) overwrite their slot
/// - List kinds (`SegmentContribution`, `KeyRisks`) append to theirs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Consolidated revenue (monetary)
    Revenue,

    /// Consolidated net income / profit after tax (monetary)
    NetIncome,

    /// Diluted earnings per share (monetary, per share)
    Eps,

    /// Revenue contribution of the top operating segments (list)
    SegmentContribution,

    /// Employee utilization rate (percentage)
    Utilization,

    /// Critical risks cited by management (list)
    KeyRisks,
}

impl TaskKind {
    /// All kinds, in default catalog order
    pub const ALL: [TaskKind; 6] = [
        TaskKind::Revenue,
        TaskKind::NetIncome,
        TaskKind::Eps,
        TaskKind::SegmentContribution,
        TaskKind::Utilization,
        TaskKind::KeyRisks,
    ];

    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Revenue => "revenue",
            TaskKind::NetIncome => "net_income",
            TaskKind::Eps => "eps",
            TaskKind::SegmentContribution => "segment_contribution",
            TaskKind::Utilization => "utilization",
            TaskKind::KeyRisks => "key_risks",
        }
    }

    /// Parse a kind from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "revenue" => Some(TaskKind::Revenue),
            "net_income" => Some(TaskKind::NetIncome),
            "eps" => Some(TaskKind::Eps),
            "segment_contribution" => Some(TaskKind::SegmentContribution),
            "utilization" => Some(TaskKind::Utilization),
            "key_risks" => Some(TaskKind::KeyRisks),
            _ => None,
        }
    }

    /// Whether records of this kind carry a monetary value
    pub fn is_monetary(&self) -> bool {
        matches!(self, TaskKind::Revenue | TaskKind::NetIncome | TaskKind::Eps)
    }

    /// Whether records of this kind accumulate into a list slot
    pub fn is_list(&self) -> bool {
        matches!(self, TaskKind::SegmentContribution | TaskKind::KeyRisks)
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single extraction goal
///
/// Task definitions are immutable once a catalog is built. The `label` is the
/// lookup key and is also the text the contextualizer rewrites into a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinition {
    /// Exact task label (lookup key)
    pub label: String,

    /// Target schema
    pub kind: TaskKind,

    /// Human-readable description of what the task wants
    #[serde(default)]
    pub description: String,

    /// Unit the task demands, e.g. "USD Billion"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_unit: Option<String>,

    /// Unit to assume when a value is found without one, e.g. "INR" for EPS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_unit: Option<String>,
}

impl TaskDefinition {
    /// Create a task definition without unit constraints
    pub fn new(label: impl Into<String>, kind: TaskKind, description: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind,
            description: description.into(),
            target_unit: None,
            default_unit: None,
        }
    }

    /// Set the unit the task demands
    pub fn with_target_unit(mut self, unit: impl Into<String>) -> Self {
        self.target_unit = Some(unit.into());
        self
    }

    /// Set the unit assumed when the LLM omits one
    pub fn with_default_unit(mut self, unit: impl Into<String>) -> Self {
        self.default_unit = Some(unit.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_string_round_trip() {
        for kind in TaskKind::ALL {
            assert_eq!(TaskKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(TaskKind::parse("REVENUE"), Some(TaskKind::Revenue));
        assert_eq!(TaskKind::parse("dividends"), None);
    }

    #[test]
    fn test_kind_shapes() {
        assert!(TaskKind::Revenue.is_monetary());
        assert!(TaskKind::Eps.is_monetary());
        assert!(!TaskKind::Utilization.is_monetary());
        assert!(TaskKind::KeyRisks.is_list());
        assert!(TaskKind::SegmentContribution.is_list());
        assert!(!TaskKind::NetIncome.is_list());
    }

    #[test]
    fn test_definition_builders() {
        let task = TaskDefinition::new("Consolidated Revenue (USD Billion)", TaskKind::Revenue, "")
            .with_target_unit("USD Billion");
        assert_eq!(task.target_unit.as_deref(), Some("USD Billion"));
        assert!(task.default_unit.is_none());
    }

    #[test]
    fn test_definition_deserializes_with_defaults() {
        let json = r#"{"label": "EPS", "kind": "eps"}"#;
        let task: TaskDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(task.kind, TaskKind::Eps);
        assert!(task.description.is_empty());
        assert!(task.target_unit.is_none());
    }
}
