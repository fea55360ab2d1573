//! Runs and their trace logs
//!
//! [`RunStatus`] is the persisted status; [`RunPhase`] is the in-memory
//! state machine the orchestrator drives. Both only move forward.

use crate::aggregate::ResultAggregate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Current Unix time in milliseconds
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Current-task text of a freshly created run
pub const INITIAL_TASK: &str = "Initializing...";

/// Current-task text of a run whose queue drained
pub const FINISHED_TASK: &str = "Finished";

/// Monotonic run identifier assigned by the audit store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub i64);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Persisted run status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Queue still being processed
    InProgress,
    /// Queue drained
    Completed,
    /// Aborted by a run-level fault
    Failed,
}

impl RunStatus {
    /// Get the status as its persisted string
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::InProgress => "in_progress",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }

    /// Parse a persisted status string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in_progress" => Some(RunStatus::InProgress),
            "completed" => Some(RunStatus::Completed),
            "failed" => Some(RunStatus::Failed),
            _ => None,
        }
    }

    /// Whether no further status change is allowed
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// In-memory run state machine
///
/// `Created -> Running -> (Completed | Failed)`, plus `Created -> Failed`
/// for faults raised before the task loop starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunPhase {
    /// Run record exists, corpora not yet prepared
    Created,
    /// Task loop executing
    Running,
    /// Queue drained
    Completed,
    /// Run-level fault
    Failed,
}

/// An attempted backwards or sideways phase change
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid run transition {from:?} -> {to:?}")]
pub struct InvalidTransition {
    /// Phase before the attempt
    pub from: RunPhase,
    /// Requested phase
    pub to: RunPhase,
}

impl RunPhase {
    /// Whether the phase is final
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Completed | RunPhase::Failed)
    }

    /// Move to `to` if the transition is allowed
    pub fn transition(self, to: RunPhase) -> Result<RunPhase, InvalidTransition> {
        use RunPhase::*;
        match (self, to) {
            (Created, Running) | (Created, Failed) | (Running, Completed) | (Running, Failed) => {
                Ok(to)
            }
            _ => Err(InvalidTransition { from: self, to }),
        }
    }

    /// Persisted status for this phase
    pub fn status(&self) -> RunStatus {
        match self {
            RunPhase::Created | RunPhase::Running => RunStatus::InProgress,
            RunPhase::Completed => RunStatus::Completed,
            RunPhase::Failed => RunStatus::Failed,
        }
    }
}

/// One end-to-end execution against one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Run identifier
    pub id: RunId,

    /// Document the run extracts from
    pub filename: String,

    /// Persisted status
    pub status: RunStatus,

    /// Free-text description of the current step
    pub current_task: String,

    /// Creation time (Unix millis)
    pub start_time: u64,

    /// Terminal transition time (Unix millis); set iff the status is terminal
    pub end_time: Option<u64>,

    /// Final aggregate; set once at the terminal transition
    pub results: Option<ResultAggregate>,
}

impl RunRecord {
    /// A new in-progress run
    pub fn new(id: RunId, filename: impl Into<String>, start_time: u64) -> Self {
        Self {
            id,
            filename: filename.into(),
            status: RunStatus::InProgress,
            current_task: INITIAL_TASK.to_string(),
            start_time,
            end_time: None,
            results: None,
        }
    }

    /// Whether the run reached a terminal status
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// One append-only audit entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceLogEntry {
    /// Entry identifier (insertion order)
    pub id: i64,

    /// Owning run
    pub run_id: RunId,

    /// Pipeline step that produced the entry, e.g. "Planner"
    pub node_name: String,

    /// Outcome description
    pub message: String,

    /// Append time (Unix millis)
    pub timestamp: u64,
}

/// A run with its full trace log in insertion order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunWithLogs {
    /// The run
    pub run: RunRecord,

    /// Trace entries, oldest first
    pub logs: Vec<TraceLogEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn phase() -> impl Strategy<Value = RunPhase> {
        prop_oneof![
            Just(RunPhase::Created),
            Just(RunPhase::Running),
            Just(RunPhase::Completed),
            Just(RunPhase::Failed),
        ]
    }

    fn rank(phase: RunPhase) -> u8 {
        match phase {
            RunPhase::Created => 0,
            RunPhase::Running => 1,
            RunPhase::Completed | RunPhase::Failed => 2,
        }
    }

    #[test]
    fn test_allowed_transitions() {
        assert_eq!(RunPhase::Created.transition(RunPhase::Running), Ok(RunPhase::Running));
        assert_eq!(RunPhase::Created.transition(RunPhase::Failed), Ok(RunPhase::Failed));
        assert_eq!(RunPhase::Running.transition(RunPhase::Completed), Ok(RunPhase::Completed));
        assert!(RunPhase::Created.transition(RunPhase::Completed).is_err());
        assert!(RunPhase::Completed.transition(RunPhase::Failed).is_err());
    }

    #[test]
    fn test_status_strings() {
        for status in [RunStatus::InProgress, RunStatus::Completed, RunStatus::Failed] {
            assert_eq!(RunStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(
            serde_json::to_string(&RunStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert!(RunStatus::parse("paused").is_none());
    }

    #[test]
    fn test_new_run_defaults() {
        let run = RunRecord::new(RunId(7), "infosys.pdf", 1_000);
        assert_eq!(run.status, RunStatus::InProgress);
        assert_eq!(run.current_task, INITIAL_TASK);
        assert!(run.end_time.is_none());
        assert!(run.results.is_none());
    }

    proptest! {
        #[test]
        fn prop_transitions_only_move_forward(steps in proptest::collection::vec(phase(), 0..12)) {
            let mut current = RunPhase::Created;
            for next in steps {
                match current.transition(next) {
                    Ok(moved) => {
                        prop_assert!(rank(moved) > rank(current));
                        current = moved;
                    }
                    Err(err) => prop_assert_eq!(err.from, current),
                }
            }
            if current.is_terminal() {
                for next in [RunPhase::Created, RunPhase::Running, RunPhase::Completed, RunPhase::Failed] {
                    prop_assert!(current.transition(next).is_err());
                }
            }
        }

        #[test]
        fn prop_terminal_phase_maps_to_terminal_status(p in phase()) {
            prop_assert_eq!(p.is_terminal(), p.status().is_terminal());
        }
    }
}
