//! In-memory state of one run

use crate::error::AgentError;
use finsight_domain::{ExtractedRecord, ResultAggregate, RunId, RunPhase, RunStatus};
use serde::Serialize;
use std::collections::VecDeque;

/// How one task ended
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    /// A FOUND record was merged into the aggregate
    Found,
    /// The model reported the data point as absent
    NotFound,
    /// A pipeline stage failed; the message is in the trace log
    Failed(String),
    /// No definition for the label
    Skipped,
}

/// Per-outcome task counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Tasks that produced a FOUND record
    pub found: usize,
    /// Tasks answered with NOT_FOUND
    pub not_found: usize,
    /// Tasks that failed in a pipeline stage
    pub failed: usize,
    /// Labels without a catalog entry
    pub skipped: usize,
}

impl RunStats {
    /// Count one outcome
    pub fn record(&mut self, outcome: &TaskOutcome) {
        match outcome {
            TaskOutcome::Found => self.found += 1,
            TaskOutcome::NotFound => self.not_found += 1,
            TaskOutcome::Failed(_) => self.failed += 1,
            TaskOutcome::Skipped => self.skipped += 1,
        }
    }

    /// Tasks processed so far
    pub fn total(&self) -> usize {
        self.found + self.not_found + self.failed + self.skipped
    }
}

/// Result of a finished run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutcome {
    /// Run id
    pub run_id: RunId,
    /// Terminal status
    pub status: RunStatus,
    /// Everything that was found
    pub aggregate: ResultAggregate,
    /// Task counts
    pub stats: RunStats,
}

/// Working state owned by one executing run
///
/// Only the `RunRecord` and trace entries are persisted; this context lives
/// for the duration of the loop.
#[derive(Debug)]
pub struct RunContext {
    run_id: RunId,
    filename: String,
    queue: VecDeque<String>,
    aggregate: ResultAggregate,
    phase: RunPhase,
    stats: RunStats,
}

impl RunContext {
    /// Context for a created run with `queue` still to process
    pub fn new(run_id: RunId, filename: impl Into<String>, queue: Vec<String>) -> Self {
        Self {
            run_id,
            filename: filename.into(),
            queue: queue.into(),
            aggregate: ResultAggregate::new(),
            phase: RunPhase::Created,
            stats: RunStats::default(),
        }
    }

    /// Run id
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Document name
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Current phase
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Aggregate collected so far
    pub fn aggregate(&self) -> &ResultAggregate {
        &self.aggregate
    }

    /// Task counts so far
    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Labels not yet processed
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// Move the state machine forward
    pub fn advance(&mut self, to: RunPhase) -> Result<(), AgentError> {
        self.phase = self.phase.transition(to)?;
        Ok(())
    }

    /// Pop the next label in queue order
    pub fn next_task(&mut self) -> Option<String> {
        self.queue.pop_front()
    }

    /// Record a task outcome, merging FOUND records
    pub fn complete_task(&mut self, record: Option<ExtractedRecord>, outcome: TaskOutcome) {
        if let Some(record) = record {
            self.aggregate.merge(record);
        }
        self.stats.record(&outcome);
    }

    /// Consume the context into the outcome of a terminal run
    pub fn into_outcome(self) -> RunOutcome {
        RunOutcome {
            run_id: self.run_id,
            status: self.phase.status(),
            aggregate: self.aggregate,
            stats: self.stats,
        }
    }
}

/// One-line description of a FOUND record for the trace log
pub fn summarize(record: &ExtractedRecord) -> String {
    let page = |p: Option<u32>| p.map_or_else(String::new, |p| format!(" (page {})", p));

    match record {
        ExtractedRecord::Revenue(r) | ExtractedRecord::NetIncome(r) | ExtractedRecord::Eps(r) => {
            let mut text = match (r.value, r.unit.as_deref()) {
                (Some(value), Some(unit)) => format!("{} {}", value, unit),
                (Some(value), None) => value.to_string(),
                (None, _) => "no value".to_string(),
            };
            if let (Some(value), Some(unit)) = (r.converted_value, r.converted_unit.as_deref()) {
                text.push_str(&format!(" = {} {}", value, unit));
            }
            format!("{}{}", text, page(r.source_page))
        }
        ExtractedRecord::SegmentContribution(r) => {
            let segments: Vec<String> = r
                .segments
                .iter()
                .map(|s| format!("{} {}%", s.segment_name, s.percentage_contribution))
                .collect();
            format!("{}{}", segments.join(", "), page(r.source_page))
        }
        ExtractedRecord::Utilization(r) => match r.rate_percentage {
            Some(rate) => format!("{}%{}", rate, page(r.source_page)),
            None => "no value".to_string(),
        },
        ExtractedRecord::KeyRisks(r) => format!("{} risks{}", r.risks.len(), page(r.source_page)),
    }
}
