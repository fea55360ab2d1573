//! Result aggregate - the report document assembled across a run

use crate::record::{ExtractedRecord, MonetaryRecord, UtilizationRecord};
use serde::{Deserialize, Serialize};

/// One segment contribution, flattened with its source page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentContribution {
    /// Segment name
    pub segment_name: String,

    /// Share of revenue in percent
    pub percentage_contribution: f64,

    /// Page the breakdown was read from
    pub source_page: Option<u32>,
}

/// One management risk, flattened with its source page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyRisk {
    /// Concise summary of the risk
    pub risk_summary: String,

    /// Page the risk was read from
    pub source_page: Option<u32>,
}

/// Accumulating output of a run
///
/// Owned by exactly one run and never rolled back: a later task failing
/// leaves earlier slots as they were. Scalar slots take the last FOUND
/// record (last write wins); list slots append every element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultAggregate {
    /// Consolidated revenue
    pub consolidated_revenue: Option<MonetaryRecord>,

    /// Consolidated net income
    pub consolidated_net_income: Option<MonetaryRecord>,

    /// Diluted EPS
    pub diluted_eps: Option<MonetaryRecord>,

    /// Segment contributions across every segment task
    #[serde(default)]
    pub top_segment_contributions: Vec<SegmentContribution>,

    /// Employee utilization
    pub employee_utilization: Option<UtilizationRecord>,

    /// Key risks across every risk task
    #[serde(default)]
    pub key_management_risks: Vec<KeyRisk>,
}

impl ResultAggregate {
    /// Create an empty aggregate
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a record into its slot
    ///
    /// NOT_FOUND records leave the aggregate untouched. Returns whether the
    /// record was merged.
    pub fn merge(&mut self, record: ExtractedRecord) -> bool {
        if !record.is_found() {
            return false;
        }

        match record {
            ExtractedRecord::Revenue(r) => self.consolidated_revenue = Some(r),
            ExtractedRecord::NetIncome(r) => self.consolidated_net_income = Some(r),
            ExtractedRecord::Eps(r) => self.diluted_eps = Some(r),
            ExtractedRecord::Utilization(r) => self.employee_utilization = Some(r),
            ExtractedRecord::SegmentContribution(r) => {
                let page = r.source_page;
                self.top_segment_contributions
                    .extend(r.segments.into_iter().map(|s| SegmentContribution {
                        segment_name: s.segment_name,
                        percentage_contribution: s.percentage_contribution,
                        source_page: page,
                    }));
            }
            ExtractedRecord::KeyRisks(r) => {
                let page = r.source_page;
                self.key_management_risks
                    .extend(r.risks.into_iter().map(|risk| KeyRisk {
                        risk_summary: risk.risk_summary,
                        source_page: page,
                    }));
            }
        }
        true
    }

    /// Number of populated slots
    pub fn found_count(&self) -> usize {
        [
            self.consolidated_revenue.is_some(),
            self.consolidated_net_income.is_some(),
            self.diluted_eps.is_some(),
            !self.top_segment_contributions.is_empty(),
            self.employee_utilization.is_some(),
            !self.key_management_risks.is_empty(),
        ]
        .iter()
        .filter(|populated| **populated)
        .count()
    }

    /// Whether nothing has been merged yet
    pub fn is_empty(&self) -> bool {
        self.found_count() == 0
    }
}
