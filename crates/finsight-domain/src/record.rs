//! Extracted records - the typed result of one task
//!
//! A record is either `FOUND`, with its primary value present, or
//! `NOT_FOUND`, with every value field absent. The constructors below are
//! the supported way to build records; [`ExtractedRecord::validate`]
//! re-checks the invariant for records that arrive from elsewhere.

use crate::task::TaskKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Whether the requested data point was located in the retrieved context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtractionStatus {
    /// Data point located
    Found,
    /// Data point absent from the context (or present only in a rejected unit)
    NotFound,
}

impl ExtractionStatus {
    /// Get the status as its wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionStatus::Found => "FOUND",
            ExtractionStatus::NotFound => "NOT_FOUND",
        }
    }
}

impl fmt::Display for ExtractionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Violations of the FOUND / NOT_FOUND invariant
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    /// A FOUND record is missing its primary value
    #[error("{0} record is FOUND but has no primary value")]
    MissingPrimaryValue(TaskKind),

    /// A NOT_FOUND record carries values
    #[error("{0} record is NOT_FOUND but carries values")]
    UnexpectedValues(TaskKind),

    /// A value is outside its valid range
    #[error("{kind} record has invalid value: {reason}")]
    InvalidValue {
        /// Kind of the offending record
        kind: TaskKind,
        /// What is wrong with it
        reason: String,
    },
}

/// A monetary figure: revenue, net income or EPS
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonetaryRecord {
    /// Extraction status
    pub status: ExtractionStatus,

    /// Value as written in the report
    pub value: Option<f64>,

    /// Currency and scale as written, e.g. "INR Crores"
    pub unit: Option<String>,

    /// Page the value was read from
    pub source_page: Option<u32>,

    /// Short explanation of how the value was located
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,

    /// Value after currency normalization
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converted_value: Option<f64>,

    /// Unit after currency normalization, e.g. "USD Billion"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converted_unit: Option<String>,

    /// Human-readable description of the conversion that was applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion_note: Option<String>,
}

impl MonetaryRecord {
    /// A located monetary value
    pub fn found(value: f64, unit: Option<String>, source_page: Option<u32>) -> Self {
        Self {
            status: ExtractionStatus::Found,
            value: Some(value),
            unit,
            source_page,
            reasoning: None,
            converted_value: None,
            converted_unit: None,
            conversion_note: None,
        }
    }

    /// A value that could not be located
    pub fn not_found() -> Self {
        Self {
            status: ExtractionStatus::NotFound,
            value: None,
            unit: None,
            source_page: None,
            reasoning: None,
            converted_value: None,
            converted_unit: None,
            conversion_note: None,
        }
    }

    /// Attach a normalized value
    pub fn with_conversion(mut self, value: f64, unit: impl Into<String>, note: impl Into<String>) -> Self {
        self.converted_value = Some(value);
        self.converted_unit = Some(unit.into());
        self.conversion_note = Some(note.into());
        self
    }

    fn has_values(&self) -> bool {
        self.value.is_some()
            || self.unit.is_some()
            || self.source_page.is_some()
            || self.converted_value.is_some()
            || self.converted_unit.is_some()
            || self.conversion_note.is_some()
    }
}

/// One segment's share of revenue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentItem {
    /// Segment name, e.g. "BFSI"
    pub segment_name: String,

    /// Share of revenue in percent
    pub percentage_contribution: f64,
}

/// Top operating segments by revenue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRecord {
    /// Extraction status
    pub status: ExtractionStatus,

    /// Segments, most significant first
    pub segments: Vec<SegmentItem>,

    /// Page the breakdown was read from
    pub source_page: Option<u32>,
}

impl SegmentRecord {
    /// A located segment breakdown
    pub fn found(segments: Vec<SegmentItem>, source_page: Option<u32>) -> Self {
        Self {
            status: ExtractionStatus::Found,
            segments,
            source_page,
        }
    }

    /// A breakdown that could not be located
    pub fn not_found() -> Self {
        Self {
            status: ExtractionStatus::NotFound,
            segments: Vec::new(),
            source_page: None,
        }
    }
}

/// Employee utilization rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtilizationRecord {
    /// Extraction status
    pub status: ExtractionStatus,

    /// Utilization in percent
    pub rate_percentage: Option<f64>,

    /// Page the rate was read from
    pub source_page: Option<u32>,

    /// Short explanation of how the value was located
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl UtilizationRecord {
    /// A located utilization rate
    pub fn found(rate_percentage: f64, source_page: Option<u32>) -> Self {
        Self {
            status: ExtractionStatus::Found,
            rate_percentage: Some(rate_percentage),
            source_page,
            reasoning: None,
        }
    }

    /// A rate that could not be located
    pub fn not_found() -> Self {
        Self {
            status: ExtractionStatus::NotFound,
            rate_percentage: None,
            source_page: None,
            reasoning: None,
        }
    }
}

/// One critical risk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskItem {
    /// Concise summary of the risk
    pub risk_summary: String,
}

/// Critical risks cited by management
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRecord {
    /// Extraction status
    pub status: ExtractionStatus,

    /// Risks, most critical first
    pub risks: Vec<RiskItem>,

    /// Page the risks were read from
    pub source_page: Option<u32>,
}

impl RiskRecord {
    /// Located risks
    pub fn found(risks: Vec<RiskItem>, source_page: Option<u32>) -> Self {
        Self {
            status: ExtractionStatus::Found,
            risks,
            source_page,
        }
    }

    /// Risks that could not be located
    pub fn not_found() -> Self {
        Self {
            status: ExtractionStatus::NotFound,
            risks: Vec::new(),
            source_page: None,
        }
    }
}

/// The result of one task, tagged by task kind
///
/// The tag is chosen by the caller when the extractor is invoked, never
/// inferred from the shape of the data afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractedRecord {
    /// Consolidated revenue
    Revenue(MonetaryRecord),
    /// Consolidated net income
    NetIncome(MonetaryRecord),
    /// Diluted EPS
    Eps(MonetaryRecord),
    /// Top segment contributions
    SegmentContribution(SegmentRecord),
    /// Employee utilization
    Utilization(UtilizationRecord),
    /// Key management risks
    KeyRisks(RiskRecord),
}

impl ExtractedRecord {
    /// A value-free record of the given kind
    pub fn not_found(kind: TaskKind) -> Self {
        match kind {
            TaskKind::Revenue => ExtractedRecord::Revenue(MonetaryRecord::not_found()),
            TaskKind::NetIncome => ExtractedRecord::NetIncome(MonetaryRecord::not_found()),
            TaskKind::Eps => ExtractedRecord::Eps(MonetaryRecord::not_found()),
            TaskKind::SegmentContribution => {
                ExtractedRecord::SegmentContribution(SegmentRecord::not_found())
            }
            TaskKind::Utilization => ExtractedRecord::Utilization(UtilizationRecord::not_found()),
            TaskKind::KeyRisks => ExtractedRecord::KeyRisks(RiskRecord::not_found()),
        }
    }

    /// Wrap a monetary record for one of the monetary kinds
    ///
    /// Returns `None` when `kind` is not monetary.
    pub fn monetary(kind: TaskKind, record: MonetaryRecord) -> Option<Self> {
        match kind {
            TaskKind::Revenue => Some(ExtractedRecord::Revenue(record)),
            TaskKind::NetIncome => Some(ExtractedRecord::NetIncome(record)),
            TaskKind::Eps => Some(ExtractedRecord::Eps(record)),
            _ => None,
        }
    }

    /// The task kind this record answers
    pub fn kind(&self) -> TaskKind {
        match self {
            ExtractedRecord::Revenue(_) => TaskKind::Revenue,
            ExtractedRecord::NetIncome(_) => TaskKind::NetIncome,
            ExtractedRecord::Eps(_) => TaskKind::Eps,
            ExtractedRecord::SegmentContribution(_) => TaskKind::SegmentContribution,
            ExtractedRecord::Utilization(_) => TaskKind::Utilization,
            ExtractedRecord::KeyRisks(_) => TaskKind::KeyRisks,
        }
    }

    /// Extraction status
    pub fn status(&self) -> ExtractionStatus {
        match self {
            ExtractedRecord::Revenue(r) | ExtractedRecord::NetIncome(r) | ExtractedRecord::Eps(r) => {
                r.status
            }
            ExtractedRecord::SegmentContribution(r) => r.status,
            ExtractedRecord::Utilization(r) => r.status,
            ExtractedRecord::KeyRisks(r) => r.status,
        }
    }

    /// Whether the data point was located
    pub fn is_found(&self) -> bool {
        self.status() == ExtractionStatus::Found
    }

    /// Mutable access to the monetary payload, if any
    pub fn as_monetary_mut(&mut self) -> Option<&mut MonetaryRecord> {
        match self {
            ExtractedRecord::Revenue(r) | ExtractedRecord::NetIncome(r) | ExtractedRecord::Eps(r) => {
                Some(r)
            }
            _ => None,
        }
    }

    /// Check the FOUND / NOT_FOUND invariant and value ranges
    pub fn validate(&self) -> Result<(), RecordError> {
        let kind = self.kind();
        match self {
            ExtractedRecord::Revenue(r) | ExtractedRecord::NetIncome(r) | ExtractedRecord::Eps(r) => {
                match r.status {
                    ExtractionStatus::Found => {
                        let value = r.value.ok_or(RecordError::MissingPrimaryValue(kind))?;
                        if !value.is_finite() {
                            return Err(RecordError::InvalidValue {
                                kind,
                                reason: format!("value {} is not finite", value),
                            });
                        }
                    }
                    ExtractionStatus::NotFound if r.has_values() => {
                        return Err(RecordError::UnexpectedValues(kind));
                    }
                    ExtractionStatus::NotFound => {}
                }
            }
            ExtractedRecord::SegmentContribution(r) => match r.status {
                ExtractionStatus::Found => {
                    if r.segments.is_empty() {
                        return Err(RecordError::MissingPrimaryValue(kind));
                    }
                    for segment in &r.segments {
                        if segment.segment_name.trim().is_empty() {
                            return Err(RecordError::InvalidValue {
                                kind,
                                reason: "segment_name is empty".to_string(),
                            });
                        }
                        if !(0.0..=100.0).contains(&segment.percentage_contribution) {
                            return Err(RecordError::InvalidValue {
                                kind,
                                reason: format!(
                                    "percentage_contribution {} out of range [0, 100]",
                                    segment.percentage_contribution
                                ),
                            });
                        }
                    }
                }
                ExtractionStatus::NotFound => {
                    if !r.segments.is_empty() || r.source_page.is_some() {
                        return Err(RecordError::UnexpectedValues(kind));
                    }
                }
            },
            ExtractedRecord::Utilization(r) => match r.status {
                ExtractionStatus::Found => {
                    let rate = r.rate_percentage.ok_or(RecordError::MissingPrimaryValue(kind))?;
                    if !(0.0..=100.0).contains(&rate) {
                        return Err(RecordError::InvalidValue {
                            kind,
                            reason: format!("rate_percentage {} out of range [0, 100]", rate),
                        });
                    }
                }
                ExtractionStatus::NotFound => {
                    if r.rate_percentage.is_some() || r.source_page.is_some() {
                        return Err(RecordError::UnexpectedValues(kind));
                    }
                }
            },
            ExtractedRecord::KeyRisks(r) => match r.status {
                ExtractionStatus::Found => {
                    if r.risks.is_empty() {
                        return Err(RecordError::MissingPrimaryValue(kind));
                    }
                    if r.risks.iter().any(|risk| risk.risk_summary.trim().is_empty()) {
                        return Err(RecordError::InvalidValue {
                            kind,
                            reason: "risk_summary is empty".to_string(),
                        });
                    }
                }
                ExtractionStatus::NotFound => {
                    if !r.risks.is_empty() || r.source_page.is_some() {
                        return Err(RecordError::UnexpectedValues(kind));
                    }
                }
            },
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_records_are_valid() {
        for kind in TaskKind::ALL {
            let record = ExtractedRecord::not_found(kind);
            assert_eq!(record.kind(), kind);
            assert_eq!(record.status(), ExtractionStatus::NotFound);
            assert!(record.validate().is_ok(), "{} not_found should validate", kind);
        }
    }

    #[test]
    fn test_found_requires_primary_value() {
        let mut record = MonetaryRecord::found(100.0, Some("INR Crores".into()), Some(12));
        record.value = None;
        let err = ExtractedRecord::Revenue(record).validate().unwrap_err();
        assert_eq!(err, RecordError::MissingPrimaryValue(TaskKind::Revenue));

        let empty = ExtractedRecord::KeyRisks(RiskRecord::found(vec![], Some(3)));
        assert!(matches!(empty.validate(), Err(RecordError::MissingPrimaryValue(_))));
    }

    #[test]
    fn test_not_found_rejects_values() {
        let mut record = MonetaryRecord::not_found();
        record.unit = Some("USD".into());
        let err = ExtractedRecord::NetIncome(record).validate().unwrap_err();
        assert_eq!(err, RecordError::UnexpectedValues(TaskKind::NetIncome));
    }

    #[test]
    fn test_percentage_ranges() {
        let record = ExtractedRecord::Utilization(UtilizationRecord::found(120.0, None));
        assert!(matches!(record.validate(), Err(RecordError::InvalidValue { .. })));

        let record = ExtractedRecord::SegmentContribution(SegmentRecord::found(
            vec![SegmentItem {
                segment_name: "BFSI".into(),
                percentage_contribution: 37.2,
            }],
            Some(44),
        ));
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_monetary_wrapper_rejects_other_kinds() {
        assert!(ExtractedRecord::monetary(TaskKind::Eps, MonetaryRecord::not_found()).is_some());
        assert!(ExtractedRecord::monetary(TaskKind::KeyRisks, MonetaryRecord::not_found()).is_none());
    }

    #[test]
    fn test_serialized_tag_and_status() {
        let record = ExtractedRecord::Eps(MonetaryRecord::found(134.19, Some("INR".into()), Some(7)));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"], "eps");
        assert_eq!(json["status"], "FOUND");
        assert_eq!(json["value"], 134.19);
        assert!(json.get("converted_value").is_none());
    }
}
