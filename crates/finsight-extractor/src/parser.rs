//! Parse structured LLM output into extracted records

use crate::error::ExtractorError;
use finsight_domain::{
    ExtractedRecord, ExtractionStatus, MonetaryRecord, RiskItem, RiskRecord, SegmentItem,
    SegmentRecord, TaskKind, UtilizationRecord,
};
use serde_json::{Map, Value};
use tracing::debug;

type Object = Map<String, Value>;

/// Parse the model's reply to a task of `kind`
///
/// A bare "NOT FOUND" reply and any reply with status NOT_FOUND yield a
/// value-free record. When the status field is missing it is inferred from
/// the presence of the primary value.
pub fn parse_record(kind: TaskKind, response: &str) -> Result<ExtractedRecord, ExtractorError> {
    if is_not_found_reply(response) {
        return Ok(ExtractedRecord::not_found(kind));
    }

    let json_str = extract_json(response)?;
    let json: Value = serde_json::from_str(&json_str)
        .map_err(|e| ExtractorError::InvalidFormat(format!("JSON parse error: {}", e)))?;
    let obj = json
        .as_object()
        .ok_or_else(|| ExtractorError::InvalidFormat("Expected JSON object".to_string()))?;

    let status = match obj.get("status") {
        None | Some(Value::Null) => None,
        Some(value) => Some(parse_status(value)?),
    };
    if status == Some(ExtractionStatus::NotFound) {
        return Ok(ExtractedRecord::not_found(kind));
    }

    let record = match kind {
        TaskKind::Revenue | TaskKind::NetIncome | TaskKind::Eps => {
            let value = number_field(obj, "value")?;
            match value {
                Some(value) => {
                    let mut record = MonetaryRecord::found(
                        value,
                        string_field(obj, "unit"),
                        page_field(obj),
                    );
                    record.reasoning = string_field(obj, "reasoning");
                    ExtractedRecord::monetary(kind, record)
                        .ok_or_else(|| ExtractorError::InvalidFormat(format!("{} is not monetary", kind)))?
                }
                None => return missing_primary(kind, status),
            }
        }
        TaskKind::SegmentContribution => {
            let segments = segment_items(obj)?;
            if segments.is_empty() {
                return missing_primary(kind, status);
            }
            ExtractedRecord::SegmentContribution(SegmentRecord::found(segments, page_field(obj)))
        }
        TaskKind::Utilization => match number_field(obj, "rate_percentage")? {
            Some(rate) => {
                let mut record = UtilizationRecord::found(rate, page_field(obj));
                record.reasoning = string_field(obj, "reasoning");
                ExtractedRecord::Utilization(record)
            }
            None => return missing_primary(kind, status),
        },
        TaskKind::KeyRisks => {
            let risks = risk_items(obj)?;
            if risks.is_empty() {
                return missing_primary(kind, status);
            }
            ExtractedRecord::KeyRisks(RiskRecord::found(risks, page_field(obj)))
        }
    };

    record.validate()?;
    Ok(record)
}

/// No primary value: an explicit FOUND is malformed, a missing status is NOT_FOUND
fn missing_primary(
    kind: TaskKind,
    status: Option<ExtractionStatus>,
) -> Result<ExtractedRecord, ExtractorError> {
    match status {
        Some(ExtractionStatus::Found) => Err(ExtractorError::InvalidFormat(format!(
            "{} reply is FOUND but has no primary value",
            kind
        ))),
        _ => {
            debug!(kind = %kind, "Reply has no status and no value, treating as NOT_FOUND");
            Ok(ExtractedRecord::not_found(kind))
        }
    }
}

fn is_not_found_reply(response: &str) -> bool {
    let normalized: String = response
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '.' || c == '*' || c == '`')
        .to_uppercase()
        .replace('_', " ");
    normalized == "NOT FOUND"
}

fn parse_status(value: &Value) -> Result<ExtractionStatus, ExtractorError> {
    let text = value
        .as_str()
        .ok_or_else(|| ExtractorError::InvalidFormat(format!("status is not a string: {}", value)))?;

    match text.trim().to_uppercase().replace([' ', '-'], "_").as_str() {
        "FOUND" => Ok(ExtractionStatus::Found),
        "NOT_FOUND" => Ok(ExtractionStatus::NotFound),
        other => Err(ExtractorError::InvalidFormat(format!("unknown status '{}'", other))),
    }
}

/// Extract JSON from response, handling markdown code blocks and surrounding prose
///
/// A fenced block is cut at its closing fence first, so prose after the
/// block never reaches the brace match.
fn extract_json(response: &str) -> Result<String, ExtractorError> {
    let trimmed = response.trim();
    let candidate = match fenced_body(trimmed) {
        Some(body) if body.is_empty() => {
            return Err(ExtractorError::InvalidFormat("Empty code block".to_string()));
        }
        Some(body) => body,
        None => trimmed,
    };

    if candidate.starts_with('{') && candidate.ends_with('}') {
        return Ok(candidate.to_string());
    }

    match (candidate.find('{'), candidate.rfind('}')) {
        (Some(start), Some(end)) if start < end => Ok(candidate[start..=end].to_string()),
        _ => Err(ExtractorError::InvalidFormat(format!(
            "No JSON object in response: {}",
            preview(trimmed)
        ))),
    }
}

/// Contents of the first ``` block, without the language tag line
fn fenced_body(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after = &text[open + 3..];
    let body = match after.find('\n') {
        Some(newline) => &after[newline + 1..],
        None => "",
    };
    let body = match body.find("```") {
        Some(close) => &body[..close],
        None => body,
    };
    Some(body.trim())
}

fn preview(text: &str) -> String {
    let mut preview: String = text.chars().take(80).collect();
    if text.chars().count() > 80 {
        preview.push_str("...");
    }
    preview
}

/// Parse a number that may arrive as a string like "2,55,324" or "85.2%"
fn parse_number(value: &Value) -> Result<Option<f64>, ExtractorError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(n.as_f64()),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| !matches!(c, ',' | '%' | '\u{20b9}' | '$') && !c.is_whitespace())
                .collect();
            if cleaned.is_empty() {
                return Ok(None);
            }
            cleaned
                .parse::<f64>()
                .map(Some)
                .map_err(|_| ExtractorError::InvalidFormat(format!("'{}' is not a number", s)))
        }
        other => Err(ExtractorError::InvalidFormat(format!("'{}' is not a number", other))),
    }
}

fn number_field(obj: &Object, key: &str) -> Result<Option<f64>, ExtractorError> {
    obj.get(key).map_or(Ok(None), parse_number)
}

fn string_field(obj: &Object, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Page numbers are lenient: 12, 12.0, "12" and "Page 12" all read as 12
fn page_field(obj: &Object) -> Option<u32> {
    match obj.get("source_page")? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64))
            .and_then(|p| u32::try_from(p).ok()),
        Value::String(s) => {
            let digits: String = s
                .chars()
                .skip_while(|c| !c.is_ascii_digit())
                .take_while(char::is_ascii_digit)
                .collect();
            digits.parse().ok()
        }
        _ => None,
    }
}

fn array_field<'a>(obj: &'a Object, keys: &[&str]) -> Option<&'a Vec<Value>> {
    keys.iter().find_map(|key| obj.get(*key).and_then(Value::as_array))
}

fn segment_items(obj: &Object) -> Result<Vec<SegmentItem>, ExtractorError> {
    let Some(items) = array_field(obj, &["top_segments", "segments"]) else {
        return Ok(Vec::new());
    };

    items
        .iter()
        .map(|item| {
            let item = item
                .as_object()
                .ok_or_else(|| ExtractorError::InvalidFormat("segment is not an object".to_string()))?;
            let segment_name = string_field(item, "segment_name").ok_or_else(|| {
                ExtractorError::InvalidFormat("segment is missing segment_name".to_string())
            })?;
            let percentage_contribution =
                number_field(item, "percentage_contribution")?.ok_or_else(|| {
                    ExtractorError::InvalidFormat(format!(
                        "segment '{}' is missing percentage_contribution",
                        segment_name
                    ))
                })?;
            Ok(SegmentItem {
                segment_name,
                percentage_contribution,
            })
        })
        .collect()
}

fn risk_items(obj: &Object) -> Result<Vec<RiskItem>, ExtractorError> {
    let Some(items) = array_field(obj, &["key_risks", "risks"]) else {
        return Ok(Vec::new());
    };

    items
        .iter()
        .map(|item| {
            let risk_summary = match item {
                Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
                Value::Object(o) => string_field(o, "risk_summary"),
                _ => None,
            };
            risk_summary
                .map(|risk_summary| RiskItem { risk_summary })
                .ok_or_else(|| ExtractorError::InvalidFormat("risk is missing risk_summary".to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monetary(record: ExtractedRecord) -> MonetaryRecord {
        match record {
            ExtractedRecord::Revenue(r) | ExtractedRecord::NetIncome(r) | ExtractedRecord::Eps(r) => r,
            other => panic!("not monetary: {:?}", other),
        }
    }

    #[test]
    fn test_parse_monetary() {
        let response = r#"{"status": "FOUND", "value": 255324, "unit": "INR Crores", "source_page": 12, "reasoning": "Statement of profit and loss"}"#;
        let record = monetary(parse_record(TaskKind::Revenue, response).unwrap());

        assert_eq!(record.status, ExtractionStatus::Found);
        assert_eq!(record.value, Some(255_324.0));
        assert_eq!(record.unit.as_deref(), Some("INR Crores"));
        assert_eq!(record.source_page, Some(12));
        assert!(record.converted_value.is_none());
    }

    #[test]
    fn test_parse_json_with_markdown_wrapper() {
        let response = "```json\n{\"status\": \"FOUND\", \"value\": 134.19, \"unit\": \"INR\", \"source_page\": 5}\n```";
        let record = parse_record(TaskKind::Eps, response).unwrap();
        assert!(matches!(record, ExtractedRecord::Eps(_)));
        assert!(record.is_found());
    }

    #[test]
    fn test_lenient_numbers_and_pages() {
        let response = r#"{"status": "found", "value": "2,55,324", "unit": "INR Crores", "source_page": "Page 12"}"#;
        let record = monetary(parse_record(TaskKind::Revenue, response).unwrap());
        assert_eq!(record.value, Some(255_324.0));
        assert_eq!(record.source_page, Some(12));

        let response = r#"{"status": "FOUND", "rate_percentage": "85.2%", "source_page": 30.0}"#;
        match parse_record(TaskKind::Utilization, response).unwrap() {
            ExtractedRecord::Utilization(r) => {
                assert_eq!(r.rate_percentage, Some(85.2));
                assert_eq!(r.source_page, Some(30));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_bare_not_found_reply() {
        for reply in ["NOT FOUND", "  not found. ", "\"NOT_FOUND\"", "**NOT FOUND**"] {
            let record = parse_record(TaskKind::NetIncome, reply).unwrap();
            assert_eq!(record, ExtractedRecord::not_found(TaskKind::NetIncome), "{}", reply);
        }
    }

    #[test]
    fn test_not_found_is_normalized() {
        let response = r#"{"status": "not found", "value": 12.5, "unit": "USD", "source_page": 3}"#;
        let record = parse_record(TaskKind::Revenue, response).unwrap();
        assert_eq!(record, ExtractedRecord::not_found(TaskKind::Revenue));
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_found_without_value_is_invalid() {
        let response = r#"{"status": "FOUND", "value": null, "unit": "INR Crores"}"#;
        assert!(matches!(
            parse_record(TaskKind::Revenue, response),
            Err(ExtractorError::InvalidFormat(_))
        ));

        let response = r#"{"status": "FOUND", "key_risks": []}"#;
        assert!(parse_record(TaskKind::KeyRisks, response).is_err());
    }

    #[test]
    fn test_missing_status_is_inferred() {
        let record = parse_record(TaskKind::Eps, r#"{"value": 134.19, "source_page": 5}"#).unwrap();
        assert!(record.is_found());

        let record = parse_record(TaskKind::Eps, r#"{"value": null}"#).unwrap();
        assert!(!record.is_found());
    }

    #[test]
    fn test_parse_segments() {
        let response = r#"{
            "status": "FOUND",
            "top_segments": [
                {"segment_name": "BFSI", "percentage_contribution": 37.2},
                {"segment_name": "Retail", "percentage_contribution": "15.6%"}
            ],
            "source_page": 44
        }"#;
        match parse_record(TaskKind::SegmentContribution, response).unwrap() {
            ExtractedRecord::SegmentContribution(r) => {
                assert_eq!(r.segments.len(), 2);
                assert_eq!(r.segments[1].segment_name, "Retail");
                assert_eq!(r.segments[1].percentage_contribution, 15.6);
                assert_eq!(r.source_page, Some(44));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_segment_out_of_range_fails_validation() {
        let response = r#"{"status": "FOUND", "top_segments": [{"segment_name": "BFSI", "percentage_contribution": 137}]}"#;
        assert!(matches!(
            parse_record(TaskKind::SegmentContribution, response),
            Err(ExtractorError::Validation(_))
        ));
    }

    #[test]
    fn test_parse_risks_accepts_strings() {
        let response = r#"{"status": "FOUND", "risks": ["Client concentration", {"risk_summary": "Wage inflation"}], "source_page": 77}"#;
        match parse_record(TaskKind::KeyRisks, response).unwrap() {
            ExtractedRecord::KeyRisks(r) => {
                let summaries: Vec<&str> = r.risks.iter().map(|r| r.risk_summary.as_str()).collect();
                assert_eq!(summaries, vec!["Client concentration", "Wage inflation"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(parse_record(TaskKind::Revenue, "This is not JSON").is_err());
        assert!(parse_record(TaskKind::Revenue, "{\"status\": ").is_err());
        assert!(parse_record(TaskKind::Revenue, "[1, 2]").is_err());
    }

    #[test]
    fn test_unknown_status() {
        let response = r#"{"status": "MAYBE", "value": 1}"#;
        assert!(matches!(
            parse_record(TaskKind::Revenue, response),
            Err(ExtractorError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_extract_json_from_prose() {
        let response = "Here is the answer: {\"status\": \"FOUND\", \"value\": 1} Hope it helps.";
        assert_eq!(extract_json(response).unwrap(), "{\"status\": \"FOUND\", \"value\": 1}");
    }

    #[test]
    fn test_extract_json_from_markdown_without_language() {
        let response = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(extract_json(response).unwrap(), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_fenced_block_followed_by_prose() {
        let response = "Sure, here is the record:\n```json\n{\"status\": \"FOUND\", \"value\": 134.19, \"unit\": \"INR\", \"source_page\": 5}\n```\nThe figure is from the {consolidated} statement.";
        assert_eq!(
            extract_json(response).unwrap(),
            "{\"status\": \"FOUND\", \"value\": 134.19, \"unit\": \"INR\", \"source_page\": 5}"
        );
        let record = parse_record(TaskKind::Eps, response).unwrap();
        assert!(record.is_found());
    }

    #[test]
    fn test_empty_code_block() {
        assert!(matches!(extract_json("```json\n```"), Err(ExtractorError::InvalidFormat(_))));
        assert!(matches!(extract_json("```"), Err(ExtractorError::InvalidFormat(_))));
    }
}
