//! JSON schemas handed to the model for structured output

use finsight_domain::TaskKind;
use serde_json::{json, Value};

fn status() -> Value {
    json!({ "type": "string", "enum": ["FOUND", "NOT_FOUND"] })
}

fn page() -> Value {
    json!({ "type": ["integer", "null"], "description": "Page number of the most relevant snippet" })
}

/// Output schema for a task kind
pub fn schema_for(kind: TaskKind) -> Value {
    match kind {
        TaskKind::Revenue | TaskKind::NetIncome | TaskKind::Eps => json!({
            "type": "object",
            "properties": {
                "status": status(),
                "value": { "type": ["number", "null"], "description": "The figure exactly as written" },
                "unit": { "type": ["string", "null"], "description": "Currency and scale, e.g. 'INR Crores' or 'USD Billion'" },
                "source_page": page(),
                "reasoning": { "type": ["string", "null"] }
            },
            "required": ["status", "value", "unit", "source_page"]
        }),
        TaskKind::SegmentContribution => json!({
            "type": "object",
            "properties": {
                "status": status(),
                "top_segments": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "segment_name": { "type": "string" },
                            "percentage_contribution": { "type": "number" }
                        },
                        "required": ["segment_name", "percentage_contribution"]
                    }
                },
                "source_page": page()
            },
            "required": ["status", "top_segments", "source_page"]
        }),
        TaskKind::Utilization => json!({
            "type": "object",
            "properties": {
                "status": status(),
                "rate_percentage": { "type": ["number", "null"] },
                "source_page": page(),
                "reasoning": { "type": ["string", "null"] }
            },
            "required": ["status", "rate_percentage", "source_page"]
        }),
        TaskKind::KeyRisks => json!({
            "type": "object",
            "properties": {
                "status": status(),
                "key_risks": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": { "risk_summary": { "type": "string" } },
                        "required": ["risk_summary"]
                    }
                },
                "source_page": page()
            },
            "required": ["status", "key_risks", "source_page"]
        }),
    }
}

/// Schema text as passed to [`LlmProvider::generate_structured`](finsight_domain::traits::LlmProvider::generate_structured)
pub fn schema_text(kind: TaskKind) -> String {
    schema_for(kind).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_requires_status() {
        for kind in TaskKind::ALL {
            let schema = schema_for(kind);
            let required = schema["required"].as_array().unwrap();
            assert!(required.iter().any(|f| f == "status"), "{} lacks status", kind);
        }
    }

    #[test]
    fn test_schema_text_is_json() {
        let text = schema_text(TaskKind::KeyRisks);
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert!(parsed["properties"]["key_risks"].is_object());
    }
}
