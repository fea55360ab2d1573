//! Core structured extraction

use crate::config::{ConversionMode, ExtractorConfig};
use crate::error::ExtractorError;
use crate::gateway::CombinedContext;
use crate::parser::parse_record;
use crate::prompt::PromptBuilder;
use crate::schema::schema_text;
use finsight_currency::{should_convert, CurrencyConverter};
use finsight_domain::traits::LlmProvider;
use finsight_domain::{ExtractedRecord, ExtractionStatus, TaskDefinition};
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, info};

/// Answers one task from retrieved context with a single structured call
pub struct StructuredExtractor<L: LlmProvider> {
    llm: Arc<L>,
    converter: Arc<CurrencyConverter>,
    config: ExtractorConfig,
}

impl<L: LlmProvider> StructuredExtractor<L> {
    /// Create a new extractor
    pub fn new(llm: Arc<L>, converter: Arc<CurrencyConverter>, config: ExtractorConfig) -> Self {
        Self {
            llm,
            converter,
            config,
        }
    }

    /// The active configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract the record for `task` from `context`
    ///
    /// The record variant is fixed by `task.kind`. No retries.
    pub async fn extract(
        &self,
        task: &TaskDefinition,
        question: &str,
        context: &CombinedContext,
    ) -> Result<ExtractedRecord, ExtractorError> {
        if context.is_empty() {
            return Err(ExtractorError::EmptyContext);
        }

        let rendered = context.render_bounded(self.config.max_context_chars);
        let prompt = PromptBuilder::new(&task.label, task.kind, question, &rendered)
            .with_mode(self.config.conversion_mode)
            .build();
        let schema = schema_text(task.kind);

        debug!("Prompt length: {} chars", prompt.len());

        let response = timeout(
            self.config.extraction_timeout(),
            self.llm.generate_structured(&prompt, &schema),
        )
        .await
        .map_err(|_| ExtractorError::Timeout {
            stage: "extraction",
            secs: self.config.extraction_timeout_secs,
        })?
        .map_err(|e| ExtractorError::Llm(e.to_string()))?;

        debug!("LLM response length: {} chars", response.len());

        let record = parse_record(task.kind, &response)?;
        Ok(self.normalize(task, record).await)
    }

    /// Apply unit defaults and, in Convert mode, currency conversion
    pub async fn normalize(&self, task: &TaskDefinition, mut record: ExtractedRecord) -> ExtractedRecord {
        let mode = self.config.conversion_mode;
        let Some(monetary) = record.as_monetary_mut() else {
            return record;
        };
        if monetary.status != ExtractionStatus::Found {
            return record;
        }

        if monetary.unit.is_none() {
            monetary.unit = task.default_unit.clone();
        }

        if mode != ConversionMode::Convert {
            return record;
        }
        let (Some(value), Some(unit), Some(target)) =
            (monetary.value, monetary.unit.clone(), task.target_unit.as_deref())
        else {
            return record;
        };
        if !should_convert(&unit, target) {
            return record;
        }

        let conversion = self.converter.convert_detailed(value, &unit, target).await;
        if conversion.unit == unit {
            debug!(unit = %unit, target, "No conversion rule applies");
            return record;
        }

        let note = conversion.note(value, &unit);
        info!(task = %task.label, "{}", note);
        monetary.converted_value = Some(conversion.value);
        monetary.converted_unit = Some(conversion.unit);
        monetary.conversion_note = Some(note);
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finsight_currency::FixedRateSource;
    use finsight_domain::{MonetaryRecord, TaskKind};
    use finsight_llm::MockProvider;

    fn extractor(mode: ConversionMode) -> StructuredExtractor<MockProvider> {
        let config = ExtractorConfig {
            conversion_mode: mode,
            ..ExtractorConfig::default()
        };
        StructuredExtractor::new(
            Arc::new(MockProvider::default()),
            Arc::new(CurrencyConverter::new(Arc::new(FixedRateSource::new(0.012)))),
            config,
        )
    }

    fn revenue_task() -> TaskDefinition {
        TaskDefinition::new("Consolidated Revenue (USD Billion)", TaskKind::Revenue, "")
            .with_target_unit("USD Billion")
    }

    fn found(value: f64, unit: Option<&str>) -> ExtractedRecord {
        ExtractedRecord::Revenue(MonetaryRecord::found(value, unit.map(str::to_string), Some(12)))
    }

    #[tokio::test]
    async fn test_convert_mode_fills_converted_fields() {
        let record = extractor(ConversionMode::Convert)
            .normalize(&revenue_task(), found(255_324.0, Some("INR Crores")))
            .await;

        let ExtractedRecord::Revenue(r) = record else { panic!("kind changed") };
        assert_eq!(r.value, Some(255_324.0));
        assert_eq!(r.unit.as_deref(), Some("INR Crores"));
        assert_eq!(r.converted_value, Some(30.64));
        assert_eq!(r.converted_unit.as_deref(), Some("USD Billion"));
        assert_eq!(
            r.conversion_note.as_deref(),
            Some("Converted from 255324 INR Crores to 30.64 USD Billion at 1 INR = 0.012 USD")
        );
    }

    #[tokio::test]
    async fn test_strict_mode_never_converts() {
        let record = extractor(ConversionMode::Strict)
            .normalize(&revenue_task(), found(255_324.0, Some("INR Crores")))
            .await;
        assert_eq!(record, found(255_324.0, Some("INR Crores")));
    }

    #[tokio::test]
    async fn test_matching_unit_is_left_alone() {
        let record = extractor(ConversionMode::Convert)
            .normalize(&revenue_task(), found(30.2, Some("USD Billion")))
            .await;
        assert_eq!(record, found(30.2, Some("USD Billion")));
    }

    #[tokio::test]
    async fn test_default_unit_fill_in() {
        let task = TaskDefinition::new("Diluted EPS", TaskKind::Eps, "").with_default_unit("INR");
        let record = ExtractedRecord::Eps(MonetaryRecord::found(134.19, None, Some(5)));

        let ExtractedRecord::Eps(r) = extractor(ConversionMode::Convert).normalize(&task, record).await else {
            panic!("kind changed")
        };
        assert_eq!(r.unit.as_deref(), Some("INR"));
        assert!(r.converted_value.is_none());
    }

    #[tokio::test]
    async fn test_not_found_untouched() {
        let task = revenue_task();
        let record = extractor(ConversionMode::Convert)
            .normalize(&task, ExtractedRecord::not_found(TaskKind::Revenue))
            .await;
        assert_eq!(record, ExtractedRecord::not_found(TaskKind::Revenue));
    }

    #[tokio::test]
    async fn test_empty_context_is_rejected() {
        let result = extractor(ConversionMode::Convert)
            .extract(&revenue_task(), "q", &CombinedContext::default())
            .await;
        assert!(matches!(result, Err(ExtractorError::EmptyContext)));
    }
}
