//! Retrieval over the text and table corpora of a document

use crate::error::ExtractorError;
use finsight_domain::traits::Retriever;
use finsight_domain::{Corpora, Snippet};
use tracing::debug;

const TEXT_HEADER: &str = "--- TEXTUAL CONTEXT ---";
const TABLE_HEADER: &str = "--- TABULAR CONTEXT ---";

/// Snippets gathered for one question
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombinedContext {
    /// Hits from the text corpus, most similar first
    pub text: Vec<Snippet>,
    /// Hits from the table corpus, most similar first
    pub table: Vec<Snippet>,
}

impl CombinedContext {
    /// Whether no snippet was found in either corpus
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.table.is_empty()
    }

    /// Total number of snippets
    pub fn snippet_count(&self) -> usize {
        self.text.len() + self.table.len()
    }

    /// Render both sections as prompt text
    pub fn render(&self) -> String {
        compose(&format_snippets(&self.text), &format_snippets(&self.table))
    }

    /// Render within `max_chars` characters (0 = no limit)
    ///
    /// Both headers are always kept. Each section gets half of the space
    /// left after the headers, and a section that needs less hands the rest
    /// to the other one.
    pub fn render_bounded(&self, max_chars: usize) -> String {
        let text = format_snippets(&self.text);
        let table = format_snippets(&self.table);
        let text_len = text.chars().count();
        let table_len = table.chars().count();

        let overhead = compose("", "").chars().count();
        if max_chars == 0 || overhead + text_len + table_len <= max_chars {
            return compose(&text, &table);
        }

        let budget = max_chars.saturating_sub(overhead);
        let table_budget = table_len.min(budget - text_len.min(budget / 2));
        let text_budget = text_len.min(budget - table_budget);

        debug!(
            max_chars,
            text_chars = text_len,
            table_chars = table_len,
            text_kept = text_budget,
            table_kept = table_budget,
            "Truncated context"
        );

        let bounded = compose(truncate_chars(&text, text_budget), truncate_chars(&table, table_budget));
        truncate_chars(&bounded, max_chars).to_string()
    }
}

fn compose(text: &str, table: &str) -> String {
    format!("{}\n{}\n\n{}\n{}", TEXT_HEADER, text, TABLE_HEADER, table)
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}

fn format_snippets(snippets: &[Snippet]) -> String {
    snippets
        .iter()
        .map(|snippet| {
            let page = snippet
                .page
                .map_or_else(|| "N/A".to_string(), |p| p.to_string());
            format!("--- Snippet from Page {} ---\n{}", page, snippet.content)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Queries both corpora of a document with the same question
#[derive(Debug, Clone, Copy)]
pub struct RetrievalGateway {
    top_k: usize,
}

impl RetrievalGateway {
    /// Gateway returning up to `top_k` snippets per corpus
    pub fn new(top_k: usize) -> Self {
        Self { top_k: top_k.max(1) }
    }

    /// Snippets requested per corpus
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Gather text and table snippets for `query`
    ///
    /// A missing table corpus contributes nothing. Empty results from both
    /// corpora are an [`ExtractorError::EmptyContext`].
    pub async fn gather<R: Retriever>(
        &self,
        query: &str,
        corpora: &Corpora<R>,
    ) -> Result<CombinedContext, ExtractorError> {
        let text = corpora
            .text
            .retrieve(query, self.top_k)
            .await
            .map_err(|e| ExtractorError::Retrieval(e.to_string()))?;

        let table = match &corpora.table {
            Some(table) => table
                .retrieve(query, self.top_k)
                .await
                .map_err(|e| ExtractorError::Retrieval(e.to_string()))?,
            None => Vec::new(),
        };

        let context = CombinedContext { text, table };
        debug!(
            text_snippets = context.text.len(),
            table_snippets = context.table.len(),
            "Retrieved context"
        );

        if context.is_empty() {
            return Err(ExtractorError::EmptyContext);
        }
        Ok(context)
    }
}

impl Default for RetrievalGateway {
    fn default() -> Self {
        Self::new(5)
    }
}
