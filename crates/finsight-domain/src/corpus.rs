//! Corpus types shared by retrieval and extraction

use serde::{Deserialize, Serialize};

/// One retrieved piece of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    /// Snippet text (prose chunk or markdown table)
    pub content: String,

    /// Source page, when known
    #[serde(default)]
    pub page: Option<u32>,
}

impl Snippet {
    /// Create a snippet
    pub fn new(content: impl Into<String>, page: Option<u32>) -> Self {
        Self {
            content: content.into(),
            page,
        }
    }
}

/// The corpora opened for one document
///
/// The text corpus always exists once a document is indexed; the table
/// corpus is optional and its absence is not an error.
#[derive(Debug, Clone)]
pub struct Corpora<R> {
    /// Prose corpus
    pub text: R,

    /// Table corpus, if the document had tables
    pub table: Option<R>,
}

impl<R> Corpora<R> {
    /// Corpora with a text corpus only
    pub fn text_only(text: R) -> Self {
        Self { text, table: None }
    }

    /// Corpora with both modalities
    pub fn with_tables(text: R, table: R) -> Self {
        Self {
            text,
            table: Some(table),
        }
    }
}
