//! Prepared documents and text chunking
//!
//! A prepared document is the page text and table markdown already pulled out
//! of a report, stored as JSON:
//!
//! ```json
//! {"pages": [{"page": 1, "text": "..."}], "tables": [{"page": 4, "markdown": "| ... |"}]}
//! ```

use finsight_domain::Snippet;
use serde::{Deserialize, Serialize};

/// Default maximum chunk length in characters
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default overlap between consecutive chunks in characters
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Text of one page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageText {
    /// Page number
    pub page: u32,
    /// Extracted prose
    pub text: String,
}

/// One table rendered as markdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageTable {
    /// Page number
    pub page: u32,
    /// Table markdown
    pub markdown: String,
}

/// Pre-extracted content of a report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreparedDocument {
    /// Page text in page order
    #[serde(default)]
    pub pages: Vec<PageText>,
    /// Tables in page order
    #[serde(default)]
    pub tables: Vec<PageTable>,
}

impl PreparedDocument {
    /// Chunk page text into text snippets, each tagged with its page
    pub fn text_snippets(&self, chunker: &TextChunker) -> Vec<Snippet> {
        self.pages
            .iter()
            .flat_map(|page| {
                chunker
                    .chunk(&page.text)
                    .into_iter()
                    .map(move |chunk| Snippet::new(chunk, Some(page.page)))
            })
            .collect()
    }

    /// One snippet per non-empty table
    pub fn table_snippets(&self) -> Vec<Snippet> {
        self.tables
            .iter()
            .filter(|table| !table.markdown.trim().is_empty())
            .map(|table| Snippet::new(table.markdown.trim(), Some(table.page)))
            .collect()
    }
}

/// Splits text into overlapping chunks
///
/// Paragraphs are kept whole where they fit, oversized paragraphs are split
/// at sentence ends, and oversized sentences at character boundaries. Pieces
/// are then packed into chunks of at most `chunk_size` characters, each chunk
/// starting with up to `overlap` characters of trailing pieces from the one
/// before it.
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
}

impl TextChunker {
    /// Create a new text chunker
    ///
    /// The overlap is capped below the chunk size.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size.saturating_sub(1)),
        }
    }

    /// Chunk the given text
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }
        if char_len(text) <= self.chunk_size {
            return vec![text.to_string()];
        }

        self.merge(self.pieces(text))
    }

    /// Break text into pieces no longer than the chunk size
    fn pieces(&self, text: &str) -> Vec<String> {
        let mut pieces = Vec::new();

        for paragraph in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
            if char_len(paragraph) <= self.chunk_size {
                pieces.push(paragraph.to_string());
                continue;
            }

            for sentence in paragraph
                .split_inclusive(['.', '!', '?'])
                .map(str::trim)
                .filter(|s| !s.is_empty())
            {
                if char_len(sentence) <= self.chunk_size {
                    pieces.push(sentence.to_string());
                } else {
                    pieces.extend(split_at_char_limit(sentence, self.chunk_size));
                }
            }
        }

        pieces
    }

    /// Pack pieces into overlapping chunks
    fn merge(&self, pieces: Vec<String>) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: Vec<String> = Vec::new();

        for piece in pieces {
            let piece_len = char_len(&piece);

            if !window.is_empty() && joined_len(&window) + 1 + piece_len > self.chunk_size {
                chunks.push(window.join(" "));

                while !window.is_empty()
                    && (joined_len(&window) > self.overlap
                        || joined_len(&window) + 1 + piece_len > self.chunk_size)
                {
                    window.remove(0);
                }
            }

            window.push(piece);
        }

        if !window.is_empty() {
            chunks.push(window.join(" "));
        }

        chunks
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn joined_len(pieces: &[String]) -> usize {
    let chars: usize = pieces.iter().map(|p| char_len(p)).sum();
    chars + pieces.len().saturating_sub(1)
}

/// Split text into runs of at most `limit` characters
fn split_at_char_limit(text: &str, limit: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(limit)
        .map(|run| run.iter().collect::<String>())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_chunking_needed_for_small_text() {
        let chunker = TextChunker::new(100, 20);
        let chunks = chunker.chunk("  Short text here.  ");
        assert_eq!(chunks, vec!["Short text here."]);
    }

    #[test]
    fn test_empty_text() {
        assert!(TextChunker::default().chunk("   \n\n ").is_empty());
    }

    #[test]
    fn test_chunks_respect_size_limit() {
        let chunker = TextChunker::new(50, 10);
        let text = "First paragraph here.\n\nSecond paragraph here.\n\nThird paragraph here.";
        let chunks = chunker.chunk(text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 50, "chunk too long: {:?}", chunk);
        }
    }

    #[test]
    fn test_consecutive_chunks_overlap() {
        let chunker = TextChunker::new(60, 25);
        let text = "Alpha beta gamma. Delta epsilon zeta. Eta theta iota. Kappa lambda mu. Nu xi omicron.";
        let chunks = chunker.chunk(text);

        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let first_sentence_of_next = pair[1].split(". ").next().unwrap();
            assert!(
                pair[0].contains(first_sentence_of_next),
                "{:?} does not overlap {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_very_long_single_sentence() {
        let chunker = TextChunker::new(20, 0);
        let text = "a".repeat(100);
        let chunks = chunker.chunk(&text);
        assert_eq!(chunks.len(), 5);
        assert!(chunks.iter().all(|c| c.len() == 20));
    }

    #[test]
    fn test_multibyte_text_is_split_on_char_boundaries() {
        let chunker = TextChunker::new(10, 0);
        let text = "₹".repeat(25);
        let chunks = chunker.chunk(&text);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].chars().count(), 5);
    }

    #[test]
    fn test_prepared_document_snippets() {
        let document: PreparedDocument = serde_json::from_str(
            r#"{
                "pages": [{"page": 3, "text": "Revenue grew."}, {"page": 4, "text": "  "}],
                "tables": [{"page": 9, "markdown": "| Segment | % |"}, {"page": 10, "markdown": ""}]
            }"#,
        )
        .unwrap();

        let text = document.text_snippets(&TextChunker::default());
        assert_eq!(text, vec![Snippet::new("Revenue grew.", Some(3))]);

        let tables = document.table_snippets();
        assert_eq!(tables, vec![Snippet::new("| Segment | % |", Some(9))]);
    }

    #[test]
    fn test_tables_are_optional() {
        let document: PreparedDocument =
            serde_json::from_str(r#"{"pages": [{"page": 1, "text": "x"}]}"#).unwrap();
        assert!(document.tables.is_empty());
    }
}
