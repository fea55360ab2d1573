//! Embedding Model for Text Vectorization
//!
//! Text-to-vector conversion for snippet retrieval. The bundled model is a
//! hashing bag-of-words: every token is hashed into one of `dimension`
//! buckets and the vector is normalized to unit length, so cosine similarity
//! rewards shared vocabulary. No model files or network access are needed.
//!
//! # Examples
//!
//! ```rust
//! use finsight_store::embedding::{cosine_similarity, EmbeddingModel, HashingEmbeddingModel};
//!
//! let model = HashingEmbeddingModel::new(384);
//! let revenue = model.embed("Revenue from operations rose 6.8%").unwrap();
//! let query = model.embed("What was the revenue from operations?").unwrap();
//! let risks = model.embed("Principal risks and uncertainties").unwrap();
//! assert!(cosine_similarity(&revenue, &query) > cosine_similarity(&risks, &query));
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// Default embedding dimension
pub const DEFAULT_DIMENSION: usize = 384;

/// Words too common to carry retrieval signal
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "in", "is", "it", "of", "on",
    "or", "that", "the", "this", "to", "was", "were", "what", "which", "with",
];

/// Errors that can occur during embedding generation
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Invalid input text
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Trait for embedding models
pub trait EmbeddingModel: Send + Sync {
    /// Generate an embedding vector for the given text
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Get the dimension of embeddings produced by this model
    fn dimension(&self) -> usize;
}

/// Hashing bag-of-words embedding model
///
/// - **Deterministic**: Same text always produces same embedding
/// - **Normalized**: All vectors have unit length
/// - **Lexical**: Texts sharing words point in similar directions
///
/// Term counts are damped (`1 + ln tf`) so a repeated word does not swamp
/// the rest of the snippet.
#[derive(Debug, Clone, Copy)]
pub struct HashingEmbeddingModel {
    dimension: usize,
}

impl HashingEmbeddingModel {
    /// Create a model producing `dimension`-sized vectors
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn bucket(&self, token: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        (hasher.finish() % self.dimension as u64) as usize
    }

    fn tokens(text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
            .collect()
    }
}

impl Default for HashingEmbeddingModel {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

impl EmbeddingModel for HashingEmbeddingModel {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(EmbeddingError::InvalidInput(
                "Empty text cannot be embedded".to_string(),
            ));
        }

        let all_tokens = Self::tokens(text);
        let content: Vec<&String> = all_tokens
            .iter()
            .filter(|t| !STOPWORDS.contains(&t.as_str()))
            .collect();

        let mut counts = vec![0u32; self.dimension];
        if !content.is_empty() {
            for token in content {
                counts[self.bucket(token)] += 1;
            }
        } else if !all_tokens.is_empty() {
            for token in &all_tokens {
                counts[self.bucket(token)] += 1;
            }
        } else {
            // Symbols only: one bucket for the whole text
            counts[self.bucket(text)] += 1;
        }

        let mut embedding: Vec<f32> = counts
            .into_iter()
            .map(|tf| if tf == 0 { 0.0 } else { 1.0 + (tf as f32).ln() })
            .collect();

        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut embedding {
                *value /= magnitude;
            }
        }

        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Calculate cosine similarity between two embedding vectors
///
/// Returns 0.0 when either vector has zero length or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_deterministic() {
        let model = HashingEmbeddingModel::new(384);
        let text = "Consolidated revenue for the year";
        assert_eq!(model.embed(text).unwrap(), model.embed(text).unwrap());
    }

    #[test]
    fn test_embedding_dimension_and_norm() {
        let model = HashingEmbeddingModel::new(128);
        let embedding = model.embed("net profit after tax").unwrap();
        assert_eq!(embedding.len(), 128);
        assert_eq!(model.dimension(), 128);

        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 0.0001, "Embedding should be normalized");
    }

    #[test]
    fn test_case_and_punctuation_insensitive() {
        let model = HashingEmbeddingModel::default();
        let a = model.embed("Employee Utilization Rate").unwrap();
        let b = model.embed("employee utilization, rate.").unwrap();
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_shared_vocabulary_scores_higher() {
        let model = HashingEmbeddingModel::default();
        let query = model.embed("diluted earnings per share").unwrap();
        let eps = model.embed("Diluted earnings per share (in ₹) 134.19").unwrap();
        let attrition = model.embed("Attrition for the year stood at 13%").unwrap();
        assert!(cosine_similarity(&query, &eps) > cosine_similarity(&query, &attrition));
    }

    #[test]
    fn test_stopword_only_and_symbol_text() {
        let model = HashingEmbeddingModel::default();
        assert!(model.embed("what was the").is_ok());
        assert!(model.embed("₹ — %").is_ok());
    }

    #[test]
    fn test_empty_text() {
        let model = HashingEmbeddingModel::default();
        let result = model.embed("   ");
        assert!(result.unwrap_err().to_string().contains("Empty text"));
    }

    #[test]
    fn test_cosine_similarity_edges() {
        let x = vec![1.0, 0.0, 0.0];
        let y = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&x, &x) - 1.0).abs() < 0.0001);
        assert!(cosine_similarity(&x, &y).abs() < 0.0001);
        assert_eq!(cosine_similarity(&x, &[0.0, 0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&x, &[1.0]), 0.0);
    }
}
