//! HNSW Vector Index for Snippet Retrieval
//!
//! Wraps the HNSW algorithm for nearest-neighbor search over snippet
//! embeddings. The index lives in memory and is rebuilt from the corpus
//! files whenever a corpus is opened.
//!
//! # HNSW Parameters
//!
//! - **M**: Number of bi-directional links per node (default: 16)
//! - **efConstruction**: Candidate list size during construction (default: 200)
//! - **efSearch**: Candidate list size during search, passed per query

use hnsw_rs::prelude::*;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

const DEFAULT_M: usize = 16;
const DEFAULT_EF_CONSTRUCTION: usize = 200;
const DEFAULT_MAX_ELEMENTS: usize = 100_000;

/// Errors that can occur during vector index operations
#[derive(Error, Debug)]
pub enum VectorIndexError {
    /// Invalid embedding dimension
    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension provided
        actual: usize,
    },

    /// Internal HNSW error
    #[error("HNSW error: {0}")]
    Internal(String),
}

struct Inner {
    hnsw: Hnsw<'static, f32, DistCosine>,
    len: usize,
}

/// Cosine HNSW index keyed by snippet position
///
/// Ids are the positions of snippets in their corpus, assigned in insertion
/// order starting at zero.
pub struct VectorIndex {
    dimension: usize,
    inner: Mutex<Inner>,
}

fn new_hnsw() -> Hnsw<'static, f32, DistCosine> {
    let nb_layer = 16.min((DEFAULT_MAX_ELEMENTS as f32).ln().trunc() as usize);
    Hnsw::<'static, f32, DistCosine>::new(
        DEFAULT_M,
        DEFAULT_MAX_ELEMENTS,
        nb_layer,
        DEFAULT_EF_CONSTRUCTION,
        DistCosine {},
    )
}

impl VectorIndex {
    /// Create a new vector index with the specified dimension
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            inner: Mutex::new(Inner {
                hnsw: new_hnsw(),
                len: 0,
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, VectorIndexError> {
        self.inner
            .lock()
            .map_err(|_| VectorIndexError::Internal("index lock poisoned".to_string()))
    }

    fn check_dimension(&self, embedding: &[f32]) -> Result<(), VectorIndexError> {
        if embedding.len() != self.dimension {
            return Err(VectorIndexError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }
        Ok(())
    }

    /// Add an embedding and return its id
    pub fn add(&self, embedding: &[f32]) -> Result<usize, VectorIndexError> {
        self.check_dimension(embedding)?;

        let mut inner = self.lock()?;
        let id = inner.len;
        inner.hnsw.insert_slice((embedding, id));
        inner.len += 1;
        Ok(id)
    }

    /// Search for the `k` nearest neighbors of `query`
    ///
    /// Returns `(id, similarity)` pairs, most similar first.
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        ef_search: usize,
    ) -> Result<Vec<(usize, f32)>, VectorIndexError> {
        self.check_dimension(query)?;

        let inner = self.lock()?;
        if inner.len == 0 || k == 0 {
            return Ok(Vec::new());
        }

        let mut results: Vec<(usize, f32)> = inner
            .hnsw
            .search(query, k, ef_search.max(k))
            .into_iter()
            // Cosine distance -> cosine similarity
            .map(|neighbour| (neighbour.d_id, 1.0 - neighbour.distance))
            .collect();

        results.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        results.truncate(k);
        Ok(results)
    }

    /// Get the number of vectors in the index
    pub fn len(&self) -> usize {
        self.lock().map(|inner| inner.len).unwrap_or(0)
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Embedding dimension
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}
