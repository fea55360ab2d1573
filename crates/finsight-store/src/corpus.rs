//! File-backed corpora
//!
//! Layout for a document stem `report`:
//!
//! - `<documents_dir>/report.json`: the prepared document ([`PreparedDocument`])
//! - `<corpus_dir>/report_text.json`: text snippets (required once indexed)
//! - `<corpus_dir>/report_tables.json`: table snippets (optional)
//!
//! Snippet files are plain JSON arrays; the HNSW index is rebuilt from them
//! each time a corpus is opened.

use crate::embedding::{EmbeddingError, EmbeddingModel, HashingEmbeddingModel};
use crate::ingest::{PreparedDocument, TextChunker};
use crate::vector_index::{VectorIndex, VectorIndexError};
use async_trait::async_trait;
use finsight_domain::traits::{CorpusProvider, Retriever};
use finsight_domain::{Corpora, Snippet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Minimum HNSW candidate list size at query time
const MIN_EF_SEARCH: usize = 64;

/// Errors that can occur while building or searching a corpus
#[derive(Error, Debug)]
pub enum CorpusError {
    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Corpus or document file is not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Embedding failed
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Index operation failed
    #[error("Index error: {0}")]
    Index(#[from] VectorIndexError),

    /// Document name cannot be mapped to a corpus
    #[error("Invalid document name: {0}")]
    InvalidDocument(String),

    /// Blocking corpus task panicked or was cancelled
    #[error("Corpus task failed: {0}")]
    Task(String),
}

/// An in-memory searchable corpus
pub struct VectorCorpus {
    snippets: Vec<Snippet>,
    index: VectorIndex,
    model: Arc<dyn EmbeddingModel>,
}

impl VectorCorpus {
    /// Embed and index `snippets`
    ///
    /// Snippets with blank content are dropped.
    pub fn from_snippets(
        snippets: Vec<Snippet>,
        model: Arc<dyn EmbeddingModel>,
    ) -> Result<Self, CorpusError> {
        let snippets: Vec<Snippet> = snippets
            .into_iter()
            .filter(|s| !s.content.trim().is_empty())
            .collect();

        let index = VectorIndex::new(model.dimension());
        for snippet in &snippets {
            let embedding = model.embed(&snippet.content)?;
            index.add(&embedding)?;
        }

        Ok(Self {
            snippets,
            index,
            model,
        })
    }

    /// Load snippets from a JSON array file and index them
    pub fn load(path: &Path, model: Arc<dyn EmbeddingModel>) -> Result<Self, CorpusError> {
        let json = fs::read_to_string(path)?;
        let snippets: Vec<Snippet> = serde_json::from_str(&json)?;
        Self::from_snippets(snippets, model)
    }

    /// Number of snippets
    pub fn len(&self) -> usize {
        self.snippets.len()
    }

    /// Whether the corpus has no snippets
    pub fn is_empty(&self) -> bool {
        self.snippets.is_empty()
    }

    /// Synchronous top-k search
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<Snippet>, CorpusError> {
        if self.snippets.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let embedding = self.model.embed(query)?;
        let hits = self
            .index
            .search(&embedding, k, MIN_EF_SEARCH.max(k))?;

        Ok(hits
            .into_iter()
            .filter_map(|(id, _)| self.snippets.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl Retriever for VectorCorpus {
    type Error = CorpusError;

    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Snippet>, Self::Error> {
        self.search(query, k)
    }
}

/// Corpus provider over a documents directory and a corpus directory
///
/// Opening and indexing read files, embed snippets and build the HNSW
/// index, so both run on the blocking pool.
#[derive(Clone)]
pub struct FileCorpusProvider {
    documents_dir: PathBuf,
    corpus_dir: PathBuf,
    chunker: TextChunker,
    model: Arc<dyn EmbeddingModel>,
}

impl FileCorpusProvider {
    /// Create a provider with the default chunker and embedding model
    pub fn new(documents_dir: impl Into<PathBuf>, corpus_dir: impl Into<PathBuf>) -> Self {
        Self {
            documents_dir: documents_dir.into(),
            corpus_dir: corpus_dir.into(),
            chunker: TextChunker::default(),
            model: Arc::new(HashingEmbeddingModel::default()),
        }
    }

    /// Use a different chunker
    pub fn with_chunker(mut self, chunker: TextChunker) -> Self {
        self.chunker = chunker;
        self
    }

    /// Use a different embedding model
    pub fn with_model(mut self, model: Arc<dyn EmbeddingModel>) -> Self {
        self.model = model;
        self
    }

    /// File stem used for every file belonging to `document`
    ///
    /// Only the final path component counts, so "reports/acme.pdf" and
    /// "acme.pdf" name the same corpus.
    pub fn stem(document: &str) -> Result<String, CorpusError> {
        Path::new(document)
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::trim)
            .filter(|s| !s.is_empty() && *s != "..")
            .map(str::to_string)
            .ok_or_else(|| CorpusError::InvalidDocument(document.to_string()))
    }

    /// Path of the prepared document
    pub fn document_path(&self, document: &str) -> Result<PathBuf, CorpusError> {
        Ok(self.documents_dir.join(format!("{}.json", Self::stem(document)?)))
    }

    fn text_path(&self, stem: &str) -> PathBuf {
        self.corpus_dir.join(format!("{}_text.json", stem))
    }

    fn tables_path(&self, stem: &str) -> PathBuf {
        self.corpus_dir.join(format!("{}_tables.json", stem))
    }

    fn open_sync(&self, document: &str) -> Result<Option<Corpora<VectorCorpus>>, CorpusError> {
        let stem = Self::stem(document)?;
        let text_path = self.text_path(&stem);
        if !text_path.exists() {
            return Ok(None);
        }

        let text = VectorCorpus::load(&text_path, self.model.clone())?;
        let tables_path = self.tables_path(&stem);
        let table = if tables_path.exists() {
            Some(VectorCorpus::load(&tables_path, self.model.clone())?)
        } else {
            None
        };

        debug!(
            document,
            text_snippets = text.len(),
            table_snippets = table.as_ref().map_or(0, VectorCorpus::len),
            "Opened corpus"
        );
        Ok(Some(Corpora { text, table }))
    }

    fn index_sync(&self, document: &str) -> Result<bool, CorpusError> {
        let stem = Self::stem(document)?;
        let document_path = self.document_path(document)?;
        if !document_path.exists() {
            return Ok(false);
        }

        let prepared: PreparedDocument = serde_json::from_str(&fs::read_to_string(&document_path)?)?;
        let text = prepared.text_snippets(&self.chunker);
        let tables = prepared.table_snippets();

        fs::create_dir_all(&self.corpus_dir)?;
        fs::write(self.text_path(&stem), serde_json::to_string_pretty(&text)?)?;

        let tables_path = self.tables_path(&stem);
        if tables.is_empty() {
            if tables_path.exists() {
                fs::remove_file(&tables_path)?;
            }
        } else {
            fs::write(&tables_path, serde_json::to_string_pretty(&tables)?)?;
        }

        info!(
            document,
            text_snippets = text.len(),
            table_snippets = tables.len(),
            "Indexed document"
        );
        Ok(true)
    }
}

#[async_trait]
impl CorpusProvider for FileCorpusProvider {
    type Retriever = VectorCorpus;
    type Error = CorpusError;

    async fn open(&self, document: &str) -> Result<Option<Corpora<VectorCorpus>>, CorpusError> {
        let provider = self.clone();
        let document = document.to_string();

        tokio::task::spawn_blocking(move || provider.open_sync(&document))
            .await
            .map_err(|e| CorpusError::Task(format!("Task join error: {}", e)))?
    }

    async fn index(&self, document: &str) -> Result<Option<Corpora<VectorCorpus>>, CorpusError> {
        let provider = self.clone();
        let document = document.to_string();

        tokio::task::spawn_blocking(move || {
            if !provider.index_sync(&document)? {
                return Ok(None);
            }
            provider.open_sync(&document)
        })
        .await
        .map_err(|e| CorpusError::Task(format!("Task join error: {}", e)))?
    }
}
