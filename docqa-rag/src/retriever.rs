//! Query-time retrieval over a [`VectorIndex`].

use std::sync::Arc;

use docqa_core::{EmbeddingError, EmbeddingProvider, RetrievalError, ScoredChunk};
use tracing::{debug, error};

use crate::config::RagConfig;
use crate::index::VectorIndex;

/// Number of chunks returned per query unless configured otherwise.
pub const DEFAULT_TOP_K: usize = 4;

/// Embeds a query and returns the nearest chunks of an index.
///
/// The query must be embedded by the same provider that built the index;
/// a vector of the wrong dimensionality is reported as an invalid provider
/// response.
pub struct Retriever {
    index: Arc<VectorIndex>,
    provider: Arc<dyn EmbeddingProvider>,
    top_k: usize,
    similarity_threshold: Option<f32>,
}

impl Retriever {
    pub fn new(index: Arc<VectorIndex>, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { index, provider, top_k: DEFAULT_TOP_K, similarity_threshold: None }
    }

    /// Create a retriever using `top_k` and `similarity_threshold` from `config`.
    pub fn from_config(
        index: Arc<VectorIndex>,
        provider: Arc<dyn EmbeddingProvider>,
        config: &RagConfig,
    ) -> Self {
        let retriever = Self::new(index, provider).with_top_k(config.top_k);
        match config.similarity_threshold {
            Some(threshold) => retriever.with_similarity_threshold(threshold),
            None => retriever,
        }
    }

    /// Set how many chunks to return. Zero is treated as one.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = Some(threshold);
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }

    /// Return up to `top_k` distinct chunks nearest to `query`, nearest first.
    ///
    /// # Errors
    ///
    /// [`RetrievalError::NoIndex`] when the index holds no chunks, and
    /// [`RetrievalError::QueryEmbedding`] when the query cannot be embedded.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<ScoredChunk>, RetrievalError> {
        if self.index.is_empty() {
            return Err(RetrievalError::NoIndex);
        }

        let embedding = self.provider.embed(query).await.map_err(|e| {
            error!(provider = self.provider.name(), error = %e, "query embedding failed");
            e
        })?;

        if embedding.len() != self.index.dimensions() {
            return Err(RetrievalError::QueryEmbedding(EmbeddingError::InvalidResponse {
                provider: self.provider.name().to_string(),
                message: format!(
                    "query embedding has {} dimensions, index has {}",
                    embedding.len(),
                    self.index.dimensions()
                ),
            }));
        }

        let mut results = self.index.search(&embedding, self.top_k);
        if let Some(threshold) = self.similarity_threshold {
            results.retain(|r| r.score >= threshold);
        }

        debug!(top_k = self.top_k, result_count = results.len(), "retrieval completed");
        Ok(results)
    }
}
