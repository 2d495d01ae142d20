//! Embedding chunks into a [`VectorIndex`].

use std::path::Path;
use std::sync::Arc;

use docqa_core::{Chunk, EmbeddingError, EmbeddingProvider, IndexError};
use tracing::{error, info, warn};

use crate::index::{DistanceMetric, VectorIndex};
use crate::retry::RetryPolicy;

/// Embeds chunks with an [`EmbeddingProvider`] and assembles the result into a
/// [`VectorIndex`].
///
/// The chunks are embedded in one batch call. A rate-limited call is retried
/// according to the configured [`RetryPolicy`]; any other provider failure
/// aborts the build immediately.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{HashingEmbeddingProvider, IndexBuilder};
///
/// let builder = IndexBuilder::new(Arc::new(HashingEmbeddingProvider::default()));
/// let index = builder.build(chunks, &index_dir).await?;
/// ```
pub struct IndexBuilder {
    provider: Arc<dyn EmbeddingProvider>,
    metric: DistanceMetric,
    retry: RetryPolicy,
}

impl IndexBuilder {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider, metric: DistanceMetric::default(), retry: RetryPolicy::default() }
    }

    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    /// Embed `chunks` and return the in-memory index without persisting it.
    pub async fn embed_chunks(&self, mut chunks: Vec<Chunk>) -> Result<VectorIndex, IndexError> {
        if chunks.is_empty() {
            return Err(IndexError::EmptyInput);
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embed_with_retry(&texts).await?;

        if embeddings.len() != chunks.len() {
            error!(
                provider = self.provider.name(),
                expected = chunks.len(),
                actual = embeddings.len(),
                "embedding count mismatch"
            );
            return Err(IndexError::ProviderUnavailable(format!(
                "{} returned {} embeddings for {} chunks",
                self.provider.name(),
                embeddings.len(),
                chunks.len()
            )));
        }

        let dimensions = self.provider.dimensions();
        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            if embedding.len() != dimensions {
                return Err(IndexError::DimensionMismatch {
                    expected: dimensions,
                    actual: embedding.len(),
                });
            }
            chunk.embedding = embedding;
        }

        VectorIndex::new(chunks, dimensions, self.metric)
    }

    /// Embed `chunks` and persist the resulting index into `dir`.
    ///
    /// Nothing is written unless every chunk was embedded, so a failed rebuild
    /// leaves any previously persisted index untouched.
    pub async fn build(&self, chunks: Vec<Chunk>, dir: &Path) -> Result<VectorIndex, IndexError> {
        let chunk_count = chunks.len();
        let index = self.embed_chunks(chunks).await?;
        index.save(dir).await?;
        info!(
            provider = self.provider.name(),
            chunk_count,
            dimensions = index.dimensions(),
            path = %dir.display(),
            "index built"
        );
        Ok(index)
    }

    async fn embed_with_retry(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, IndexError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.provider.embed_batch(texts).await {
                Ok(embeddings) => return Ok(embeddings),
                Err(EmbeddingError::RateLimited { provider, retry_after }) => {
                    if attempt >= max_attempts {
                        error!(
                            provider = %provider,
                            attempts = attempt,
                            "embedding rate limit retries exhausted"
                        );
                        return Err(IndexError::ProviderRateLimited { attempts: attempt });
                    }
                    let delay = self.retry.backoff_for(attempt, retry_after);
                    warn!(
                        provider = %provider,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "embedding rate limited, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(provider = self.provider.name(), error = %e, "embedding failed");
                    return Err(IndexError::ProviderUnavailable(e.to_string()));
                }
            }
        }
    }
}
