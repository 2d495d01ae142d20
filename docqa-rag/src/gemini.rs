//! Gemini embedding provider using the `docqa-gemini` crate.
//!
//! This module is only available when the `gemini` feature is enabled.

use async_trait::async_trait;
use docqa_core::{EmbeddingError, EmbeddingProvider};
use docqa_gemini::{
    BatchEmbedContentsRequest, Content, EmbedContentRequest, GeminiClient, TaskType,
    to_embedding_error,
};
use tracing::{debug, error};

use crate::error::{RagError, Result};

/// Default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "gemini-embedding-001";

/// The API accepts at most this many texts per batch request.
const MAX_BATCH_SIZE: usize = 100;

/// An [`EmbeddingProvider`] backed by the Gemini embedding API.
///
/// Chunks are embedded with [`TaskType::RetrievalDocument`] through
/// `batchEmbedContents`; single queries use [`TaskType::RetrievalQuery`].
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::GeminiEmbeddingProvider;
///
/// let provider = GeminiEmbeddingProvider::new("your-api-key")?;
/// let embedding = provider.embed("hello world").await?;
/// ```
pub struct GeminiEmbeddingProvider {
    client: GeminiClient,
    model: String,
    output_dimensionality: Option<u32>,
    dimensions: usize,
}

impl GeminiEmbeddingProvider {
    /// Default embedding dimensions for `gemini-embedding-001`.
    const DEFAULT_DIMENSIONS: usize = 3072;

    /// Create a provider for the default model using the given API key.
    pub fn new(api_key: impl AsRef<str>) -> Result<Self> {
        let client = GeminiClient::new(api_key).map_err(|e| RagError::ProviderSetup {
            provider: "gemini".into(),
            message: format!("failed to create Gemini client: {e}"),
        })?;
        Ok(Self::from_client(client))
    }

    /// Create a provider from the `GEMINI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| RagError::ProviderSetup {
            provider: "gemini".into(),
            message: "GEMINI_API_KEY is not set".into(),
        })?;
        Self::new(api_key)
    }

    /// Create a provider from an existing client, e.g. one with a custom base URL.
    pub fn from_client(client: GeminiClient) -> Self {
        Self {
            client,
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            output_dimensionality: None,
            dimensions: Self::DEFAULT_DIMENSIONS,
        }
    }

    /// Use a different embedding model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Ask the API to truncate vectors to `dims` values.
    pub fn with_output_dimensionality(mut self, dims: u32) -> Self {
        self.output_dimensionality = Some(dims);
        self.dimensions = dims as usize;
        self
    }

    fn request(&self, text: &str, task_type: TaskType) -> EmbedContentRequest {
        EmbedContentRequest {
            model: format!("models/{}", self.model),
            content: Content::text(text),
            task_type: Some(task_type),
            output_dimensionality: self.output_dimensionality,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbeddingProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, EmbeddingError> {
        let request = self.request(text, TaskType::RetrievalQuery);
        let response = self.client.embed_content(&self.model, &request).await.map_err(|e| {
            error!(error = %e, "Gemini embedding request failed");
            to_embedding_error(self.name(), e)
        })?;
        debug!(dimensions = response.embedding.values.len(), "generated Gemini embedding");
        Ok(response.embedding.values)
    }

    async fn embed_batch(&self, texts: &[&str]) -> std::result::Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut results = Vec::with_capacity(texts.len());
        for batch in texts.chunks(MAX_BATCH_SIZE) {
            let request = BatchEmbedContentsRequest {
                requests: batch.iter().map(|t| self.request(t, TaskType::RetrievalDocument)).collect(),
            };
            let response =
                self.client.batch_embed_contents(&self.model, &request).await.map_err(|e| {
                    error!(error = %e, batch_size = batch.len(), "Gemini batch embedding failed");
                    to_embedding_error(self.name(), e)
                })?;
            if response.embeddings.len() != batch.len() {
                return Err(EmbeddingError::InvalidResponse {
                    provider: self.name().to_string(),
                    message: format!(
                        "expected {} embeddings, got {}",
                        batch.len(),
                        response.embeddings.len()
                    ),
                });
            }
            results.extend(response.embeddings.into_iter().map(|e| e.values));
        }
        debug!(count = results.len(), "generated Gemini batch embeddings");
        Ok(results)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
