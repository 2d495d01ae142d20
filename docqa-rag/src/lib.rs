//! # docqa-rag
//!
//! Splitting, embedding and retrieval for the docqa document assistant.
//!
//! - [`FixedSizeChunker`] splits a [`Document`](docqa_core::Document) into
//!   overlapping character windows
//! - [`IndexBuilder`] embeds chunks and persists a [`VectorIndex`]
//! - [`Retriever`] answers "which chunks are nearest to this question"
//! - [`HashingEmbeddingProvider`] embeds offline; [`GeminiEmbeddingProvider`]
//!   (feature `gemini`, on by default) calls the Gemini embedding API
//!
//! ```rust,ignore
//! use docqa_rag::{FixedSizeChunker, IndexBuilder, Retriever, RagConfig, Chunker};
//!
//! let config = RagConfig::default();
//! let chunks = FixedSizeChunker::from_config(&config)?.chunk(&document)?;
//! let index = IndexBuilder::new(provider.clone()).build(chunks, &index_dir).await?;
//! let retriever = Retriever::from_config(Arc::new(index), provider, &config);
//! let context = retriever.retrieve("What is the refund policy?").await?;
//! ```

pub mod builder;
pub mod chunking;
pub mod config;
pub mod error;
#[cfg(feature = "gemini")]
pub mod gemini;
pub mod hashing;
pub mod index;
pub mod retriever;
pub mod retry;

pub use builder::IndexBuilder;
pub use chunking::{Chunker, FixedSizeChunker};
pub use config::{RagConfig, RagConfigBuilder};
pub use error::{RagError, Result};
#[cfg(feature = "gemini")]
pub use gemini::{DEFAULT_EMBEDDING_MODEL, GeminiEmbeddingProvider};
pub use hashing::HashingEmbeddingProvider;
pub use index::{DistanceMetric, VectorIndex};
pub use retriever::{DEFAULT_TOP_K, Retriever};
pub use retry::RetryPolicy;
