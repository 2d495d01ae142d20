//! # docqa-gemini
//!
//! A small client for the Gemini REST API covering what the document
//! assistant needs: single-turn `generateContent` for answers and
//! `embedContent` / `batchEmbedContents` for chunk embeddings.
//!
//! ```rust,ignore
//! use docqa_gemini::{GeminiClient, GeminiGenerator};
//! use docqa_core::{AnswerGenerator, GenerationParams};
//!
//! let generator = GeminiGenerator::new(GeminiClient::new(api_key)?);
//! let answer = generator.answer(&context, "What is this about?", &GenerationParams::default()).await?;
//! ```

pub mod client;
pub mod error;
pub mod generator;
pub mod types;

pub use client::{DEFAULT_TIMEOUT, GeminiClient, GeminiClientBuilder};
pub use error::{Error, to_embedding_error};
pub use generator::GeminiGenerator;
pub use types::{
    BatchEmbedContentsRequest, BatchEmbedContentsResponse, Content, ContentEmbedding,
    EmbedContentRequest, EmbedContentResponse, GenerateContentRequest, GenerateContentResponse,
    GenerationConfig, Part, TaskType,
};
