//! # docqa-core
//!
//! Shared vocabulary for the docqa document assistant.
//!
//! - [`Document`], [`Chunk`], [`ScoredChunk`]: the data flowing through the
//!   extract → split → index → retrieve pipeline
//! - [`ConversationTurn`]: one entry of a session transcript
//! - [`EmbeddingProvider`] and [`AnswerGenerator`]: the two remote
//!   capabilities the pipeline depends on
//! - [`error`]: one error enum per pipeline stage

pub mod conversation;
pub mod document;
pub mod embedding;
pub mod error;
pub mod generation;

pub use conversation::{ConversationTurn, TurnStatus};
pub use document::{Chunk, Document, ScoredChunk, document_id_for};
pub use embedding::EmbeddingProvider;
pub use error::{
    EmbeddingError, ExtractionError, GenerationError, IndexError, RetrievalError, SplitError,
};
pub use generation::{
    AnswerGenerator, GenerationParams, GenerationParamsBuilder, InvalidParams, Model,
    PROMPT_PREAMBLE, build_prompt, join_context,
};
