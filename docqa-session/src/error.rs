//! Error types for uploads, questions and configuration.

use std::path::PathBuf;

use docqa_core::{ExtractionError, IndexError, SplitError};
use thiserror::Error;

/// Why processing an uploaded file failed. The session is left unchanged.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The file could not be turned into text.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// The extracted text could not be split into chunks.
    #[error(transparent)]
    Split(#[from] SplitError),

    /// Embedding or persisting the index failed.
    #[error(transparent)]
    Index(#[from] IndexError),

    /// The upload could not be written to the upload directory.
    #[error("failed to store upload at {}: {source}", path.display())]
    Storage {
        /// Target path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file name has no usable final path component.
    #[error("invalid file name '{0}'")]
    InvalidFileName(String),
}

/// A question that was rejected before retrieval.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AskError {
    /// No document has been processed in this session yet.
    #[error("please upload and process a document first")]
    NoDocument,

    /// The question was empty or whitespace-only.
    #[error("question must not be empty")]
    EmptyQuestion,
}

/// Invalid assistant configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// An environment variable held a value that could not be parsed.
    #[error("invalid value '{value}' for {name}")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// The offending value.
        value: String,
    },

    /// The chunking or retrieval settings are inconsistent.
    #[error(transparent)]
    Rag(#[from] docqa_rag::RagError),

    /// A setting is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// A required setting is missing.
    #[error("missing required setting: {0}")]
    Missing(&'static str),
}
