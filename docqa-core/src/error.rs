//! Error taxonomy shared by the docqa crates.
//!
//! Each pipeline stage has its own enum so callers can tell an upload that
//! failed to extract apart from one that failed to index.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors raised while turning an uploaded file into a [`Document`](crate::Document).
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// No extractor is registered for the file extension.
    #[error("unsupported file type '{extension}' (allowed: {allowed})")]
    UnsupportedType {
        /// The extension that was rejected (lower-cased, may be empty).
        extension: String,
        /// Comma separated list of accepted extensions.
        allowed: String,
    },

    /// The file contained no extractable text.
    #[error("no extractable text in {}", path.display())]
    EmptyContent {
        /// The file that produced no text.
        path: PathBuf,
    },

    /// The file is not valid text in the expected encoding.
    #[error("invalid text encoding in {}: {message}", path.display())]
    EncodingError {
        /// The file that failed to decode.
        path: PathBuf,
        /// Decoder diagnostic.
        message: String,
    },

    /// The file is structurally broken (not a PDF, not a DOCX archive, ...).
    #[error("malformed {format} file {}: {message}", path.display())]
    Malformed {
        /// Format the extractor expected.
        format: &'static str,
        /// The offending file.
        path: PathBuf,
        /// Parser diagnostic.
        message: String,
    },

    /// Reading the file failed.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// The file being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors raised by the chunk splitter.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SplitError {
    /// The document text is empty or whitespace-only.
    #[error("document '{document_id}' has no text to split")]
    EmptyDocument {
        /// The document that produced no chunks.
        document_id: String,
    },
}

/// Errors returned by an [`EmbeddingProvider`](crate::EmbeddingProvider).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EmbeddingError {
    /// The provider could not be reached or rejected the request.
    #[error("embedding provider ({provider}) unavailable: {message}")]
    Unavailable {
        /// Provider name.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The provider asked the caller to slow down.
    #[error("embedding provider ({provider}) rate limited")]
    RateLimited {
        /// Provider name.
        provider: String,
        /// Server supplied back-off hint, if any.
        retry_after: Option<Duration>,
    },

    /// The provider answered with something that is not a set of embeddings.
    #[error("embedding provider ({provider}) returned an invalid response: {message}")]
    InvalidResponse {
        /// Provider name.
        provider: String,
        /// A description of what was wrong.
        message: String,
    },
}

/// Errors raised while building, persisting or loading a vector index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The embedding provider failed for a reason other than rate limiting.
    #[error("embedding provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The embedding provider kept rate limiting until the retry budget ran out.
    #[error("embedding provider rate limited after {attempts} attempts")]
    ProviderRateLimited {
        /// Number of attempts made.
        attempts: u32,
    },

    /// There were no chunks to index.
    #[error("cannot build an index from zero chunks")]
    EmptyInput,

    /// An embedding did not have the provider's dimensionality.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension reported by the provider or recorded in the index.
        expected: usize,
        /// Dimension actually observed.
        actual: usize,
    },

    /// Writing the index to disk failed.
    #[error("failed to persist index to {}: {source}", path.display())]
    Persist {
        /// Target path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// No persisted index exists at the given location.
    #[error("no index found at {}", path.display())]
    NotFound {
        /// Directory that was searched.
        path: PathBuf,
    },

    /// The persisted index could not be parsed or is inconsistent.
    #[error("corrupt index at {}: {message}", path.display())]
    Corrupt {
        /// The index file.
        path: PathBuf,
        /// What was wrong with it.
        message: String,
    },
}

/// Errors raised by the retriever.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RetrievalError {
    /// No document has been indexed yet.
    #[error("no document has been indexed yet")]
    NoIndex,

    /// Embedding the query failed.
    #[error("failed to embed query: {0}")]
    QueryEmbedding(#[from] EmbeddingError),
}

/// Errors raised by an [`AnswerGenerator`](crate::AnswerGenerator).
///
/// The `Display` text is shown to the user in place of an answer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// The LLM service could not be reached.
    #[error("LLM service unreachable: {0}")]
    Unreachable(String),

    /// The LLM service answered with a non-success HTTP status.
    #[error("LLM API error: HTTP {status}")]
    RemoteError {
        /// HTTP status code.
        status: u16,
    },

    /// The response body did not have the expected shape.
    #[error("LLM response formatting error")]
    MalformedResponse,

    /// The request did not complete within the configured timeout.
    #[error("LLM request timed out")]
    Timeout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_type_names_allowed_set() {
        let err = ExtractionError::UnsupportedType {
            extension: "xlsx".into(),
            allowed: "docx, pdf, txt".into(),
        };
        assert_eq!(err.to_string(), "unsupported file type 'xlsx' (allowed: docx, pdf, txt)");
    }

    #[test]
    fn generation_errors_render_as_user_text() {
        assert_eq!(GenerationError::RemoteError { status: 500 }.to_string(), "LLM API error: HTTP 500");
        assert_eq!(GenerationError::Timeout.to_string(), "LLM request timed out");
    }

    #[test]
    fn embedding_error_converts_into_retrieval_error() {
        let err: RetrievalError = EmbeddingError::Unavailable {
            provider: "test".into(),
            message: "down".into(),
        }
        .into();
        assert!(matches!(err, RetrievalError::QueryEmbedding(_)));
    }
}
