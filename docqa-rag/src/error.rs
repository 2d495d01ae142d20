//! Error types for the `docqa-rag` crate.

use thiserror::Error;

/// Errors raised while configuring RAG components.
///
/// Pipeline stages report through the stage-specific enums in
/// [`docqa_core::error`]; this type only covers setup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RagError {
    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An embedding provider could not be constructed.
    #[error("Embedding provider error ({provider}): {message}")]
    ProviderSetup {
        /// The embedding provider that failed to initialise.
        provider: String,
        /// A description of the failure.
        message: String,
    },
}

/// A convenience result type for RAG setup operations.
pub type Result<T> = std::result::Result<T, RagError>;
