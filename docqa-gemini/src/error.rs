use std::time::Duration;

use docqa_core::{EmbeddingError, GenerationError};
use thiserror::Error;
use url::Url;

/// Errors produced by [`GeminiClient`](crate::GeminiClient).
#[derive(Debug, Error)]
pub enum Error {
    #[error("API key is not a valid header value")]
    InvalidApiKey,

    #[error("failed to construct URL (probably incorrect model name): {suffix}")]
    ConstructUrl { suffix: String, source: url::ParseError },

    #[error("failed to build HTTP client: {0}")]
    BuildClient(reqwest::Error),

    #[error("request to '{url}' timed out")]
    Timeout { url: Url },

    #[error("failed to perform request to '{url}': {source}")]
    PerformRequest { url: Url, source: reqwest::Error },

    #[error(
        "bad response from server; code {code}; description: {}",
        description.as_deref().unwrap_or("none")
    )]
    BadResponse {
        /// HTTP status code
        code: u16,
        /// Parsed `Retry-After` header, when present
        retry_after: Option<Duration>,
        /// Response body, if it could be read
        description: Option<String>,
    },

    #[error("failed to deserialize JSON response")]
    Deserialize { source: serde_json::Error },

    #[error("response has no text at candidates[0].content.parts[0].text")]
    MissingText,
}

impl Error {
    pub(crate) fn transport(url: &Url, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Error::Timeout { url: url.clone() }
        } else {
            Error::PerformRequest { url: url.clone(), source }
        }
    }
}

impl From<Error> for GenerationError {
    fn from(err: Error) -> Self {
        match err {
            Error::Timeout { .. } => GenerationError::Timeout,
            Error::BadResponse { code, .. } => GenerationError::RemoteError { status: code },
            Error::Deserialize { .. } | Error::MissingText => GenerationError::MalformedResponse,
            other => GenerationError::Unreachable(other.to_string()),
        }
    }
}

/// Map a client error to the embedding taxonomy, tagging it with `provider`.
pub fn to_embedding_error(provider: &str, err: Error) -> EmbeddingError {
    let provider = provider.to_string();
    match err {
        Error::BadResponse { code: 429, retry_after, .. } => {
            EmbeddingError::RateLimited { provider, retry_after }
        }
        Error::Deserialize { source } => {
            EmbeddingError::InvalidResponse { provider, message: source.to_string() }
        }
        other => EmbeddingError::Unavailable { provider, message: other.to_string() },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_map_to_remote_error() {
        let err = Error::BadResponse { code: 503, retry_after: None, description: None };
        assert_eq!(GenerationError::from(err), GenerationError::RemoteError { status: 503 });
    }

    #[test]
    fn too_many_requests_maps_to_rate_limited() {
        let err = Error::BadResponse {
            code: 429,
            retry_after: Some(Duration::from_secs(2)),
            description: Some("quota".into()),
        };
        assert_eq!(
            to_embedding_error("Gemini", err),
            EmbeddingError::RateLimited {
                provider: "Gemini".into(),
                retry_after: Some(Duration::from_secs(2)),
            }
        );
    }

    #[test]
    fn missing_text_is_malformed() {
        assert_eq!(GenerationError::from(Error::MissingText), GenerationError::MalformedResponse);
    }
}
