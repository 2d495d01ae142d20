use std::sync::LazyLock;
use std::time::Duration;

use docqa_core::Model;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
use reqwest::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{Span, debug, instrument};
use url::Url;

use crate::error::Error;
use crate::types::{
    BatchEmbedContentsRequest, BatchEmbedContentsResponse, EmbedContentRequest,
    EmbedContentResponse, GenerateContentRequest, GenerateContentResponse,
};

static DEFAULT_BASE_URL: LazyLock<Url> = LazyLock::new(|| {
    Url::parse("https://generativelanguage.googleapis.com/v1beta/")
        .expect("unreachable error: failed to parse default base URL")
});

/// Default upper bound for a whole request, connect to last body byte.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the Gemini REST API, authenticated with an API key.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http_client: Client,
    base_url: Url,
}

impl GeminiClient {
    /// Create a client for the public endpoint with default timeouts.
    pub fn new(api_key: impl AsRef<str>) -> Result<Self, Error> {
        Self::builder(api_key).build()
    }

    /// Start configuring a client.
    pub fn builder(api_key: impl AsRef<str>) -> GeminiClientBuilder {
        GeminiClientBuilder {
            api_key: api_key.as_ref().to_string(),
            base_url: DEFAULT_BASE_URL.clone(),
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Base URL requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn build_url(&self, model: &str, method: &str) -> Result<Url, Error> {
        let suffix = format!("models/{model}:{method}");
        self.base_url.join(&suffix).map_err(|source| Error::ConstructUrl { suffix, source })
    }

    /// Check the response status code and return an error if it is not successful
    async fn check_response(response: Response) -> Result<Response, Error> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        let description = response.text().await.ok();
        Err(Error::BadResponse { code: status.as_u16(), retry_after, description })
    }

    /// POST a JSON body and deserialize the JSON response.
    async fn post_json<Req: Serialize + ?Sized, Res: DeserializeOwned>(
        &self,
        url: Url,
        body: &Req,
    ) -> Result<Res, Error> {
        let response = self
            .http_client
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| Error::transport(&url, e))?;
        debug!("response received");
        let response = Self::check_response(response).await?;
        let bytes = response.bytes().await.map_err(|e| Error::transport(&url, e))?;
        serde_json::from_slice(&bytes).map_err(|source| Error::Deserialize { source })
    }

    /// Generate content
    #[instrument(skip_all, fields(
        model = %model,
        contents.count = request.contents.len(),
        usage.prompt_tokens,
        usage.total_tokens,
    ), err)]
    pub async fn generate_content(
        &self,
        model: &Model,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, Error> {
        let url = self.build_url(model.as_str(), "generateContent")?;
        let response: GenerateContentResponse = self.post_json(url, request).await?;

        if let Some(usage) = &response.usage_metadata {
            Span::current()
                .record("usage.prompt_tokens", usage.prompt_token_count)
                .record("usage.total_tokens", usage.total_token_count);
        }

        Ok(response)
    }

    /// Embed a single piece of content.
    #[instrument(skip_all, fields(model = model), err)]
    pub async fn embed_content(
        &self,
        model: &str,
        request: &EmbedContentRequest,
    ) -> Result<EmbedContentResponse, Error> {
        let url = self.build_url(model, "embedContent")?;
        self.post_json(url, request).await
    }

    /// Embed several pieces of content in one request.
    #[instrument(skip_all, fields(model = model, batch.size = request.requests.len()), err)]
    pub async fn batch_embed_contents(
        &self,
        model: &str,
        request: &BatchEmbedContentsRequest,
    ) -> Result<BatchEmbedContentsResponse, Error> {
        let url = self.build_url(model, "batchEmbedContents")?;
        self.post_json(url, request).await
    }
}

/// Builder for [`GeminiClient`].
#[derive(Debug, Clone)]
pub struct GeminiClientBuilder {
    api_key: String,
    base_url: Url,
    timeout: Duration,
    connect_timeout: Duration,
}

impl GeminiClientBuilder {
    /// Point the client at a different API root (a proxy, a test server).
    /// A trailing slash is added when missing so relative paths resolve below it.
    pub fn base_url(mut self, mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        self.base_url = base_url;
        self
    }

    /// Overall request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn build(self) -> Result<GeminiClient, Error> {
        let mut key = HeaderValue::from_str(&self.api_key).map_err(|_| Error::InvalidApiKey)?;
        key.set_sensitive(true);
        let headers = HeaderMap::from_iter([(HeaderName::from_static("x-goog-api-key"), key)]);

        let http_client = Client::builder()
            .default_headers(headers)
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .build()
            .map_err(Error::BuildClient)?;

        Ok(GeminiClient { http_client, base_url: self.base_url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_resolve_below_base() {
        let client = GeminiClient::new("key").unwrap();
        let url = client.build_url("gemini-2.0-flash", "generateContent").unwrap();
        assert_eq!(
            url.as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn custom_base_url_gets_trailing_slash() {
        let client = GeminiClient::builder("key")
            .base_url(Url::parse("http://127.0.0.1:9999/v1beta").unwrap())
            .build()
            .unwrap();
        let url = client.build_url("gemini-embedding-001", "embedContent").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9999/v1beta/models/gemini-embedding-001:embedContent");
    }

    #[test]
    fn rejects_api_key_with_newline() {
        assert!(matches!(GeminiClient::new("bad\nkey"), Err(Error::InvalidApiKey)));
    }
}
