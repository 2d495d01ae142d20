//! [`AnswerGenerator`] backed by Gemini `generateContent`.

use async_trait::async_trait;
use docqa_core::{AnswerGenerator, GenerationError, GenerationParams};
use tracing::{debug, error};

use crate::client::GeminiClient;
use crate::error::Error;
use crate::types::{GenerateContentRequest, GenerationConfig};

/// Sends each prompt as a single-turn `generateContent` call.
///
/// One attempt per call; timeouts, transport failures, HTTP errors and
/// unexpected bodies come back as [`GenerationError`] variants.
#[derive(Debug, Clone)]
pub struct GeminiGenerator {
    client: GeminiClient,
}

impl GeminiGenerator {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &GeminiClient {
        &self.client
    }
}

#[async_trait]
impl AnswerGenerator for GeminiGenerator {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, GenerationError> {
        let request = GenerateContentRequest::from_prompt(prompt).with_generation_config(
            GenerationConfig { temperature: params.temperature, max_output_tokens: params.max_tokens },
        );
        debug!(model = %params.model, prompt_len = prompt.len(), "generating answer");

        let response = self.client.generate_content(&params.model, &request).await.map_err(|e| {
            error!(model = %params.model, error = %e, "generation request failed");
            GenerationError::from(e)
        })?;

        match response.text() {
            Some(text) => Ok(text.to_string()),
            None => {
                error!(model = %params.model, "generation response has no answer text");
                Err(Error::MissingText.into())
            }
        }
    }
}
