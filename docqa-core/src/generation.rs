//! Answer generation: prompt template, generation parameters and the
//! [`AnswerGenerator`] trait implemented by LLM clients.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::ScoredChunk;
use crate::error::GenerationError;

/// Instruction placed before the retrieved context.
pub const PROMPT_PREAMBLE: &str = "Use the following context to answer the question:";

/// Build the prompt sent to the LLM: instruction, context, then the question.
pub fn build_prompt(context: &str, question: &str) -> String {
    format!("{PROMPT_PREAMBLE}\n\n{context}\n\nQuestion: {question}")
}

/// Join retrieved chunk texts into a single context block, nearest first.
pub fn join_context(chunks: &[ScoredChunk]) -> String {
    chunks.iter().map(|c| c.chunk.text.as_str()).collect::<Vec<_>>().join("\n")
}

/// LLM model used for answer generation.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Model {
    #[default]
    #[serde(rename = "gemini-2.0-flash")]
    Gemini20Flash,
    #[serde(rename = "gemini-2.5-flash")]
    Gemini25Flash,
    #[serde(rename = "gemini-2.5-flash-lite")]
    Gemini25FlashLite,
    #[serde(rename = "gemini-2.5-pro")]
    Gemini25Pro,
    #[serde(untagged)]
    Custom(String),
}

impl Model {
    /// Model identifier as used in API paths (without the `models/` prefix).
    pub fn as_str(&self) -> &str {
        match self {
            Model::Gemini20Flash => "gemini-2.0-flash",
            Model::Gemini25Flash => "gemini-2.5-flash",
            Model::Gemini25FlashLite => "gemini-2.5-flash-lite",
            Model::Gemini25Pro => "gemini-2.5-pro",
            Model::Custom(model) => model.strip_prefix("models/").unwrap_or(model),
        }
    }
}

impl From<&str> for Model {
    fn from(name: &str) -> Self {
        let name = name.strip_prefix("models/").unwrap_or(name);
        match name {
            "gemini-2.0-flash" => Model::Gemini20Flash,
            "gemini-2.5-flash" => Model::Gemini25Flash,
            "gemini-2.5-flash-lite" => Model::Gemini25FlashLite,
            "gemini-2.5-pro" => Model::Gemini25Pro,
            other => Model::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected generation parameters.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid generation parameters: {0}")]
pub struct InvalidParams(pub String);

/// Optional knobs passed with each generation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Model to call.
    pub model: Model,
    /// Sampling temperature in `[0, 1]`; provider default when `None`.
    pub temperature: Option<f32>,
    /// Upper bound on generated tokens; provider default when `None`.
    pub max_tokens: Option<u32>,
}

impl GenerationParams {
    /// Create a new builder starting from the defaults.
    pub fn builder() -> GenerationParamsBuilder {
        GenerationParamsBuilder::default()
    }
}

/// Builder for validated [`GenerationParams`].
#[derive(Debug, Clone, Default)]
pub struct GenerationParamsBuilder {
    params: GenerationParams,
}

impl GenerationParamsBuilder {
    pub fn model(mut self, model: impl Into<Model>) -> Self {
        self.params.model = model.into();
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.params.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.params.max_tokens = Some(max_tokens);
        self
    }

    /// Build the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidParams`] if the temperature is outside `[0, 1]` or
    /// `max_tokens` is zero.
    pub fn build(self) -> Result<GenerationParams, InvalidParams> {
        if let Some(t) = self.params.temperature {
            if !(0.0..=1.0).contains(&t) {
                return Err(InvalidParams(format!("temperature ({t}) must be within [0, 1]")));
            }
        }
        if self.params.max_tokens == Some(0) {
            return Err(InvalidParams("max_tokens must be greater than zero".to_string()));
        }
        Ok(self.params)
    }
}

/// A remote or local LLM that turns a prompt into answer text.
///
/// Implementations make at most one attempt per call; retries are the
/// caller's decision.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Send a fully built prompt and return the generated text.
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, GenerationError>;

    /// Answer `question` using `context` with the standard prompt template.
    async fn answer(
        &self,
        context: &str,
        question: &str,
        params: &GenerationParams,
    ) -> Result<String, GenerationError> {
        let prompt = build_prompt(context, question);
        self.generate(&prompt, params).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn prompt_places_context_before_question() {
        assert_eq!(
            build_prompt("A. B. C.", "What is this about?"),
            "Use the following context to answer the question:\n\nA. B. C.\n\nQuestion: What is this about?"
        );
    }

    #[test]
    fn model_names_round_trip() {
        assert_eq!(Model::from("gemini-2.5-pro"), Model::Gemini25Pro);
        assert_eq!(Model::from("models/gemini-2.0-flash"), Model::Gemini20Flash);
        assert_eq!(Model::from("gemini-exp"), Model::Custom("gemini-exp".into()));
        assert_eq!(Model::default().to_string(), "gemini-2.0-flash");
        assert_eq!(serde_json::to_string(&Model::Gemini25Flash).unwrap(), "\"gemini-2.5-flash\"");
    }

    #[test]
    fn params_builder_validates_ranges() {
        assert!(GenerationParams::builder().temperature(1.5).build().is_err());
        assert!(GenerationParams::builder().temperature(-0.1).build().is_err());
        assert!(GenerationParams::builder().max_tokens(0).build().is_err());

        let params = GenerationParams::builder()
            .model("gemini-2.5-flash")
            .temperature(0.2)
            .max_tokens(512)
            .build()
            .unwrap();
        assert_eq!(params.model, Model::Gemini25Flash);
        assert_eq!(params.temperature, Some(0.2));
        assert_eq!(params.max_tokens, Some(512));
    }

    #[derive(Default)]
    struct RecordingGenerator {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AnswerGenerator for RecordingGenerator {
        async fn generate(
            &self,
            prompt: &str,
            _params: &GenerationParams,
        ) -> Result<String, GenerationError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("ok".to_string())
        }
    }

    #[tokio::test]
    async fn answer_sends_templated_prompt() {
        let generator = RecordingGenerator::default();
        let answer = generator
            .answer("A. B. C.", "What is this about?", &GenerationParams::default())
            .await
            .unwrap();
        assert_eq!(answer, "ok");
        assert_eq!(
            generator.prompts.lock().unwrap()[0],
            "Use the following context to answer the question:\n\nA. B. C.\n\nQuestion: What is this about?"
        );
    }
}
