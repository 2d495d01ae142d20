//! Assistant configuration.

use std::path::PathBuf;

use docqa_core::{GenerationParams, Model};
use docqa_rag::RagConfig;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default cap on uploaded file size (25 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Everything the [`Assistant`](crate::Assistant) needs to know about where to
/// keep files and how to chunk, retrieve and generate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Persisted indexes live in `<index_root>/<session_id>/`.
    pub index_root: PathBuf,
    /// Uploaded files are stored under `<upload_root>/<session_id>/`.
    pub upload_root: PathBuf,
    pub rag: RagConfig,
    pub generation: GenerationParams,
    /// Uploads larger than this are rejected by the HTTP surface.
    pub max_upload_bytes: usize,
    /// Gemini API key. Never serialized.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            index_root: PathBuf::from("data/indexes"),
            upload_root: PathBuf::from("data/uploads"),
            rag: RagConfig::default(),
            generation: GenerationParams::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            api_key: None,
        }
    }
}

impl AssistantConfig {
    pub fn builder() -> AssistantConfigBuilder {
        AssistantConfigBuilder::default()
    }

    /// Build a configuration from `DOCQA_*` and `GEMINI_API_KEY` environment
    /// variables, falling back to defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env) with a caller-supplied variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut builder = Self::builder();

        if let Some(dir) = lookup("DOCQA_INDEX_DIR") {
            builder = builder.index_root(dir);
        }
        if let Some(dir) = lookup("DOCQA_UPLOAD_DIR") {
            builder = builder.upload_root(dir);
        }
        if let Some(size) = parse_env(&lookup, "DOCQA_CHUNK_SIZE")? {
            builder = builder.chunk_size(size);
        }
        if let Some(overlap) = parse_env(&lookup, "DOCQA_CHUNK_OVERLAP")? {
            builder = builder.chunk_overlap(overlap);
        }
        if let Some(k) = parse_env(&lookup, "DOCQA_TOP_K")? {
            builder = builder.top_k(k);
        }
        if let Some(model) = lookup("DOCQA_MODEL") {
            builder = builder.model(Model::from(model.as_str()));
        }
        if let Some(key) = lookup("GEMINI_API_KEY").filter(|k| !k.trim().is_empty()) {
            builder = builder.api_key(key);
        }

        builder.build()
    }

    /// Reopen this configuration in a builder to apply overrides.
    pub fn into_builder(self) -> AssistantConfigBuilder {
        AssistantConfigBuilder { config: self }
    }

    /// The API key, or [`ConfigError::Missing`] when none is configured.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key.as_deref().ok_or(ConfigError::Missing("GEMINI_API_KEY"))
    }
}

fn parse_env(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<usize>, ConfigError> {
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { name, value }),
    }
}

/// Builder for a validated [`AssistantConfig`].
#[derive(Debug, Clone, Default)]
pub struct AssistantConfigBuilder {
    config: AssistantConfig,
}

impl AssistantConfigBuilder {
    pub fn index_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.index_root = dir.into();
        self
    }

    pub fn upload_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.upload_root = dir.into();
        self
    }

    /// Put both roots under one data directory.
    pub fn data_dir(self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        self.index_root(dir.join("indexes")).upload_root(dir.join("uploads"))
    }

    pub fn rag(mut self, rag: RagConfig) -> Self {
        self.config.rag = rag;
        self
    }

    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.rag.chunk_size = size;
        self
    }

    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.rag.chunk_overlap = overlap;
        self
    }

    pub fn top_k(mut self, k: usize) -> Self {
        self.config.rag.top_k = k;
        self
    }

    pub fn generation(mut self, params: GenerationParams) -> Self {
        self.config.generation = params;
        self
    }

    pub fn model(mut self, model: Model) -> Self {
        self.config.generation.model = model;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.generation.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.config.generation.max_tokens = Some(max_tokens);
        self
    }

    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    /// Validate and return the configuration.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Rag`] for inconsistent chunking or retrieval settings,
    /// [`ConfigError::Invalid`] for out-of-range generation parameters or a zero
    /// upload limit.
    pub fn build(self) -> Result<AssistantConfig, ConfigError> {
        self.config.rag.validate()?;

        let generation = &self.config.generation;
        let mut params = GenerationParams::builder().model(generation.model.clone());
        if let Some(temperature) = generation.temperature {
            params = params.temperature(temperature);
        }
        if let Some(max_tokens) = generation.max_tokens {
            params = params.max_tokens(max_tokens);
        }
        params.build().map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.config.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid("max_upload_bytes must be greater than zero".into()));
        }
        Ok(self.config)
    }
}
