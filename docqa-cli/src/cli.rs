//! Command-line arguments and assistant construction.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use docqa_core::{EmbeddingProvider, Model};
use docqa_gemini::{GeminiClient, GeminiGenerator};
use docqa_rag::{GeminiEmbeddingProvider, HashingEmbeddingProvider};
use docqa_session::{Assistant, AssistantConfig};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "docqa")]
#[command(about = "Ask questions about a PDF, TXT or DOCX document")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub options: AssistantOptions,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive chat in the terminal
    Chat {
        /// Document to process before the first question
        file: Option<PathBuf>,
    },

    /// Serve the HTTP API
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(short, long, default_value_t = 8099)]
        port: u16,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum EmbedderKind {
    /// Gemini embedding API
    #[default]
    Gemini,
    /// Local feature hashing, no network access
    Hashing,
}

/// Overrides for settings otherwise read from `DOCQA_*` and `GEMINI_API_KEY`.
#[derive(clap::Args, Debug, Default)]
pub struct AssistantOptions {
    /// Gemini API key
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Directory for persisted indexes
    #[arg(long, global = true)]
    pub index_dir: Option<PathBuf>,

    /// Directory for uploaded files
    #[arg(long, global = true)]
    pub upload_dir: Option<PathBuf>,

    /// Chunk size in characters
    #[arg(long, global = true)]
    pub chunk_size: Option<usize>,

    /// Overlap between chunks in characters
    #[arg(long, global = true)]
    pub chunk_overlap: Option<usize>,

    /// Chunks retrieved per question
    #[arg(long, global = true)]
    pub top_k: Option<usize>,

    /// Generation model, e.g. gemini-2.0-flash
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Sampling temperature in [0, 1]
    #[arg(long, global = true)]
    pub temperature: Option<f32>,

    #[arg(long, global = true, value_enum, default_value_t = EmbedderKind::Gemini)]
    pub embedder: EmbedderKind,
}

impl AssistantOptions {
    /// Environment configuration with command-line overrides applied.
    pub fn config(&self) -> Result<AssistantConfig> {
        let mut builder = AssistantConfig::from_env()
            .context("invalid DOCQA_* environment configuration")?
            .into_builder();

        if let Some(key) = &self.api_key {
            builder = builder.api_key(key.clone());
        }
        if let Some(dir) = &self.index_dir {
            builder = builder.index_root(dir.clone());
        }
        if let Some(dir) = &self.upload_dir {
            builder = builder.upload_root(dir.clone());
        }
        if let Some(size) = self.chunk_size {
            builder = builder.chunk_size(size);
        }
        if let Some(overlap) = self.chunk_overlap {
            builder = builder.chunk_overlap(overlap);
        }
        if let Some(k) = self.top_k {
            builder = builder.top_k(k);
        }
        if let Some(model) = &self.model {
            builder = builder.model(Model::from(model.as_str()));
        }
        if let Some(temperature) = self.temperature {
            builder = builder.temperature(temperature);
        }

        builder.build().context("invalid configuration")
    }

    /// Build the assistant with a Gemini generator and the selected embedder.
    pub fn assistant(&self) -> Result<Assistant> {
        let config = self.config()?;
        let api_key = config.require_api_key()?.to_string();

        let client = GeminiClient::new(&api_key).context("failed to create Gemini client")?;
        let embedder: Arc<dyn EmbeddingProvider> = match self.embedder {
            EmbedderKind::Gemini => Arc::new(GeminiEmbeddingProvider::from_client(client.clone())),
            EmbedderKind::Hashing => Arc::new(HashingEmbeddingProvider::default()),
        };

        info!(
            embedder = embedder.name(),
            model = %config.generation.model,
            index_root = %config.index_root.display(),
            "assistant configured"
        );

        Assistant::builder()
            .config(config)
            .embedder(embedder)
            .generator(Arc::new(GeminiGenerator::new(client)))
            .build()
            .context("failed to build assistant")
    }
}
