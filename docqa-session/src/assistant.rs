//! The upload and question loop.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use docqa_core::{
    AnswerGenerator, ConversationTurn, Document, EmbeddingProvider, IndexError, join_context,
};
use docqa_extract::ExtractorRegistry;
use docqa_rag::{Chunker, FixedSizeChunker, IndexBuilder, Retriever, RetryPolicy, VectorIndex};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::AssistantConfig;
use crate::error::{AskError, ConfigError, UploadError};
use crate::session::{Session, SessionState, UploadSummary, document_from_chunks};
use crate::store::{StagedUpload, UploadStore, sanitize_file_name};

/// Orchestrates extraction, indexing, retrieval and generation for sessions.
///
/// The assistant holds only shared, read-only components. All per-user state
/// lives in the [`Session`] values passed to it.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_session::{Assistant, AssistantConfig};
///
/// let assistant = Assistant::builder()
///     .config(AssistantConfig::from_env()?)
///     .embedder(Arc::new(embedder))
///     .generator(Arc::new(generator))
///     .build()?;
///
/// let mut session = assistant.create_session();
/// assistant.process_upload(&mut session, "report.pdf", &bytes).await?;
/// let turn = assistant.ask(&mut session, "What is this about?").await?;
/// ```
pub struct Assistant {
    config: AssistantConfig,
    registry: ExtractorRegistry,
    chunker: Arc<dyn Chunker>,
    embedder: Arc<dyn EmbeddingProvider>,
    index_builder: IndexBuilder,
    generator: Arc<dyn AnswerGenerator>,
    store: UploadStore,
}

impl Assistant {
    pub fn builder() -> AssistantBuilder {
        AssistantBuilder::default()
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    pub fn registry(&self) -> &ExtractorRegistry {
        &self.registry
    }

    /// Start a new session with no document.
    pub fn create_session(&self) -> Session {
        let session = Session::new(Uuid::new_v4());
        info!(session.id = %session.id(), "session created");
        session
    }

    /// Directory holding the persisted index of `session_id`.
    pub fn index_dir(&self, session_id: Uuid) -> PathBuf {
        self.config.index_root.join(session_id.to_string())
    }

    /// Reopen a session from the index persisted by an earlier run.
    ///
    /// The session comes back `Ready` with an empty history.
    pub async fn restore_session(&self, session_id: Uuid) -> Result<Session, UploadError> {
        let dir = self.index_dir(session_id);
        let index = VectorIndex::load(&dir).await?;
        if index.dimensions() != self.embedder.dimensions() {
            return Err(IndexError::DimensionMismatch {
                expected: self.embedder.dimensions(),
                actual: index.dimensions(),
            }
            .into());
        }
        let document = document_from_chunks(index.chunks()).ok_or(IndexError::EmptyInput)?;

        let mut session = Session::new(session_id);
        session.state =
            SessionState::Ready { document: Arc::new(document), index: Arc::new(index) };
        info!(session.id = %session_id, "session restored");
        Ok(session)
    }

    /// Store, extract, split and index an uploaded file, then make it the
    /// session's document.
    ///
    /// On any error the session keeps its previous state and index.
    #[instrument(skip_all, fields(session.id = %session.id(), file_name = file_name, bytes = bytes.len()), err)]
    pub async fn process_upload(
        &self,
        session: &mut Session,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<UploadSummary, UploadError> {
        let name = sanitize_file_name(file_name)
            .ok_or_else(|| UploadError::InvalidFileName(file_name.to_string()))?;
        self.registry.check(Path::new(&name))?;

        let staged = self.store.stage(session.id(), &name, bytes).await?;
        let (document, index, chunk_count) = match self.index_upload(session.id(), &staged).await {
            Ok(built) => built,
            Err(e) => {
                self.store.discard(staged).await;
                return Err(e);
            }
        };
        let stored_at = self.store.commit(staged).await?;

        let summary = UploadSummary {
            document_id: document.id.clone(),
            file_name: name,
            stored_at,
            char_count: document.text.chars().count(),
            chunk_count,
        };
        session.state =
            SessionState::Ready { document: Arc::new(document), index: Arc::new(index) };

        info!(document.id = %summary.document_id, chunk_count, "document processed");
        Ok(summary)
    }

    /// Extract, split and index a staged upload under its final path.
    async fn index_upload(
        &self,
        session_id: Uuid,
        staged: &StagedUpload,
    ) -> Result<(Document, VectorIndex, usize), UploadError> {
        let mut document = self.registry.extract(staged.path()).await?;
        document.source = staged.target().to_path_buf();
        document.metadata.insert("source".to_string(), staged.target().display().to_string());

        let chunks = self.chunker.chunk(&document)?;
        let chunk_count = chunks.len();
        let index = self.index_builder.build(chunks, &self.index_dir(session_id)).await?;
        Ok((document, index, chunk_count))
    }

    /// Answer `question` against the session's document and append the turn.
    ///
    /// Retrieval and generation failures do not return an error: the turn is
    /// recorded as failed with the error message as its answer.
    pub async fn ask<'s>(
        &self,
        session: &'s mut Session,
        question: &str,
    ) -> Result<&'s ConversationTurn, AskError> {
        let index = match &session.state {
            SessionState::Empty => return Err(AskError::NoDocument),
            SessionState::Ready { index, .. } => Arc::clone(index),
        };
        let question = question.trim();
        if question.is_empty() {
            return Err(AskError::EmptyQuestion);
        }

        let order = session.history.len();
        let retriever = Retriever::from_config(index, Arc::clone(&self.embedder), &self.config.rag);

        let turn = match retriever.retrieve(question).await {
            Err(e) => {
                warn!(session.id = %session.id(), error = %e, "retrieval failed");
                ConversationTurn::failed(order, question, e)
            }
            Ok(context) => {
                let context = join_context(&context);
                match self.generator.answer(&context, question, &self.config.generation).await {
                    Ok(answer) => ConversationTurn::answered(order, question, answer),
                    Err(e) => {
                        warn!(session.id = %session.id(), error = %e, "generation failed");
                        ConversationTurn::failed(order, question, e)
                    }
                }
            }
        };

        info!(session.id = %session.id(), order, failed = turn.is_failed(), "question answered");
        session.history.push(turn);
        Ok(&session.history[order])
    }

    /// Delete everything persisted for `session_id`.
    pub async fn discard_session(&self, session_id: Uuid) -> Result<(), UploadError> {
        self.store.remove_session(session_id).await?;
        let dir = self.index_dir(session_id);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => return Err(UploadError::Storage { path: dir, source }),
        }
        info!(session.id = %session_id, "session discarded");
        Ok(())
    }
}

/// Builder for [`Assistant`].
///
/// `embedder` and `generator` are required. The registry defaults to the
/// PDF, TXT and DOCX extractors and the chunker to a [`FixedSizeChunker`]
/// using the configured sizes.
#[derive(Default)]
pub struct AssistantBuilder {
    config: Option<AssistantConfig>,
    registry: Option<ExtractorRegistry>,
    chunker: Option<Arc<dyn Chunker>>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    generator: Option<Arc<dyn AnswerGenerator>>,
    retry: Option<RetryPolicy>,
}

impl AssistantBuilder {
    pub fn config(mut self, config: AssistantConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn registry(mut self, registry: ExtractorRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    pub fn embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn generator(mut self, generator: Arc<dyn AnswerGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Backoff used when the embedding provider rate limits.
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    /// # Errors
    ///
    /// [`ConfigError::Missing`] when the embedder or generator is not set, and
    /// [`ConfigError::Rag`] when the chunk sizes are inconsistent.
    pub fn build(self) -> Result<Assistant, ConfigError> {
        let config = self.config.unwrap_or_default();
        let embedder = self.embedder.ok_or(ConfigError::Missing("embedder"))?;
        let generator = self.generator.ok_or(ConfigError::Missing("generator"))?;
        let chunker = match self.chunker {
            Some(chunker) => chunker,
            None => Arc::new(FixedSizeChunker::from_config(&config.rag)?),
        };
        let index_builder = IndexBuilder::new(Arc::clone(&embedder))
            .with_metric(config.rag.metric)
            .with_retry(self.retry.unwrap_or_default());

        Ok(Assistant {
            registry: self.registry.unwrap_or_else(ExtractorRegistry::with_defaults),
            store: UploadStore::new(&config.upload_root),
            chunker,
            embedder,
            index_builder,
            generator,
            config,
        })
    }
}
