//! Per-user session state.

use std::path::PathBuf;
use std::sync::Arc;

use docqa_core::{Chunk, ConversationTurn, Document};
use docqa_rag::VectorIndex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a session has a document to answer questions about.
#[derive(Debug, Clone)]
pub enum SessionState {
    /// Nothing has been uploaded yet.
    Empty,
    /// A document has been processed and indexed.
    Ready {
        document: Arc<Document>,
        index: Arc<VectorIndex>,
    },
}

/// One user's conversation with the assistant.
///
/// Sessions are plain values; the [`Assistant`](crate::Assistant) mutates them
/// through `&mut` so each session has a single thread of control.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    pub(crate) state: SessionState,
    pub(crate) history: Vec<ConversationTurn>,
}

impl Session {
    pub(crate) fn new(id: Uuid) -> Self {
        Self { id, state: SessionState::Empty, history: Vec::new() }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, SessionState::Ready { .. })
    }

    /// The indexed document, if any.
    pub fn document(&self) -> Option<&Document> {
        match &self.state {
            SessionState::Ready { document, .. } => Some(document),
            SessionState::Empty => None,
        }
    }

    /// Turns in the order they were asked.
    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }
}

/// What a successful upload produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadSummary {
    pub document_id: String,
    pub file_name: String,
    /// Where the uploaded bytes were stored.
    pub stored_at: PathBuf,
    pub char_count: usize,
    pub chunk_count: usize,
}

/// Rebuild the document text from its chunks using their `start_char` offsets.
///
/// Chunks overlap, so each one contributes only the characters past what the
/// previous chunks already covered.
pub(crate) fn document_from_chunks(chunks: &[Chunk]) -> Option<Document> {
    let first = chunks.first()?;
    let mut ordered: Vec<&Chunk> = chunks.iter().collect();
    ordered.sort_by_key(|c| c.ordinal);

    let mut text = String::new();
    let mut covered = 0usize;
    for chunk in ordered {
        let start = chunk
            .metadata
            .get("start_char")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(covered);
        let skip = covered.saturating_sub(start);
        let added: String = chunk.text.chars().skip(skip).collect();
        covered = covered.max(start) + added.chars().count();
        text.push_str(&added);
    }

    let source = first.metadata.get("source").cloned().unwrap_or_else(|| first.document_id.clone());
    let mut document = Document::new(source, text);
    document.id = first.document_id.clone();
    for (key, value) in &first.metadata {
        if key != "chunk_index" && key != "start_char" {
            document.metadata.insert(key.clone(), value.clone());
        }
    }
    Some(document)
}
