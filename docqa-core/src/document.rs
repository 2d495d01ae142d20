//! Data types for documents, chunks, and retrieval results.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Plain text extracted from an uploaded file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Identifier derived from the source file name.
    pub id: String,
    /// The extracted text.
    pub text: String,
    /// Path of the file the text was extracted from.
    pub source: PathBuf,
    /// Extraction metadata (`source`, `file_type`, `page_count`, ...).
    pub metadata: HashMap<String, String>,
}

impl Document {
    /// Create a document for `source`, deriving its ID from the file name and
    /// recording the path under the `source` metadata key.
    pub fn new(source: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        let source = source.into();
        let id = document_id_for(&source);
        let mut metadata = HashMap::new();
        metadata.insert("source".to_string(), source.display().to_string());
        Self { id, text: text.into(), source, metadata }
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Build a stable document ID from a file path: the lower-cased file name with
/// anything outside `[a-z0-9._-]` replaced by `-`.
pub fn document_id_for(path: &Path) -> String {
    let name = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
    let id: String = name
        .chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '-' }
        })
        .collect();
    if id.is_empty() { "document".to_string() } else { id }
}

/// A segment of a [`Document`], optionally carrying its embedding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// `{document_id}_{ordinal}`.
    pub id: String,
    /// The text content of the chunk.
    pub text: String,
    /// Position of the chunk within its document, starting at 0.
    pub ordinal: usize,
    /// The ID of the parent [`Document`].
    pub document_id: String,
    /// Metadata inherited from the parent document plus `chunk_index`.
    pub metadata: HashMap<String, String>,
    /// Embedding vector; empty until the chunk has been indexed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedding: Vec<f32>,
}

/// A retrieved [`Chunk`] paired with its score (higher is nearer).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredChunk {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// Similarity to the query under the index metric.
    pub score: f32,
}
