//! The persisted vector index.
//!
//! A [`VectorIndex`] holds every chunk of the indexed document together with
//! its embedding and answers nearest-neighbour queries by brute force. It is
//! persisted as a single JSON file inside the session's index directory and
//! replaced wholesale on every rebuild.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use docqa_core::{Chunk, IndexError, ScoredChunk};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Name of the index file inside an index directory.
pub const FILE_NAME: &str = "index.json";

/// On-disk format version written by this crate.
pub const FORMAT_VERSION: u32 = 1;

/// Distance used to rank chunks against a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Cosine similarity. Higher is nearer.
    #[default]
    Cosine,
    /// Euclidean distance, reported as its negation so higher is still nearer.
    L2,
}

impl DistanceMetric {
    /// Score `a` against `b`. Larger scores mean nearer vectors.
    pub fn score(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::Cosine => cosine_similarity(a, b),
            Self::L2 => {
                let sum: f32 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
                -sum.sqrt()
            }
        }
    }
}

fn persist(path: &Path) -> impl FnOnce(std::io::Error) -> IndexError + use<> {
    let path = path.to_path_buf();
    move |source| IndexError::Persist { path, source }
}

/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Embedded chunks of one document, searchable by vector similarity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectorIndex {
    version: u32,
    dimensions: usize,
    metric: DistanceMetric,
    document_ids: Vec<String>,
    chunks: Vec<Chunk>,
}

impl VectorIndex {
    /// Create an index from already-embedded chunks.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::EmptyInput`] if `chunks` is empty and
    /// [`IndexError::DimensionMismatch`] if any embedding is not `dimensions` long.
    pub fn new(
        chunks: Vec<Chunk>,
        dimensions: usize,
        metric: DistanceMetric,
    ) -> Result<Self, IndexError> {
        if chunks.is_empty() {
            return Err(IndexError::EmptyInput);
        }
        if let Some(bad) = chunks.iter().find(|c| c.embedding.len() != dimensions) {
            return Err(IndexError::DimensionMismatch {
                expected: dimensions,
                actual: bad.embedding.len(),
            });
        }

        let mut document_ids: Vec<String> = Vec::new();
        for chunk in &chunks {
            if !document_ids.contains(&chunk.document_id) {
                document_ids.push(chunk.document_id.clone());
            }
        }

        Ok(Self { version: FORMAT_VERSION, dimensions, metric, document_ids, chunks })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// IDs of the documents whose chunks are in the index.
    pub fn document_ids(&self) -> &[String] {
        &self.document_ids
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Return at most `top_k` distinct chunks, nearest first. Ties are broken
    /// by chunk ordinal so results are deterministic.
    pub fn search(&self, query: &[f32], top_k: usize) -> Vec<ScoredChunk> {
        let mut scored: Vec<ScoredChunk> = self
            .chunks
            .iter()
            .map(|chunk| ScoredChunk {
                score: self.metric.score(&chunk.embedding, query),
                chunk: chunk.clone(),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.chunk.ordinal.cmp(&b.chunk.ordinal))
        });
        scored.truncate(top_k);
        scored
    }

    /// Path of the index file inside `dir`.
    pub fn file_path(dir: &Path) -> PathBuf {
        dir.join(FILE_NAME)
    }

    /// Write the index into `dir`, creating the directory if needed.
    ///
    /// The file is written next to its final location and renamed into place,
    /// so a reader never observes a half-written index.
    pub async fn save(&self, dir: &Path) -> Result<(), IndexError> {
        tokio::fs::create_dir_all(dir).await.map_err(persist(dir))?;

        let target = Self::file_path(dir);
        let tmp = dir.join(format!("{FILE_NAME}.tmp"));
        let bytes = serde_json::to_vec(self).map_err(|e| IndexError::Persist {
            path: target.clone(),
            source: std::io::Error::other(e),
        })?;

        tokio::fs::write(&tmp, bytes).await.map_err(persist(&tmp))?;
        tokio::fs::rename(&tmp, &target).await.map_err(persist(&target))?;

        debug!(path = %target.display(), chunks = self.len(), "index persisted");
        Ok(())
    }

    /// Load the index persisted in `dir`.
    ///
    /// # Errors
    ///
    /// [`IndexError::NotFound`] when `dir` holds no index file, and
    /// [`IndexError::Corrupt`] when the file cannot be parsed or is inconsistent.
    pub async fn load(dir: &Path) -> Result<Self, IndexError> {
        let path = Self::file_path(dir);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(IndexError::NotFound { path: dir.to_path_buf() });
            }
            Err(e) => {
                return Err(IndexError::Corrupt { path, message: e.to_string() });
            }
        };

        let index: Self = serde_json::from_slice(&bytes)
            .map_err(|e| IndexError::Corrupt { path: path.clone(), message: e.to_string() })?;

        if index.version != FORMAT_VERSION {
            return Err(IndexError::Corrupt {
                path,
                message: format!("unsupported format version {}", index.version),
            });
        }
        if index.chunks.is_empty() {
            return Err(IndexError::Corrupt { path, message: "index has no chunks".to_string() });
        }
        if let Some(bad) = index.chunks.iter().find(|c| c.embedding.len() != index.dimensions) {
            return Err(IndexError::Corrupt {
                path,
                message: format!(
                    "chunk '{}' has {} dimensions, expected {}",
                    bad.id,
                    bad.embedding.len(),
                    index.dimensions
                ),
            });
        }

        debug!(path = %path.display(), chunks = index.len(), "index loaded");
        Ok(index)
    }
}
