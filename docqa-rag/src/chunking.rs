//! Document chunking.
//!
//! [`FixedSizeChunker`] slides a window of `chunk_size` characters across the
//! text, advancing by `chunk_size - chunk_overlap`, and stops as soon as a
//! window reaches the end of the text. Sizes are counted in `char`s so a chunk
//! boundary never falls inside a multi-byte code point.

use docqa_core::{Chunk, Document, SplitError};

use crate::config::RagConfig;
use crate::error::{RagError, Result};

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s with text, ordinal and metadata but no
/// embeddings. Embeddings are attached later by the index builder.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// # Errors
    ///
    /// Returns [`SplitError::EmptyDocument`] when the text is empty or
    /// whitespace-only.
    fn chunk(&self, document: &Document) -> std::result::Result<Vec<Chunk>, SplitError>;

    /// Split several documents, keeping document order. Ordinals restart at
    /// zero for each document.
    fn chunk_all(&self, documents: &[Document]) -> std::result::Result<Vec<Chunk>, SplitError> {
        let mut chunks = Vec::new();
        for document in documents {
            chunks.extend(self.chunk(document)?);
        }
        Ok(chunks)
    }
}

/// Splits text into fixed-size chunks by character count with configurable overlap.
///
/// Chunk IDs are generated as `{document_id}_{ordinal}`. Each chunk inherits
/// the parent document's metadata plus `chunk_index` and `start_char`.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{Chunker, FixedSizeChunker};
///
/// let chunker = FixedSizeChunker::new(4, 0)?;
/// let chunks = chunker.chunk(&Document::new("abc.txt", "A. B. C."))?;
/// assert_eq!(chunks[0].text, "A. B");
/// assert_eq!(chunks[1].text, ". C.");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] unless `chunk_size > 0` and
    /// `chunk_overlap < chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RagError::ConfigError("chunk_size must be greater than zero".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self { chunk_size, chunk_overlap })
    }

    /// Create a chunker from the sizes in a [`RagConfig`].
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }
}

/// Character windows of `text` as `(start_char, slice)` pairs.
fn split_windows(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<(usize, &str)> {
    // byte offset of every char boundary, including the end of the text
    let offsets: Vec<usize> =
        text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
    let len = offsets.len() - 1;
    let step = chunk_size - chunk_overlap;

    let mut windows = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + chunk_size).min(len);
        windows.push((start, &text[offsets[start]..offsets[end]]));
        if end == len {
            break;
        }
        start += step;
    }
    windows
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, document: &Document) -> std::result::Result<Vec<Chunk>, SplitError> {
        if document.text.trim().is_empty() {
            return Err(SplitError::EmptyDocument { document_id: document.id.clone() });
        }

        let chunks = split_windows(&document.text, self.chunk_size, self.chunk_overlap)
            .into_iter()
            .enumerate()
            .map(|(ordinal, (start_char, text))| {
                let mut metadata = document.metadata.clone();
                metadata.insert("chunk_index".to_string(), ordinal.to_string());
                metadata.insert("start_char".to_string(), start_char.to_string());
                Chunk {
                    id: format!("{}_{ordinal}", document.id),
                    text: text.to_string(),
                    ordinal,
                    document_id: document.id.clone(),
                    metadata,
                    embedding: Vec::new(),
                }
            })
            .collect();

        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> Document {
        Document::new("/uploads/sample.txt", text)
    }

    #[test]
    fn splits_example_without_overlap() {
        let chunker = FixedSizeChunker::new(4, 0).unwrap();
        let chunks = chunker.chunk(&doc("A. B. C.")).unwrap();
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["A. B", ". C."]);
        assert_eq!(chunks[1].id, "sample.txt_1");
        assert_eq!(chunks[1].ordinal, 1);
        assert_eq!(chunks[1].metadata.get("start_char").map(String::as_str), Some("4"));
        assert_eq!(chunks[1].metadata.get("source").map(String::as_str), Some("/uploads/sample.txt"));
    }

    #[test]
    fn stops_once_window_reaches_end() {
        let chunker = FixedSizeChunker::new(4, 2).unwrap();
        let chunks = chunker.chunk(&doc("abcdefghij")).unwrap();
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["abcd", "cdef", "efgh", "ghij"]);
    }

    #[test]
    fn final_chunk_may_be_short() {
        let chunker = FixedSizeChunker::new(4, 1).unwrap();
        let texts: Vec<String> =
            chunker.chunk(&doc("abcdefgh")).unwrap().into_iter().map(|c| c.text).collect();
        assert_eq!(texts, vec!["abcd", "defg", "gh"]);
    }

    #[test]
    fn short_text_is_single_chunk() {
        let chunker = FixedSizeChunker::new(100, 10).unwrap();
        let chunks = chunker.chunk(&doc("tiny")).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "tiny");
    }

    #[test]
    fn counts_characters_not_bytes() {
        let chunker = FixedSizeChunker::new(3, 0).unwrap();
        let texts: Vec<String> =
            chunker.chunk(&doc("ééééé")).unwrap().into_iter().map(|c| c.text).collect();
        assert_eq!(texts, vec!["ééé", "éé"]);
    }

    #[test]
    fn whitespace_only_is_empty_document() {
        let chunker = FixedSizeChunker::new(10, 0).unwrap();
        for text in ["", "   \n\t "] {
            assert_eq!(
                chunker.chunk(&doc(text)),
                Err(SplitError::EmptyDocument { document_id: "sample.txt".into() })
            );
        }
    }

    #[test]
    fn invalid_sizes_are_rejected() {
        assert!(FixedSizeChunker::new(0, 0).is_err());
        assert!(FixedSizeChunker::new(5, 5).is_err());
        assert!(FixedSizeChunker::new(5, 4).is_ok());
    }

    #[test]
    fn chunk_all_keeps_document_order() {
        let chunker = FixedSizeChunker::new(3, 0).unwrap();
        let docs = vec![Document::new("a.txt", "aaaaa"), Document::new("b.txt", "bb")];
        let chunks = chunker.chunk_all(&docs).unwrap();
        let ids: Vec<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a.txt_0", "a.txt_1", "b.txt_0"]);
    }
}
