//! Plain-text extractor.

use std::path::Path;

use async_trait::async_trait;
use docqa_core::{Document, ExtractionError};

use crate::read_file;
use crate::registry::Extractor;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Extractor for UTF-8 `.txt` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextExtractor;

impl TextExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Extractor for TextExtractor {
    fn name(&self) -> &'static str {
        "text"
    }

    fn extensions(&self) -> &[&'static str] {
        &["txt"]
    }

    async fn extract(&self, path: &Path) -> Result<Document, ExtractionError> {
        let bytes = read_file(path).await?;
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes);

        let text = std::str::from_utf8(bytes).map_err(|e| ExtractionError::EncodingError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        if text.is_empty() {
            return Err(ExtractionError::EmptyContent { path: path.to_path_buf() });
        }

        Ok(Document::new(path, text).with_metadata("file_type", "txt"))
    }
}
