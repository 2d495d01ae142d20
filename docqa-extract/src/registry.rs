//! Extension-keyed registry of content extractors.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use docqa_core::{Document, ExtractionError};
use tracing::{debug, info};

use crate::{DocxExtractor, PdfExtractor, TextExtractor};

/// A reader that turns one family of file formats into a [`Document`].
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Lower-case file extensions (without the dot) this extractor handles.
    fn extensions(&self) -> &[&'static str];

    /// Extract the text of the file at `path`.
    async fn extract(&self, path: &Path) -> Result<Document, ExtractionError>;
}

/// Routes files to extractors by extension.
#[derive(Default, Clone)]
pub struct ExtractorRegistry {
    by_extension: HashMap<String, Arc<dyn Extractor>>,
}

impl ExtractorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the PDF, plain-text and DOCX extractors.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(PdfExtractor::new());
        registry.register(TextExtractor::new());
        registry.register(DocxExtractor::new());
        registry
    }

    /// Register an extractor for every extension it declares. A later
    /// registration for the same extension replaces the earlier one.
    pub fn register<E: Extractor + 'static>(&mut self, extractor: E) {
        let extractor: Arc<dyn Extractor> = Arc::new(extractor);
        for ext in extractor.extensions() {
            self.by_extension.insert(ext.to_ascii_lowercase(), Arc::clone(&extractor));
        }
    }

    /// Look up the extractor for an extension (case-insensitive, no dot).
    pub fn get(&self, extension: &str) -> Option<Arc<dyn Extractor>> {
        self.by_extension.get(&extension.to_ascii_lowercase()).cloned()
    }

    /// Sorted list of accepted extensions.
    pub fn allowed_extensions(&self) -> Vec<String> {
        let mut exts: Vec<String> = self.by_extension.keys().cloned().collect();
        exts.sort();
        exts
    }

    /// Whether a file name has an accepted extension.
    pub fn supports(&self, path: &Path) -> bool {
        self.get(&extension_of(path)).is_some()
    }

    /// Check the extension of `path` without touching the file.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::UnsupportedType`] naming the allowed set.
    pub fn check(&self, path: &Path) -> Result<Arc<dyn Extractor>, ExtractionError> {
        let extension = extension_of(path);
        self.get(&extension).ok_or_else(|| ExtractionError::UnsupportedType {
            extension,
            allowed: self.allowed_extensions().join(", "),
        })
    }

    /// Extract the file at `path` with the extractor registered for its extension.
    pub async fn extract(&self, path: &Path) -> Result<Document, ExtractionError> {
        let extractor = self.check(path)?;
        debug!(extractor = extractor.name(), path = %path.display(), "extracting document");
        let document = extractor.extract(path).await?;
        info!(
            document.id = %document.id,
            extractor = extractor.name(),
            text_len = document.text.len(),
            "extracted document"
        );
        Ok(document)
    }
}

fn extension_of(path: &Path) -> String {
    path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_cover_pdf_txt_docx() {
        let registry = ExtractorRegistry::with_defaults();
        assert_eq!(registry.allowed_extensions(), vec!["docx", "pdf", "txt"]);
        assert!(registry.supports(Path::new("a/b/REPORT.PDF")));
        assert!(!registry.supports(Path::new("sheet.xlsx")));
        assert!(!registry.supports(Path::new("no_extension")));
    }

    #[tokio::test]
    async fn unsupported_extension_names_allowed_set() {
        let registry = ExtractorRegistry::with_defaults();
        let err = registry.extract(Path::new("/nonexistent/data.csv")).await.unwrap_err();
        match err {
            ExtractionError::UnsupportedType { extension, allowed } => {
                assert_eq!(extension, "csv");
                assert_eq!(allowed, "docx, pdf, txt");
            }
            other => panic!("expected UnsupportedType, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_registry_rejects_everything() {
        let registry = ExtractorRegistry::new();
        let err = registry.extract(Path::new("notes.txt")).await.unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedType { ref allowed, .. } if allowed.is_empty()));
    }

    #[tokio::test]
    async fn dispatches_by_extension_case_insensitively() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("NOTES.TXT");
        std::fs::write(&path, "Hello, world!").unwrap();

        let registry = ExtractorRegistry::with_defaults();
        let document = registry.extract(&path).await.unwrap();
        assert_eq!(document.text, "Hello, world!");
        assert_eq!(document.metadata.get("file_type").map(String::as_str), Some("txt"));
    }
}
