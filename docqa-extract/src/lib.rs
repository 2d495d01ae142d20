//! # docqa-extract
//!
//! Turns uploaded files into plain-text [`Document`](docqa_core::Document)s.
//!
//! | Extractor | Extension | Notes |
//! |-----------|-----------|-------|
//! | [`PdfExtractor`] | `.pdf` | Page by page via `lopdf`; blank pages are skipped |
//! | [`TextExtractor`] | `.txt` | Strict UTF-8 |
//! | [`DocxExtractor`] | `.docx` | Paragraphs of `word/document.xml` |
//!
//! Extractors are looked up by file extension through an [`ExtractorRegistry`]:
//!
//! ```rust,ignore
//! use docqa_extract::ExtractorRegistry;
//!
//! let registry = ExtractorRegistry::with_defaults();
//! let document = registry.extract(Path::new("report.pdf")).await?;
//! ```

pub mod docx;
pub mod pdf;
pub mod registry;
pub mod text;

pub use docx::DocxExtractor;
pub use pdf::PdfExtractor;
pub use registry::{Extractor, ExtractorRegistry};
pub use text::TextExtractor;

use std::path::Path;

use docqa_core::ExtractionError;

/// Read a whole file, mapping failures to [`ExtractionError::Io`].
pub(crate) async fn read_file(path: &Path) -> Result<Vec<u8>, ExtractionError> {
    tokio::fs::read(path)
        .await
        .map_err(|source| ExtractionError::Io { path: path.to_path_buf(), source })
}
