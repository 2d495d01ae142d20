//! PDF extractor.
//!
//! Uses `lopdf` to walk the page tree and extract text page by page, so a
//! page without a text layer (a scan, a blank separator) is skipped instead of
//! failing the whole document.

use std::path::Path;

use async_trait::async_trait;
use docqa_core::{Document, ExtractionError};
use tracing::debug;

use crate::read_file;
use crate::registry::Extractor;

/// Extractor for `.pdf` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

/// Text of each page, in page order. Pages without text are empty strings.
struct PdfPages {
    pages: Vec<String>,
}

impl PdfPages {
    /// Join pages that produced text with `\n`.
    fn joined(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl Extractor for PdfExtractor {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn extensions(&self) -> &[&'static str] {
        &["pdf"]
    }

    async fn extract(&self, path: &Path) -> Result<Document, ExtractionError> {
        let bytes = read_file(path).await?;
        let malformed = |message: String| ExtractionError::Malformed {
            format: "PDF",
            path: path.to_path_buf(),
            message,
        };

        // lopdf parsing is CPU bound
        let pages = tokio::task::spawn_blocking(move || extract_pages(&bytes))
            .await
            .map_err(|e| malformed(format!("extraction task failed: {e}")))?
            .map_err(malformed)?;

        let text = pages.joined();
        if text.is_empty() {
            return Err(ExtractionError::EmptyContent { path: path.to_path_buf() });
        }

        Ok(Document::new(path, text)
            .with_metadata("file_type", "pdf")
            .with_metadata("page_count", pages.pages.len().to_string()))
    }
}

fn extract_pages(bytes: &[u8]) -> Result<PdfPages, String> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| e.to_string())?;

    let mut pages = Vec::new();
    for page_number in doc.get_pages().into_keys() {
        match doc.extract_text(&[page_number]) {
            Ok(text) => pages.push(text),
            Err(e) => {
                debug!(page = page_number, error = %e, "page has no extractable text");
                pages.push(String::new());
            }
        }
    }

    Ok(PdfPages { pages })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};
    use tempfile::tempdir;

    /// Build a PDF with one page per entry; `None` produces a page without text.
    fn build_pdf(pages: &[Option<&str>]) -> Vec<u8> {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            let operations = match text {
                Some(text) => vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
                None => vec![],
            };
            let content = Content { operations };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[tokio::test]
    async fn extracts_pages_in_order_skipping_blank_ones() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, build_pdf(&[Some("Alpha page"), None, Some("Omega page")])).unwrap();

        let doc = PdfExtractor.extract(&path).await.unwrap();
        let alpha = doc.text.find("Alpha").expect("first page text");
        let omega = doc.text.find("Omega").expect("last page text");
        assert!(alpha < omega);
        assert!(doc.text.contains('\n'));
        assert_eq!(doc.metadata.get("page_count").map(String::as_str), Some("3"));
        assert_eq!(doc.metadata.get("file_type").map(String::as_str), Some("pdf"));
    }

    #[tokio::test]
    async fn all_blank_pages_is_empty_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scan.pdf");
        std::fs::write(&path, build_pdf(&[None, None])).unwrap();

        let err = PdfExtractor.extract(&path).await.unwrap_err();
        assert!(matches!(err, ExtractionError::EmptyContent { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn garbage_bytes_are_malformed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        std::fs::write(&path, b"this is not a pdf").unwrap();

        let err = PdfExtractor.extract(&path).await.unwrap_err();
        assert!(matches!(err, ExtractionError::Malformed { format: "PDF", .. }), "got {err:?}");
    }

    #[test]
    fn joined_trims_and_drops_empty_pages() {
        let pages = PdfPages { pages: vec!["one\n".into(), "  ".into(), String::new(), "two".into()] };
        assert_eq!(pages.joined(), "one\ntwo");
    }
}
