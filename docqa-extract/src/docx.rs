//! DOCX (Office Open XML word-processing) extractor.

use std::io::{Cursor, Read};
use std::path::Path;

use async_trait::async_trait;
use docqa_core::{Document, ExtractionError};
use quick_xml::Reader;
use quick_xml::events::Event;
use zip::ZipArchive;

use crate::read_file;
use crate::registry::Extractor;

const DOCUMENT_PART: &str = "word/document.xml";

/// Extractor for `.docx` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxExtractor;

impl DocxExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Extractor for DocxExtractor {
    fn name(&self) -> &'static str {
        "docx"
    }

    fn extensions(&self) -> &[&'static str] {
        &["docx"]
    }

    async fn extract(&self, path: &Path) -> Result<Document, ExtractionError> {
        let bytes = read_file(path).await?;
        let malformed = |message: String| ExtractionError::Malformed {
            format: "DOCX",
            path: path.to_path_buf(),
            message,
        };

        let paragraphs = tokio::task::spawn_blocking(move || read_paragraphs(&bytes))
            .await
            .map_err(|e| malformed(format!("extraction task failed: {e}")))?
            .map_err(malformed)?;

        let text = paragraphs.join("\n");
        if text.trim().is_empty() {
            return Err(ExtractionError::EmptyContent { path: path.to_path_buf() });
        }

        Ok(Document::new(path, text)
            .with_metadata("file_type", "docx")
            .with_metadata("paragraph_count", paragraphs.len().to_string()))
    }
}

fn read_paragraphs(bytes: &[u8]) -> Result<Vec<String>, String> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| format!("not a zip archive: {e}"))?;
    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| format!("missing {DOCUMENT_PART}: {e}"))?
        .read_to_string(&mut xml)
        .map_err(|e| format!("unreadable {DOCUMENT_PART}: {e}"))?;
    paragraphs_from_xml(&xml)
}

/// Collect the text of every `w:p` element.
///
/// Only run text (`w:t`) is kept; `w:tab` becomes a tab and `w:br`/`w:cr` a
/// line break. Field instructions and other markup are ignored. A paragraph
/// nested in another one (text boxes) is emitted when it closes, before the
/// paragraph that contains it.
pub fn paragraphs_from_xml(xml: &str) -> Result<Vec<String>, String> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut open: Vec<String> = Vec::new();
    let mut in_text = false;

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"p" => open.push(String::new()),
                b"t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"p" => paragraphs.push(String::new()),
                b"tab" => push_char(&mut open, '\t'),
                b"br" | b"cr" => push_char(&mut open, '\n'),
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"p" => paragraphs.extend(open.pop()),
                b"t" => in_text = false,
                _ => {}
            },
            Event::Text(t) if in_text => {
                let text = t.unescape().map_err(|e| e.to_string())?;
                if let Some(paragraph) = open.last_mut() {
                    paragraph.push_str(&text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

fn push_char(open: &mut [String], c: char) {
    if let Some(paragraph) = open.last_mut() {
        paragraph.push(c);
    }
}
