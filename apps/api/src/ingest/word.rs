//! Word-document raw text.
//!
//! `WordTextExtractor` is the seam for whatever raw-text capability is plugged in.
//! The default reads the `word/document.xml` part of a `.docx` package and keeps only
//! the visible run text, one blank line between paragraphs.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use tracing::debug;

use crate::ingest::{is_cfb_container, is_zip_container, ExtractionError};

const DOCUMENT_PART: &str = "word/document.xml";

/// Raw-text extraction for word-processor documents. Output is returned unmodified
/// by the dispatcher apart from trimming.
pub trait WordTextExtractor: Send + Sync {
    fn extract_raw_text(&self, bytes: &[u8]) -> Result<String, ExtractionError>;
}

/// OOXML (`.docx`) reader built on `zip` + `quick-xml`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocxTextExtractor;

impl WordTextExtractor for DocxTextExtractor {
    fn extract_raw_text(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        if is_cfb_container(bytes) {
            return Err(ExtractionError::EncryptedOrCorruptSource(
                "document is a password-protected or legacy compound file".to_string(),
            ));
        }
        if !is_zip_container(bytes) {
            return Err(ExtractionError::UnsupportedFormat(
                "not a .docx package".to_string(),
            ));
        }

        let xml = read_document_part(bytes)?;
        let text = document_xml_to_text(&xml)?;
        debug!(chars = text.len(), "extracted docx text");
        Ok(text)
    }
}

fn read_document_part(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| {
        ExtractionError::EncryptedOrCorruptSource(format!("failed to open .docx archive: {e}"))
    })?;

    let mut part = match archive.by_name(DOCUMENT_PART) {
        Ok(part) => part,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(ExtractionError::UnsupportedFormat(format!(
                "archive has no {DOCUMENT_PART}; not a Word document"
            )))
        }
        Err(e) => {
            return Err(ExtractionError::EncryptedOrCorruptSource(format!(
                "failed to read {DOCUMENT_PART}: {e}"
            )))
        }
    };

    let mut xml = String::new();
    part.read_to_string(&mut xml).map_err(|e| {
        ExtractionError::EncryptedOrCorruptSource(format!("failed to read {DOCUMENT_PART}: {e}"))
    })?;
    Ok(xml)
}

/// Walks WordprocessingML and emits run text. `<w:tab/>` becomes a tab,
/// `<w:br/>`/`<w:cr/>` a newline, and each closed paragraph a blank line.
pub fn document_xml_to_text(xml: &str) -> Result<String, ExtractionError> {
    let mut reader = quick_xml::Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut out = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text = true;
                }
            }
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" => out.push('\t'),
                b"br" | b"cr" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) => {
                if in_text {
                    let txt = t.unescape().map_err(|e| {
                        ExtractionError::EncryptedOrCorruptSource(format!(
                            "malformed text in document.xml: {e}"
                        ))
                    })?;
                    out.push_str(&txt);
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => out.push_str("\n\n"),
                _ => {}
            },
            Ok(_) => {}
            Err(e) => {
                return Err(ExtractionError::EncryptedOrCorruptSource(format!(
                    "malformed document.xml at byte {}: {e}",
                    reader.buffer_position()
                )))
            }
        }
        buf.clear();
    }

    Ok(out)
}
