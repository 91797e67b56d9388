//! Document ingestion — turns uploaded binary documents into plain text suitable for prompting.
//!
//! Flow: `RawDocument` → `DocumentExtractor::extract_text` → (pdf | tabular | word | plain) → `ExtractedText`.
//! Every extractor returns raw text; the dispatcher is the only place that enforces the
//! non-empty invariant, so an `ExtractedText` always holds at least one visible character.

pub mod cjk;
pub mod dispatch;
pub mod handlers;
pub mod pdf;
pub mod plain;
pub mod tabular;
pub mod word;

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;

/// An uploaded file, fully materialized in memory. Owned by the caller; the
/// pipeline only reads from it.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub bytes: Bytes,
    pub name: String,
    pub content_type: Option<String>,
}

impl RawDocument {
    pub fn new(
        bytes: impl Into<Bytes>,
        name: impl Into<String>,
        content_type: Option<String>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            name: name.into(),
            content_type,
        }
    }

    /// Lowercased file-name suffix without the dot, if any.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    /// Lowercased declared MIME type with any parameters (`; charset=...`) removed.
    pub fn declared_type(&self) -> Option<String> {
        let raw = self.content_type.as_deref()?;
        let essence = raw.split(';').next().unwrap_or_default().trim();
        if essence.is_empty() {
            None
        } else {
            Some(essence.to_ascii_lowercase())
        }
    }
}

const CFB_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// OLE compound file: legacy `.doc`/`.xls`, or a password-protected OOXML package.
pub(crate) fn is_cfb_container(bytes: &[u8]) -> bool {
    bytes.starts_with(CFB_MAGIC)
}

/// Plain OOXML packages (`.docx`, `.xlsx`) are zip archives.
pub(crate) fn is_zip_container(bytes: &[u8]) -> bool {
    bytes.starts_with(ZIP_MAGIC)
}

/// Which extractor produced a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceFormat {
    Pdf,
    Word,
    Spreadsheet,
    DelimitedText,
    PlainText,
}

impl SourceFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFormat::Pdf => "pdf",
            SourceFormat::Word => "word",
            SourceFormat::Spreadsheet => "spreadsheet",
            SourceFormat::DelimitedText => "delimited-text",
            SourceFormat::PlainText => "plain-text",
        }
    }
}

/// Clean text pulled out of a document. Never blank.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedText {
    text: String,
    format: SourceFormat,
}

impl ExtractedText {
    /// Trims `raw` and rejects it with `EmptyContent` if nothing is left.
    pub(crate) fn new(raw: String, format: SourceFormat) -> Result<Self, ExtractionError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ExtractionError::EmptyContent(format!(
                "{} source produced no text",
                format.as_str()
            )));
        }
        let text = if trimmed.len() == raw.len() {
            raw
        } else {
            trimmed.to_string()
        };
        Ok(Self { text, format })
    }

    pub fn format(&self) -> SourceFormat {
        self.format
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// The first `max_chars` characters, cut on a char boundary. Used when the
    /// document is pasted into a prompt with a fixed context allowance.
    pub fn excerpt(&self, max_chars: usize) -> &str {
        match self.text.char_indices().nth(max_chars) {
            Some((byte_idx, _)) => &self.text[..byte_idx],
            None => &self.text,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Empty content: {0}")]
    EmptyContent(String),

    #[error("Encrypted or corrupt source: {0}")]
    EncryptedOrCorruptSource(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionErrorKind {
    UnsupportedFormat,
    EmptyContent,
    EncryptedOrCorruptSource,
}

impl ExtractionError {
    pub fn kind(&self) -> ExtractionErrorKind {
        match self {
            ExtractionError::UnsupportedFormat(_) => ExtractionErrorKind::UnsupportedFormat,
            ExtractionError::EmptyContent(_) => ExtractionErrorKind::EmptyContent,
            ExtractionError::EncryptedOrCorruptSource(_) => {
                ExtractionErrorKind::EncryptedOrCorruptSource
            }
        }
    }

    /// Message suitable for showing to the person who uploaded the file.
    pub fn user_message(&self) -> &'static str {
        match self {
            ExtractionError::UnsupportedFormat(_) => {
                "Unsupported file format. Upload a PDF, Word (.docx), Excel (.xlsx/.xls), CSV or text file."
            }
            ExtractionError::EmptyContent(_) => {
                "No text could be extracted. Make sure the file is not empty and is not an image-only scanned document. If the problem persists, paste the text directly."
            }
            ExtractionError::EncryptedOrCorruptSource(_) => {
                "The file could not be read. It may be password-protected or corrupted."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_is_lowercased() {
        let doc = RawDocument::new(Vec::new(), "Resume.PDF", None);
        assert_eq!(doc.extension().as_deref(), Some("pdf"));
    }

    #[test]
    fn test_extension_missing_or_dotfile() {
        assert_eq!(RawDocument::new(Vec::new(), "README", None).extension(), None);
        assert_eq!(RawDocument::new(Vec::new(), ".env", None).extension(), None);
        assert_eq!(RawDocument::new(Vec::new(), "notes.", None).extension(), None);
    }

    #[test]
    fn test_declared_type_strips_parameters() {
        let doc = RawDocument::new(
            Vec::new(),
            "a.csv",
            Some("Text/CSV; charset=utf-8".to_string()),
        );
        assert_eq!(doc.declared_type().as_deref(), Some("text/csv"));
    }

    #[test]
    fn test_extracted_text_rejects_blank() {
        let err = ExtractedText::new(" \n\t ".to_string(), SourceFormat::Pdf).unwrap_err();
        assert_eq!(err.kind(), ExtractionErrorKind::EmptyContent);
    }

    #[test]
    fn test_extracted_text_is_trimmed() {
        let text = ExtractedText::new("\n  hello  \n".to_string(), SourceFormat::PlainText).unwrap();
        assert_eq!(text.text, "hello");
        assert_eq!(text.format(), SourceFormat::PlainText);
    }

    #[test]
    fn test_excerpt_respects_char_boundaries() {
        let text = ExtractedText::new("你好世界abc".to_string(), SourceFormat::PlainText).unwrap();
        assert_eq!(text.excerpt(2), "你好");
        assert_eq!(text.excerpt(100), "你好世界abc");
        assert_eq!(text.char_count(), 7);
    }

    #[test]
    fn test_source_format_serializes_kebab_case() {
        let json = serde_json::to_string(&SourceFormat::DelimitedText).unwrap();
        assert_eq!(json, r#""delimited-text""#);
        assert_eq!(SourceFormat::DelimitedText.as_str(), "delimited-text");
    }
}
