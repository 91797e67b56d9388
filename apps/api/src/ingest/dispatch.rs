//! Format dispatcher: routes a `RawDocument` to its extractor and enforces that
//! successful extraction never yields blank text.

use std::sync::Arc;

use tracing::{debug, info};

use crate::ingest::word::{DocxTextExtractor, WordTextExtractor};
use crate::ingest::{
    is_cfb_container, pdf, plain, tabular, ExtractedText, ExtractionError, RawDocument,
    SourceFormat,
};

/// Recognized file-name suffixes, matched case-insensitively.
const EXTENSION_TABLE: &[(&str, SourceFormat)] = &[
    ("pdf", SourceFormat::Pdf),
    ("doc", SourceFormat::Word),
    ("docx", SourceFormat::Word),
    ("xls", SourceFormat::Spreadsheet),
    ("xlsx", SourceFormat::Spreadsheet),
    ("csv", SourceFormat::DelimitedText),
    ("txt", SourceFormat::PlainText),
    ("md", SourceFormat::PlainText),
];

/// Declared content types recognized when the suffix is missing or unknown.
const CONTENT_TYPE_TABLE: &[(&str, SourceFormat)] = &[
    ("application/pdf", SourceFormat::Pdf),
    ("application/msword", SourceFormat::Word),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        SourceFormat::Word,
    ),
    ("application/vnd.ms-excel", SourceFormat::Spreadsheet),
    (
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        SourceFormat::Spreadsheet,
    ),
    ("text/csv", SourceFormat::DelimitedText),
];

/// Picks an extractor for `doc` without reading its bytes.
///
/// A declared `application/pdf` wins outright; otherwise the suffix decides, then the
/// declared type, then any `text/*` type reads as plain text.
pub fn detect_format(doc: &RawDocument) -> Result<SourceFormat, ExtractionError> {
    let declared = doc.declared_type();
    if declared.as_deref() == Some("application/pdf") {
        return Ok(SourceFormat::Pdf);
    }

    if let Some(ext) = doc.extension() {
        if let Some((_, format)) = EXTENSION_TABLE.iter().find(|(e, _)| *e == ext) {
            return Ok(*format);
        }
    }

    if let Some(declared) = declared.as_deref() {
        if let Some((_, format)) = CONTENT_TYPE_TABLE.iter().find(|(t, _)| *t == declared) {
            return Ok(*format);
        }
        if declared.starts_with("text/") {
            return Ok(SourceFormat::PlainText);
        }
    }

    Err(ExtractionError::UnsupportedFormat(format!(
        "'{}' ({}) is not a recognized document type",
        doc.name,
        doc.content_type.as_deref().unwrap_or("no declared type")
    )))
}

/// Runs extraction on the blocking pool. Holds the pluggable word-processor
/// capability, the same way handlers share other collaborators through `AppState`.
#[derive(Clone)]
pub struct DocumentExtractor {
    word: Arc<dyn WordTextExtractor>,
}

impl Default for DocumentExtractor {
    fn default() -> Self {
        Self::new(Arc::new(DocxTextExtractor))
    }
}

impl DocumentExtractor {
    pub fn new(word: Arc<dyn WordTextExtractor>) -> Self {
        Self { word }
    }

    /// Extracts text from `doc`. Unknown formats fail before any decoding starts;
    /// blank results become `EmptyContent`.
    pub async fn extract_text(&self, doc: &RawDocument) -> Result<ExtractedText, ExtractionError> {
        let format = detect_format(doc)?;
        info!(
            file = %doc.name,
            format = format.as_str(),
            bytes = doc.bytes.len(),
            "extracting document"
        );

        let bytes = doc.bytes.clone();
        let word = Arc::clone(&self.word);
        let legacy_doc = doc.extension().as_deref() == Some("doc")
            || doc.declared_type().as_deref() == Some("application/msword");

        let raw = tokio::task::spawn_blocking(move || {
            run_extractor(format, &bytes, word.as_ref(), legacy_doc)
        })
        .await
        .map_err(|e| {
            ExtractionError::EncryptedOrCorruptSource(format!("extraction task failed: {e}"))
        })??;

        let extracted = ExtractedText::new(raw, format).map_err(|_| {
            ExtractionError::EmptyContent(format!("'{}' contains no extractable text", doc.name))
        })?;
        debug!(chars = extracted.char_count(), "document extracted");
        Ok(extracted)
    }
}

fn run_extractor(
    format: SourceFormat,
    bytes: &[u8],
    word: &dyn WordTextExtractor,
    legacy_doc: bool,
) -> Result<String, ExtractionError> {
    match format {
        SourceFormat::Pdf => pdf::extract_pdf(bytes),
        SourceFormat::Word if legacy_doc && is_cfb_container(bytes) => {
            Err(ExtractionError::UnsupportedFormat(
                "legacy binary .doc files are not supported; save the file as .docx".to_string(),
            ))
        }
        SourceFormat::Word => word.extract_raw_text(bytes),
        SourceFormat::Spreadsheet => tabular::extract_workbook(bytes),
        SourceFormat::DelimitedText => tabular::extract_delimited(bytes),
        SourceFormat::PlainText => plain::extract_plain(bytes),
    }
}
