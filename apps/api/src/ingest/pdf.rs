//! PDF text reconstruction.
//!
//! `pdf-extract` walks each page's content stream and reports every glyph with its
//! text-rendering matrix. Glyphs are grouped into text runs by position: a run keeps
//! growing while the next glyph sits on the same baseline and starts where the last
//! one ended, so kerned `TJ` arrays stay one run. A run carries no word-boundary
//! information of its own. The runs are then stitched back together with a pure
//! fold: a joining space goes in only between two non-CJK runs, so Latin fragments
//! stay word-separated while ideographs stay glyph-adjacent.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};

use pdf_extract::{MediaBox, OutputDev, OutputError, Transform};
use tracing::debug;

use crate::ingest::cjk::is_cjk;
use crate::ingest::ExtractionError;

// ────────────────────────────────────────────────────────────────────────────
// Run folding
// ────────────────────────────────────────────────────────────────────────────

/// Fold state: the text so far plus the last non-empty run appended to it.
#[derive(Debug, Default)]
struct PageAccumulator<'a> {
    text: String,
    last_run: Option<&'a str>,
}

impl<'a> PageAccumulator<'a> {
    fn push(mut self, run: &'a str) -> Self {
        if self.last_run.is_some_and(|prev| needs_joining_space(prev, run)) {
            self.text.push(' ');
        }
        self.text.push_str(run);
        self.last_run = Some(run);
        self
    }
}

/// A space is inserted only when neither side of the boundary is CJK and neither
/// run is already a lone space.
pub fn needs_joining_space(prev: &str, next: &str) -> bool {
    let (Some(prev_last), Some(next_first)) = (prev.chars().last(), next.chars().next()) else {
        return false;
    };
    !is_cjk(prev_last) && !is_cjk(next_first) && prev != " " && next != " "
}

/// Concatenates one page's runs in order. Empty runs are skipped entirely and do
/// not count as the previous run.
pub fn reconstruct_page<'a, I>(runs: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    runs.into_iter()
        .filter(|run| !run.is_empty())
        .fold(PageAccumulator::default(), PageAccumulator::push)
        .text
}

/// Joins page texts with a single newline, in the order given.
pub fn join_pages<I, S>(pages: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    pages
        .into_iter()
        .map(|p| p.as_ref().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Reconstructs a whole document. The `BTreeMap` keys are page numbers, so pages
/// always come out in ascending order no matter how they were collected.
pub fn reconstruct_document(pages: &BTreeMap<u32, Vec<String>>) -> String {
    join_pages(
        pages
            .values()
            .map(|runs| reconstruct_page(runs.iter().map(String::as_str))),
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Run collection from the PDF content streams
// ────────────────────────────────────────────────────────────────────────────

/// Baseline drift, as a fraction of the font size, still read as the same line.
const SAME_LINE_TOLERANCE: f64 = 0.5;
/// Horizontal gap, as a fraction of the font size, that starts a new run.
const RUN_GAP_RATIO: f64 = 0.15;
/// How far a glyph may step back over the previous one and stay in the run.
const OVERLAP_TOLERANCE: f64 = 0.5;

/// Where the previous glyph ended, in device space.
#[derive(Debug, Clone, Copy)]
struct GlyphEnd {
    x: f64,
    y: f64,
    size: f64,
}

impl GlyphEnd {
    fn is_followed_by(&self, x: f64, y: f64) -> bool {
        (y - self.y).abs() <= self.size * SAME_LINE_TOLERANCE
            && x >= self.x - self.size * OVERLAP_TOLERANCE
            && x <= self.x + self.size * RUN_GAP_RATIO
    }
}

#[derive(Debug, Default)]
struct RunCollector {
    pages: BTreeMap<u32, Vec<String>>,
    current_page: u32,
    current_run: Option<String>,
    last_glyph: Option<GlyphEnd>,
}

impl RunCollector {
    fn start_page(&mut self, page_num: u32) {
        self.finish_page();
        self.current_page = page_num;
        self.pages.entry(page_num).or_default();
    }

    fn finish_page(&mut self) {
        self.finish_run();
        self.last_glyph = None;
    }

    /// Appends one glyph drawn at `(x, y)` that advances the pen by `advance`.
    fn push_glyph(&mut self, c: &str, x: f64, y: f64, advance: f64, size: f64) {
        if !self.last_glyph.is_some_and(|last| last.is_followed_by(x, y)) {
            self.finish_run();
        }
        self.current_run.get_or_insert_with(String::new).push_str(c);
        self.last_glyph = Some(GlyphEnd {
            x: x + advance,
            y,
            size,
        });
    }

    fn finish_run(&mut self) {
        if let Some(run) = self.current_run.take() {
            self.pages.entry(self.current_page).or_default().push(run);
        }
    }

    fn into_pages(mut self) -> BTreeMap<u32, Vec<String>> {
        self.finish_run();
        self.pages
    }
}

impl OutputDev for RunCollector {
    fn begin_page(
        &mut self,
        page_num: u32,
        _media_box: &MediaBox,
        _art_box: Option<(f64, f64, f64, f64)>,
    ) -> Result<(), OutputError> {
        self.start_page(page_num);
        Ok(())
    }

    fn end_page(&mut self) -> Result<(), OutputError> {
        self.finish_page();
        Ok(())
    }

    fn output_character(
        &mut self,
        trm: &Transform,
        width: f64,
        spacing: f64,
        font_size: f64,
        char: &str,
    ) -> Result<(), OutputError> {
        // `width` is in text space units per unit font size; trm carries the
        // remaining text matrix and CTM scaling.
        let scale = (trm.m11 * trm.m22 - trm.m12 * trm.m21).abs().sqrt();
        let advance = (width * font_size + spacing) * scale;
        self.push_glyph(char, trm.m31, trm.m32, advance, font_size * scale);
        Ok(())
    }

    // pdf-extract reports every string of a `TJ` array as its own word, so word
    // callbacks carry no boundary information here.
    fn begin_word(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_word(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_line(&mut self) -> Result<(), OutputError> {
        Ok(())
    }
}

/// Decodes a PDF and returns its text, one line-joined block per page.
///
/// Encrypted documents are opened with the empty user password, which covers
/// owner-password-only files. Anything that needs a real password is rejected.
/// `pdf-extract` can panic on malformed content streams, so the walk runs under
/// `catch_unwind` and a panic is reported as a corrupt source rather than
/// partially decoded text.
pub fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut doc = pdf_extract::Document::load_mem(bytes).map_err(|e| {
        ExtractionError::EncryptedOrCorruptSource(format!("failed to parse PDF: {e}"))
    })?;

    if doc.is_encrypted() {
        doc.decrypt("").map_err(|e| {
            ExtractionError::EncryptedOrCorruptSource(format!("PDF is password-protected: {e}"))
        })?;
        doc.trailer.remove(b"Encrypt");
        debug!("opened encrypted PDF with the empty user password");
    }

    let mut collector = RunCollector::default();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::output_doc(&doc, &mut collector)
    }));

    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            return Err(ExtractionError::EncryptedOrCorruptSource(format!(
                "PDF text decoding failed: {e}"
            )))
        }
        Err(_) => {
            return Err(ExtractionError::EncryptedOrCorruptSource(
                "PDF text decoding panicked (malformed document)".to_string(),
            ))
        }
    }

    let pages = collector.into_pages();
    debug!(
        pages = pages.len(),
        runs = pages.values().map(Vec::len).sum::<usize>(),
        "collected PDF text runs"
    );
    Ok(reconstruct_document(&pages))
}
