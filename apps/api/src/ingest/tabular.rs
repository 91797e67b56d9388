//! Spreadsheet and delimited-text extraction.
//!
//! Workbooks (xls/xlsx) are dumped as tab-separated text from the first sheet.
//! Delimited text (CSV) becomes a Markdown table, which models read far more
//! reliably than raw comma soup.

use std::io::Cursor;

use calamine::{Data, Reader};
use tracing::{debug, warn};

use crate::ingest::plain::decode_text;
use crate::ingest::{is_cfb_container, is_zip_container, ExtractionError};

/// Ordered rows of string cells. Row 0 is the header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableGrid {
    rows: Vec<Vec<String>>,
}

impl TableGrid {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Builds a grid from optional cells; missing cells become empty strings.
    pub fn from_optional_cells<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator<Item = Option<String>>,
    {
        Self::new(
            rows.into_iter()
                .map(|row| row.into_iter().map(Option::unwrap_or_default).collect())
                .collect(),
        )
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn header(&self) -> Option<&[String]> {
        self.rows.first().map(Vec::as_slice)
    }

    pub fn data_rows(&self) -> &[Vec<String>] {
        self.rows.get(1..).unwrap_or_default()
    }

    /// Width of the widest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Rendering
// ────────────────────────────────────────────────────────────────────────────

/// Tab-separated cells, one line per row.
pub fn flat_dump(grid: &TableGrid) -> String {
    grid.rows()
        .iter()
        .map(|row| row.join("\t"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders `| h1 | h2 |`, a `| --- | --- |` separator, then one line per data row.
///
/// Returns `None` when there is no data row, so callers can fall back to the raw
/// text instead of emitting a header-only table. Every line is padded to the
/// widest row, so all lines carry the same number of cells.
pub fn to_markdown_table(grid: &TableGrid) -> Option<String> {
    let header = grid.header()?;
    if grid.data_rows().is_empty() {
        return None;
    }
    let width = grid.width();

    let mut lines = Vec::with_capacity(grid.rows().len() + 1);
    lines.push(markdown_row(header, width));
    lines.push(format!("| {} |", vec!["---"; width].join(" | ")));
    lines.extend(grid.data_rows().iter().map(|row| markdown_row(row, width)));
    Some(lines.join("\n"))
}

fn markdown_row(cells: &[String], width: usize) -> String {
    let rendered: Vec<String> = (0..width)
        .map(|i| cells.get(i).map(|c| markdown_cell(c)).unwrap_or_default())
        .collect();
    format!("| {} |", rendered.join(" | "))
}

/// Trims the cell and keeps it on one table line: pipes are escaped and embedded
/// line breaks become spaces.
fn markdown_cell(cell: &str) -> String {
    cell.trim()
        .replace('|', "\\|")
        .replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
}

// ────────────────────────────────────────────────────────────────────────────
// Delimited text
// ────────────────────────────────────────────────────────────────────────────

/// Parses comma-separated text into a grid. Ragged rows are kept as-is and rows
/// with only blank cells are dropped.
pub fn parse_delimited(text: &str) -> Result<TableGrid, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(TableGrid::new(rows))
}

/// CSV bytes → Markdown table. Empty or header-only files, and files the CSV
/// reader rejects, come back as their decoded text unchanged.
pub fn extract_delimited(bytes: &[u8]) -> Result<String, ExtractionError> {
    let raw = decode_text(bytes);
    let grid = match parse_delimited(&raw) {
        Ok(grid) => grid,
        Err(e) => {
            warn!("CSV parse failed, using raw text: {e}");
            return Ok(raw);
        }
    };

    match to_markdown_table(&grid) {
        Some(table) => {
            debug!(
                rows = grid.data_rows().len(),
                columns = grid.width(),
                "rendered CSV as Markdown table"
            );
            Ok(table)
        }
        None => Ok(raw),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Workbooks
// ────────────────────────────────────────────────────────────────────────────

/// Reads the first sheet of an xls/xlsx workbook into a grid.
pub fn read_first_sheet(bytes: &[u8]) -> Result<TableGrid, ExtractionError> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| classify_workbook_error(bytes, &e.to_string()))?;

    let first_sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ExtractionError::UnsupportedFormat("workbook has no sheets".to_string()))?;

    let range = workbook
        .worksheet_range(&first_sheet)
        .map_err(|e| classify_workbook_error(bytes, &e.to_string()))?;

    Ok(TableGrid::from_optional_cells(
        range.rows().map(|row| row.iter().map(cell_text)),
    ))
}

/// Workbook bytes → flat text dump of the first sheet.
pub fn extract_workbook(bytes: &[u8]) -> Result<String, ExtractionError> {
    let grid = read_first_sheet(bytes)?;
    if grid.is_empty() {
        return Err(ExtractionError::EmptyContent(
            "first sheet has no cells".to_string(),
        ));
    }
    debug!(
        rows = grid.rows().len(),
        columns = grid.width(),
        "read first workbook sheet"
    );
    Ok(flat_dump(&grid))
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// A container we recognize but cannot open is encrypted or damaged; anything
/// else was never a workbook.
fn classify_workbook_error(bytes: &[u8], detail: &str) -> ExtractionError {
    if is_cfb_container(bytes) || is_zip_container(bytes) {
        ExtractionError::EncryptedOrCorruptSource(format!("failed to open workbook: {detail}"))
    } else {
        ExtractionError::UnsupportedFormat(format!("not a readable workbook: {detail}"))
    }
}
