use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::ingest::{RawDocument, SourceFormat};
use crate::state::AppState;

/// Multipart field the upload form uses. Any other field carrying a file name is
/// accepted when this one is absent.
const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub file_name: String,
    pub format: SourceFormat,
    /// Characters in the full extracted text.
    pub char_count: usize,
    /// True when `text` was cut to the prompt allowance.
    pub truncated: bool,
    pub text: String,
}

/// POST /api/v1/documents/extract
pub async fn handle_extract(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ExtractResponse>, AppError> {
    let doc = read_upload(&mut multipart, state.config.max_upload_bytes).await?;
    let extracted = state.extractor.extract_text(&doc).await?;

    let limit = state.config.prompt_char_limit;
    let char_count = extracted.char_count();
    info!(
        file = %doc.name,
        format = extracted.format().as_str(),
        chars = char_count,
        "document ready for prompting"
    );

    Ok(Json(ExtractResponse {
        file_name: doc.name,
        format: extracted.format(),
        char_count,
        truncated: char_count > limit,
        text: extracted.excerpt(limit).to_string(),
    }))
}

async fn read_upload(multipart: &mut Multipart, max_bytes: usize) -> Result<RawDocument, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let is_file_field = field.name() == Some(FILE_FIELD);
        let file_name = field.file_name().map(str::to_string);
        if !is_file_field && file_name.is_none() {
            continue;
        }

        let name = file_name.unwrap_or_else(|| FILE_FIELD.to_string());
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;

        if bytes.len() > max_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "'{name}' is {} bytes; the limit is {max_bytes}",
                bytes.len()
            )));
        }
        return Ok(RawDocument::new(bytes, name, content_type));
    }

    Err(AppError::Validation(format!(
        "multipart body has no '{FILE_FIELD}' field"
    )))
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::Validation(format!("invalid multipart body: {}", e.body_text()))
    }
}
