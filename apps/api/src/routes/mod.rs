pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::ingest::handlers as ingest_handlers;
use crate::state::AppState;
use crate::structured::handlers as structured_handlers;

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state
        .config
        .max_upload_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/documents/extract",
            post(ingest_handlers::handle_extract),
        )
        .route(
            "/api/v1/responses/decode",
            post(structured_handlers::handle_decode),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
