use crate::config::Config;
use crate::ingest::dispatch::DocumentExtractor;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Document extraction with the pluggable word-processor capability.
    pub extractor: DocumentExtractor,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            extractor: DocumentExtractor::default(),
        }
    }
}
