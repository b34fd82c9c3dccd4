use admission_rag::RagEngine;
use std::sync::Arc;

/// Shared application state handed to every handler via axum's `State`
/// extractor.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RagEngine>,
}

impl AppState {
    pub fn new(engine: RagEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}
