use admission_rag::Source;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct QueryPayload {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct QueryReply {
    pub response: String,
    pub sources: Vec<Source>,
    pub confidence: f32,
}

#[derive(Debug, Serialize)]
pub struct UploadReply {
    pub message: String,
    pub document_id: String,
    pub chunks_created: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthReply {
    pub status: String,
    pub watsonx_connected: bool,
    pub documents_loaded: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorReply {
    pub error: String,
}

impl ErrorReply {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
