use thiserror::Error;

pub type Result<T> = std::result::Result<T, RagError>;

/// Errors raised by the admission RAG engine and its collaborators.
#[derive(Error, Debug)]
pub enum RagError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("File too large: {size} bytes exceeds limit of {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("No text content could be extracted from {0}")]
    EmptyDocument(String),

    #[error("Failed to extract text from {filename}: {reason}")]
    Extraction { filename: String, reason: String },

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("watsonx.ai error: {0}")]
    Watsonx(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
