use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A document held in the knowledge base, with its retrieval chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub filename: String,
    pub upload_date: DateTime<Utc>,
    pub file_size: u64,
    pub chunks: Vec<DocumentChunk>,
}

/// A segment of a document's text, indexed for retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: String,
    pub text: String,
    pub source: String,
    pub chunk_index: usize,
}

/// Manifest entry persisted alongside the stored files. Chunks are
/// regenerated from the file on load rather than persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub filename: String,
    pub file_path: String,
    pub upload_date: DateTime<Utc>,
    pub chunks: usize,
    pub file_size: u64,
}

/// A citation attached to a generated answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub source: String,
    pub chunk_id: String,
    pub score: f32,
}

/// Result of running a query through the RAG engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub answer: String,
    pub sources: Vec<Source>,
    pub confidence: f32,
}

/// Outcome of ingesting an uploaded document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReceipt {
    pub document_id: String,
    pub filename: String,
    pub chunks_created: usize,
}
