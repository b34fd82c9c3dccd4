pub mod document_manager;
pub mod embedding_index;
pub mod engine;
pub mod error;
pub mod models;
pub mod text;
pub mod watsonx;

pub use document_manager::DocumentManager;
pub use embedding_index::EmbeddingIndex;
pub use engine::{RagEngine, NO_CONTEXT_ANSWER};
pub use error::{RagError, Result};
pub use models::*;
pub use watsonx::WatsonxClient;
