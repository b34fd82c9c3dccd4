use crate::document_manager::DocumentManager;
use crate::embedding_index::{EmbeddingIndex, ScoredChunk};
use crate::error::Result;
use crate::models::{Document, IngestReceipt, QueryOutcome, Source};
use crate::text::preprocess_query;
use crate::watsonx::WatsonxClient;
use tokio::sync::RwLock;

const TOP_K: usize = 5;
const SCORE_THRESHOLD: f32 = 0.3;

/// Answer returned when retrieval finds nothing relevant enough to
/// ground a generation.
pub const NO_CONTEXT_ANSWER: &str = "I don't have specific information about that topic in my knowledge base. I'd recommend contacting the admissions office directly for the most accurate and up-to-date information. For general admission inquiries, you can typically find information about application deadlines and requirements, tuition and financial aid, academic programs and prerequisites, campus life and facilities, and transfer credit policies. Is there anything else about college admissions I can help you with?";

/// Retrieval-augmented query engine: embeds the question, pulls the most
/// relevant chunks, and asks watsonx.ai to answer from that context.
pub struct RagEngine {
    watsonx: WatsonxClient,
    store: DocumentManager,
    index: EmbeddingIndex,
    documents: RwLock<Vec<Document>>,
}

impl RagEngine {
    /// Load every stored document and build the retrieval index.
    pub async fn new(watsonx: WatsonxClient, store: DocumentManager) -> Result<Self> {
        let documents = store.load_documents();
        let index = EmbeddingIndex::new();

        if documents.is_empty() {
            log::info!("No documents found, initialized empty vector store");
        } else {
            index.rebuild(&documents);
        }

        Ok(Self {
            watsonx,
            store,
            index,
            documents: RwLock::new(documents),
        })
    }

    /// Answer a user question. Queries with no sufficiently relevant
    /// context get a fixed fallback with zero confidence instead of an
    /// ungrounded generation.
    pub async fn process_query(&self, query: &str) -> Result<QueryOutcome> {
        let normalized = preprocess_query(query);

        let retained: Vec<ScoredChunk> = self
            .index
            .search(&normalized, TOP_K)
            .into_iter()
            .filter(|hit| hit.score > SCORE_THRESHOLD)
            .collect();

        if retained.is_empty() {
            log::info!("No relevant context found for query");
            return Ok(QueryOutcome {
                answer: NO_CONTEXT_ANSWER.to_string(),
                sources: Vec::new(),
                confidence: 0.0,
            });
        }

        let context = build_context(&retained);
        let prompt = WatsonxClient::build_prompt(query, &context);
        let answer = self.watsonx.generate(&prompt).await?;

        let confidence =
            retained.iter().map(|hit| hit.score).sum::<f32>() / retained.len() as f32;
        let sources = retained
            .iter()
            .map(|hit| Source {
                source: hit.chunk.source.clone(),
                chunk_id: hit.chunk.chunk_id.clone(),
                score: hit.score,
            })
            .collect();

        Ok(QueryOutcome {
            answer,
            sources,
            confidence,
        })
    }

    /// Ingest an uploaded file and refresh the retrieval index. The
    /// TF-IDF vocabulary is corpus-wide, so the whole index is rebuilt.
    pub async fn ingest(&self, filename: &str, bytes: &[u8]) -> Result<IngestReceipt> {
        let document = self.store.add_document(filename, bytes)?;
        let receipt = IngestReceipt {
            document_id: document.id.clone(),
            filename: document.filename.clone(),
            chunks_created: document.chunks.len(),
        };

        let mut documents = self.documents.write().await;
        documents.push(document);
        self.index.rebuild(&documents);

        Ok(receipt)
    }

    pub fn document_count(&self) -> usize {
        self.store.document_count()
    }

    pub async fn is_connected(&self) -> bool {
        self.watsonx.is_connected().await
    }
}

fn build_context(chunks: &[ScoredChunk]) -> String {
    let mut context = String::new();
    for hit in chunks {
        context.push_str(&format!(
            "Document: {}\nContent: {}\n\n",
            hit.chunk.source, hit.chunk.text
        ));
    }
    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_engine_parts(dir: &std::path::Path) -> (WatsonxClient, DocumentManager) {
        std::env::set_var("IBM_CLOUD_API_KEY", "test-key");
        std::env::set_var("WATSONX_PROJECT_ID", "test-project");
        let watsonx = WatsonxClient::from_env().unwrap();
        let store = DocumentManager::new(dir).unwrap();
        (watsonx, store)
    }

    fn admission_text() -> String {
        let sentence = "Tuition payment deadlines fall on the first of each semester and installment plans are available through the bursar office for enrolled students. ";
        sentence.repeat(8)
    }

    #[tokio::test]
    async fn empty_knowledge_base_falls_back() {
        let dir = tempdir().unwrap();
        let (watsonx, store) = test_engine_parts(dir.path());
        let engine = RagEngine::new(watsonx, store).await.unwrap();

        let outcome = engine.process_query("When is tuition due?").await.unwrap();
        assert_eq!(outcome.answer, NO_CONTEXT_ANSWER);
        assert_eq!(outcome.confidence, 0.0);
        assert!(outcome.sources.is_empty());
    }

    #[tokio::test]
    async fn irrelevant_query_falls_back_without_generation() {
        let dir = tempdir().unwrap();
        let (watsonx, store) = test_engine_parts(dir.path());
        let engine = RagEngine::new(watsonx, store).await.unwrap();

        engine
            .ingest("fees.txt", admission_text().as_bytes())
            .await
            .unwrap();

        // Nothing in the corpus matches, so the score threshold filters
        // everything out and no watsonx call is made.
        let outcome = engine
            .process_query("zebra migration patterns in the serengeti")
            .await
            .unwrap();
        assert_eq!(outcome.answer, NO_CONTEXT_ANSWER);
        assert!(outcome.sources.is_empty());
    }

    #[tokio::test]
    async fn ingest_reports_chunks_and_updates_count() {
        let dir = tempdir().unwrap();
        let (watsonx, store) = test_engine_parts(dir.path());
        let engine = RagEngine::new(watsonx, store).await.unwrap();
        assert_eq!(engine.document_count(), 0);

        let receipt = engine
            .ingest("fees.txt", admission_text().as_bytes())
            .await
            .unwrap();
        assert_eq!(receipt.chunks_created, 1);
        assert_eq!(receipt.filename, "fees.txt");
        assert_eq!(engine.document_count(), 1);
    }

    #[test]
    fn context_lists_each_source() {
        use crate::embedding_index::ChunkRef;

        let context = build_context(&[
            ScoredChunk {
                chunk: ChunkRef {
                    text: "Applications close March 1.".to_string(),
                    source: "deadlines.pdf".to_string(),
                    chunk_id: "d1_chunk_0".to_string(),
                },
                score: 0.9,
            },
            ScoredChunk {
                chunk: ChunkRef {
                    text: "Tuition is due at enrollment.".to_string(),
                    source: "fees.pdf".to_string(),
                    chunk_id: "d2_chunk_0".to_string(),
                },
                score: 0.5,
            },
        ]);

        assert!(context.contains("Document: deadlines.pdf\nContent: Applications close March 1."));
        assert!(context.contains("Document: fees.pdf\nContent: Tuition is due at enrollment."));
    }
}
