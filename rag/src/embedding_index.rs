use crate::models::Document;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

// Vocabulary cap and minimum embedding width.
const VOCABULARY_SIZE: usize = 1000;
const MIN_DIMENSIONS: usize = 100;

/// A chunk as seen by the retriever: its text plus enough metadata to
/// cite where it came from.
#[derive(Debug, Clone)]
pub struct ChunkRef {
    pub text: String,
    pub source: String,
    pub chunk_id: String,
}

/// A retrieval hit with its cosine similarity to the query.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: ChunkRef,
    pub score: f32,
}

#[derive(Debug, Default)]
struct IndexState {
    vocabulary: HashMap<String, usize>,
    idf_scores: HashMap<String, f32>,
    embeddings: Vec<Vec<f32>>,
    entries: Vec<ChunkRef>,
}

/// In-process TF-IDF vector store over document chunks. The vocabulary
/// and IDF table are corpus-wide, so the index is rebuilt whenever the
/// document set changes.
#[derive(Debug, Default)]
pub struct EmbeddingIndex {
    state: RwLock<IndexState>,
}

impl EmbeddingIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.state.read().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Recompute vocabulary, IDF scores, and chunk embeddings over the
    /// full document set.
    pub fn rebuild(&self, documents: &[Document]) {
        let mut word_counts: HashMap<String, usize> = HashMap::new();
        let mut chunk_frequencies: HashMap<String, usize> = HashMap::new();
        let total_chunks = documents.iter().map(|d| d.chunks.len()).sum::<usize>();

        for document in documents {
            for chunk in &document.chunks {
                let words = tokenize(&chunk.text);
                let unique_words: HashSet<_> = words.iter().collect();

                for word in &words {
                    *word_counts.entry(word.clone()).or_insert(0) += 1;
                }
                for word in unique_words {
                    *chunk_frequencies.entry(word.clone()).or_insert(0) += 1;
                }
            }
        }

        let idf_scores: HashMap<String, f32> = chunk_frequencies
            .iter()
            .map(|(word, df)| {
                let idf = (total_chunks as f32 / *df as f32).ln();
                (word.clone(), idf)
            })
            .collect();

        let mut word_freq_pairs: Vec<_> = word_counts.iter().collect();
        word_freq_pairs.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        let vocabulary: HashMap<String, usize> = word_freq_pairs
            .into_iter()
            .take(VOCABULARY_SIZE)
            .enumerate()
            .map(|(idx, (word, _))| (word.clone(), idx))
            .collect();

        let mut next = IndexState {
            vocabulary,
            idf_scores,
            embeddings: Vec::with_capacity(total_chunks),
            entries: Vec::with_capacity(total_chunks),
        };

        for document in documents {
            for chunk in &document.chunks {
                next.embeddings.push(embed(
                    &chunk.text,
                    &next.vocabulary,
                    &next.idf_scores,
                ));
                next.entries.push(ChunkRef {
                    text: chunk.text.clone(),
                    source: chunk.source.clone(),
                    chunk_id: chunk.id.clone(),
                });
            }
        }

        log::info!("Rebuilt embedding index with {} chunks", next.entries.len());
        *self.state.write().unwrap() = next;
    }

    /// Embed the query with the current vocabulary and return the
    /// `top_k` most similar chunks, best first.
    pub fn search(&self, query: &str, top_k: usize) -> Vec<ScoredChunk> {
        let state = self.state.read().unwrap();
        if state.entries.is_empty() {
            return Vec::new();
        }

        let query_embedding = embed(query, &state.vocabulary, &state.idf_scores);

        let mut scored: Vec<ScoredChunk> = state
            .entries
            .iter()
            .zip(state.embeddings.iter())
            .map(|(entry, embedding)| ScoredChunk {
                chunk: entry.clone(),
                score: cosine_similarity(&query_embedding, embedding),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        scored
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
        })
        .filter(|word| word.len() > 2)
        .collect()
}

fn embed(
    text: &str,
    vocabulary: &HashMap<String, usize>,
    idf_scores: &HashMap<String, f32>,
) -> Vec<f32> {
    let mut embedding = vec![0.0; vocabulary.len().max(MIN_DIMENSIONS)];
    let words = tokenize(text);
    let total_words = words.len() as f32;

    let mut word_counts: HashMap<String, usize> = HashMap::new();
    for word in &words {
        *word_counts.entry(word.clone()).or_insert(0) += 1;
    }

    for (word, count) in word_counts {
        if let Some(&idx) = vocabulary.get(&word) {
            let tf = count as f32 / total_words;
            let idf = idf_scores.get(&word).unwrap_or(&1.0);
            embedding[idx] = tf * idf;
        }
    }

    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in embedding.iter_mut() {
            *value /= norm;
        }
    }

    embedding
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let min_len = a.len().min(b.len());

    let dot_product: f32 = a[..min_len]
        .iter()
        .zip(b[..min_len].iter())
        .map(|(x, y)| x * y)
        .sum();

    let norm_a: f32 = a[..min_len].iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b[..min_len].iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}
