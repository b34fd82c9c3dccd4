use crate::error::{RagError, Result};
use crate::models::{Document, DocumentChunk, DocumentRecord};
use crate::text::{allowed_file_type, file_extension, sanitize_filename, MAX_UPLOAD_BYTES};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use uuid::Uuid;

// Word-window chunking parameters.
const CHUNK_WORDS: usize = 1000;
const CHUNK_OVERLAP: usize = 200;
const MIN_CHUNK_CHARS: usize = 50;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Manifest {
    documents: Vec<DocumentRecord>,
}

/// Stores uploaded admission documents on disk and turns them into
/// retrieval chunks. A `metadata.json` manifest tracks what has been
/// ingested; chunk text is regenerated from the stored files on load.
pub struct DocumentManager {
    storage_path: PathBuf,
    manifest: RwLock<Manifest>,
}

impl DocumentManager {
    pub fn new(storage_path: impl Into<PathBuf>) -> Result<Self> {
        let storage_path = storage_path.into();
        fs::create_dir_all(storage_path.join("uploads"))?;

        let manifest = Self::load_manifest(&storage_path.join("metadata.json"));
        Ok(Self {
            storage_path,
            manifest: RwLock::new(manifest),
        })
    }

    fn metadata_file(&self) -> PathBuf {
        self.storage_path.join("metadata.json")
    }

    fn load_manifest(path: &Path) -> Manifest {
        if !path.exists() {
            return Manifest::default();
        }
        match fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                log::error!("Corrupt manifest {}: {}", path.display(), e);
                Manifest::default()
            }),
            Err(e) => {
                log::error!("Failed to read manifest {}: {}", path.display(), e);
                Manifest::default()
            }
        }
    }

    fn save_manifest(&self, manifest: &Manifest) -> Result<()> {
        let raw = serde_json::to_string_pretty(manifest)?;
        fs::write(self.metadata_file(), raw)?;
        Ok(())
    }

    /// Validate, persist, and chunk an uploaded document.
    pub fn add_document(&self, filename: &str, bytes: &[u8]) -> Result<Document> {
        if !allowed_file_type(filename) {
            return Err(RagError::UnsupportedFormat(
                file_extension(filename).unwrap_or_else(|| filename.to_string()),
            ));
        }
        if bytes.len() as u64 > MAX_UPLOAD_BYTES {
            return Err(RagError::FileTooLarge {
                size: bytes.len() as u64,
                limit: MAX_UPLOAD_BYTES,
            });
        }

        let doc_id = Uuid::new_v4().to_string();
        let filename = sanitize_filename(filename);
        let file_path = self
            .storage_path
            .join("uploads")
            .join(format!("{}_{}", doc_id, filename));

        fs::write(&file_path, bytes)?;

        let text = extract_text(bytes, &filename)?;
        let chunks = create_chunks(&text, &doc_id, &filename);

        let document = Document {
            id: doc_id.clone(),
            filename: filename.clone(),
            upload_date: Utc::now(),
            file_size: bytes.len() as u64,
            chunks,
        };

        let record = DocumentRecord {
            id: doc_id,
            filename,
            file_path: file_path.to_string_lossy().to_string(),
            upload_date: document.upload_date,
            chunks: document.chunks.len(),
            file_size: document.file_size,
        };

        let mut manifest = self.manifest.write().unwrap();
        manifest.documents.push(record);
        self.save_manifest(&manifest)?;

        log::info!(
            "Added document {} with {} chunks",
            document.filename,
            document.chunks.len()
        );
        Ok(document)
    }

    /// Re-extract and re-chunk every manifest entry. Unreadable files are
    /// logged and skipped rather than failing the whole load.
    pub fn load_documents(&self) -> Vec<Document> {
        let manifest = self.manifest.read().unwrap();
        let mut documents = Vec::new();

        for record in &manifest.documents {
            let bytes = match fs::read(&record.file_path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    log::error!("Failed to read stored file {}: {}", record.file_path, e);
                    continue;
                }
            };
            match extract_text(&bytes, &record.filename) {
                Ok(text) => documents.push(Document {
                    id: record.id.clone(),
                    filename: record.filename.clone(),
                    upload_date: record.upload_date,
                    file_size: record.file_size,
                    chunks: create_chunks(&text, &record.id, &record.filename),
                }),
                Err(e) => {
                    log::error!("Failed to load document {}: {}", record.filename, e);
                }
            }
        }

        documents
    }

    pub fn document_count(&self) -> usize {
        self.manifest.read().unwrap().documents.len()
    }

    /// Remove a document's stored file and manifest entry. Returns false
    /// when the id is unknown.
    pub fn delete_document(&self, doc_id: &str) -> Result<bool> {
        let mut manifest = self.manifest.write().unwrap();
        let Some(pos) = manifest.documents.iter().position(|d| d.id == doc_id) else {
            return Ok(false);
        };

        let record = manifest.documents.remove(pos);
        if Path::new(&record.file_path).exists() {
            fs::remove_file(&record.file_path)?;
        }
        self.save_manifest(&manifest)?;

        log::info!("Deleted document {}", record.filename);
        Ok(true)
    }
}

/// Dispatch text extraction on the file extension.
fn extract_text(bytes: &[u8], filename: &str) -> Result<String> {
    let extension = file_extension(filename)
        .ok_or_else(|| RagError::UnsupportedFormat(filename.to_string()))?;

    let text = match extension.as_str() {
        "pdf" => extract_pdf(bytes, filename)?,
        "doc" | "docx" => extract_docx(bytes, filename)?,
        "txt" => String::from_utf8_lossy(bytes).into_owned(),
        other => return Err(RagError::UnsupportedFormat(other.to_string())),
    };

    if text.trim().is_empty() {
        return Err(RagError::EmptyDocument(filename.to_string()));
    }
    Ok(text)
}

fn extract_pdf(bytes: &[u8], filename: &str) -> Result<String> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| RagError::Extraction {
        filename: filename.to_string(),
        reason: e.to_string(),
    })
}

fn extract_docx(bytes: &[u8], filename: &str) -> Result<String> {
    let docx = docx_rs::read_docx(bytes).map_err(|e| RagError::Extraction {
        filename: filename.to_string(),
        reason: e.to_string(),
    })?;

    let mut text = String::new();
    for child in docx.document.children {
        if let docx_rs::DocumentChild::Paragraph(paragraph) = child {
            for child in paragraph.children {
                if let docx_rs::ParagraphChild::Run(run) = child {
                    for child in run.children {
                        if let docx_rs::RunChild::Text(t) = child {
                            text.push_str(&t.text);
                        }
                    }
                }
            }
            text.push('\n');
        }
    }
    Ok(text)
}

/// Sliding word window over the document text. Windows whose trimmed
/// text is at most `MIN_CHUNK_CHARS` chars are dropped.
fn create_chunks(text: &str, doc_id: &str, filename: &str) -> Vec<DocumentChunk> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < words.len() {
        let end = (start + CHUNK_WORDS).min(words.len());
        let chunk_text = words[start..end].join(" ");

        if chunk_text.trim().len() > MIN_CHUNK_CHARS {
            chunks.push(DocumentChunk {
                id: format!("{}_chunk_{}", doc_id, chunks.len()),
                text: chunk_text,
                source: filename.to_string(),
                chunk_index: chunks.len(),
            });
        }

        start += CHUNK_WORDS - CHUNK_OVERLAP;
    }

    chunks
}
