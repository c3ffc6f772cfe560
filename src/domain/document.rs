use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use super::error::RagError;

/// Dense embedding produced by the embedding service.
pub type EmbeddingVector = Vec<f32>;

/// The closed set of document formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Doc,
    Txt,
}

impl DocumentFormat {
    /// Detects the format from a file name's extension (case-insensitive).
    ///
    /// A missing or unknown extension is rejected with `UnsupportedFormat`.
    pub fn from_file_name(name: &str) -> Result<Self, RagError> {
        let extension = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");
        match extension.to_ascii_lowercase().as_str() {
            "pdf" => Ok(DocumentFormat::Pdf),
            "docx" => Ok(DocumentFormat::Docx),
            "doc" => Ok(DocumentFormat::Doc),
            "txt" => Ok(DocumentFormat::Txt),
            _ => Err(RagError::UnsupportedFormat {
                extension: extension.to_string(),
            }),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
            DocumentFormat::Doc => "doc",
            DocumentFormat::Txt => "txt",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Progress of a single ingestion request, used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    Received,
    Staged,
    Extracted,
    Embedded,
    Stored,
}

impl fmt::Display for IngestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IngestStage::Received => "received",
            IngestStage::Staged => "staged",
            IngestStage::Extracted => "extracted",
            IngestStage::Embedded => "embedded",
            IngestStage::Stored => "stored",
        };
        f.write_str(name)
    }
}

/// A record as persisted in the vector store, keyed by its identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: String,
    pub text: String,
    pub vector: EmbeddingVector,
}

/// A query for searching documents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: String,
    /// `None` falls back to the configured default; `Some(0)` returns every record.
    pub top_k: Option<usize>,
}

/// One ranked hit. Lower distance means more similar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMatch {
    pub id: String,
    pub text: String,
    pub distance: f32,
}

/// Returned after a document has been stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestReceipt {
    pub id: String,
    pub format: DocumentFormat,
    pub characters: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionStats {
    pub collection: String,
    pub records: u64,
    pub dimension: usize,
    pub distance: String,
}
