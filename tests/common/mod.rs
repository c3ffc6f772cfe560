#![allow(dead_code)]

use rag_mcp::{Embedder, EmbeddingService, InMemoryVectorStore, RagError, RagServiceImpl};
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::Arc;
use zip::write::SimpleFileOptions;

/// Words the test embedder understands; each one owns a dimension.
pub const VOCABULARY: [&str; 4] = ["apple", "banana", "cherry", "durian"];

/// Deterministic bag-of-words embedder over [`VOCABULARY`].
pub struct KeywordEmbedder;

impl KeywordEmbedder {
    pub fn vector_for(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        VOCABULARY
            .iter()
            .map(|word| lower.matches(word).count() as f32)
            .collect()
    }
}

impl Embedder for KeywordEmbedder {
    fn model_name(&self) -> &str {
        "keyword-test"
    }

    fn dimension(&self) -> usize {
        VOCABULARY.len()
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        Ok(texts.iter().map(|t| Self::vector_for(t)).collect())
    }
}

pub struct TestRig {
    pub service: RagServiceImpl,
    pub store: Arc<InMemoryVectorStore>,
    pub staging: tempfile::TempDir,
}

pub fn rig() -> TestRig {
    let staging = tempfile::tempdir().expect("staging dir");
    let store = Arc::new(InMemoryVectorStore::new("documents", VOCABULARY.len()));
    let embedder = Arc::new(EmbeddingService::new(Arc::new(KeywordEmbedder), 2));
    let service = RagServiceImpl::new(embedder, store.clone(), staging.path().to_path_buf(), 5);
    TestRig { service, store, staging }
}

pub fn staged_file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

/// A minimal DOCX holding one paragraph per entry.
pub fn docx_bytes(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{p}</w:t></w:r></w:p>"))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    );

    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    zip.start_file("[Content_Types].xml", options).expect("zip entry");
    zip.write_all(b"<Types/>").expect("zip write");
    zip.start_file("word/document.xml", options).expect("zip entry");
    zip.write_all(xml.as_bytes()).expect("zip write");
    zip.finish().expect("zip finish").into_inner()
}
