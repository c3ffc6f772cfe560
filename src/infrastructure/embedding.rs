use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::domain::embedding::Embedder;
use crate::domain::error::RagError;

/// Maps a configured model name to the fastembed model.
pub fn parse_model_name(name: &str) -> Option<EmbeddingModel> {
    match name.to_ascii_lowercase().as_str() {
        "all-minilm-l6-v2" | "sentence-transformers/all-minilm-l6-v2" => Some(EmbeddingModel::AllMiniLML6V2),
        "all-minilm-l12-v2" | "sentence-transformers/all-minilm-l12-v2" => Some(EmbeddingModel::AllMiniLML12V2),
        "bge-small-en-v1.5" | "baai/bge-small-en-v1.5" => Some(EmbeddingModel::BGESmallENV15),
        "bge-base-en-v1.5" | "baai/bge-base-en-v1.5" => Some(EmbeddingModel::BGEBaseENV15),
        _ => None,
    }
}

/// A struct responsible for generating text embeddings using a pre-initialized model.
pub struct EmbeddingGenerator {
    model: TextEmbedding,
    model_name: String,
    dimension: usize,
}

impl EmbeddingGenerator {
    /// Creates a new EmbeddingGenerator, initializing the specified embedding model.
    ///
    /// Downloads the model files into `cache_dir` on first use, so call this
    /// from a blocking context.
    pub fn new(model: EmbeddingModel, cache_dir: Option<std::path::PathBuf>) -> anyhow::Result<Self> {
        let info = TextEmbedding::list_supported_models()
            .into_iter()
            .find(|m| m.model == model)
            .ok_or_else(|| anyhow::anyhow!("No model info for {:?}", model))?;

        let mut opts = InitOptions::new(model);
        if let Some(dir) = cache_dir {
            opts = opts.with_cache_dir(dir);
        }
        let text_embedding = TextEmbedding::try_new(opts)?;
        log::info!("Loaded embedding model {} (dimension {}).", info.model_code, info.dim);
        Ok(EmbeddingGenerator {
            model: text_embedding,
            model_name: info.model_code,
            dimension: info.dim,
        })
    }
}

impl Embedder for EmbeddingGenerator {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        self.model
            .embed(texts.to_vec(), None)
            .map_err(|e| RagError::Embedding(e.to_string()))
    }
}

/// Runs an [`Embedder`] on the blocking thread pool with bounded concurrency.
///
/// Validates that the model returned one vector per input, each of the model's dimension.
pub struct EmbeddingService {
    embedder: Arc<dyn Embedder>,
    semaphore: Semaphore,
    max_concurrent: usize,
}

impl EmbeddingService {
    pub fn new(embedder: Arc<dyn Embedder>, max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            embedder,
            semaphore: Semaphore::new(max_concurrent),
            max_concurrent,
        }
    }

    pub fn dimension(&self) -> usize {
        self.embedder.dimension()
    }

    pub fn model_name(&self) -> &str {
        self.embedder.model_name()
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Embeds a batch; `result[i]` embeds `texts[i]`.
    pub async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, RagError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| RagError::Embedding(format!("semaphore error: {e}")))?;

        let expected = texts.len();
        let embedder = Arc::clone(&self.embedder);
        log::debug!("Embedding {} text(s) with {}...", expected, embedder.model_name());
        let vectors = tokio::task::spawn_blocking(move || embedder.embed(&texts))
            .await
            .map_err(|e| RagError::Embedding(format!("embedding task failed: {e}")))??;

        if vectors.len() != expected {
            return Err(RagError::Embedding(format!(
                "model returned {} embeddings for {} inputs",
                vectors.len(),
                expected
            )));
        }
        let dimension = self.dimension();
        if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
            return Err(RagError::Embedding(format!(
                "model returned a vector of dimension {} (expected {})",
                bad.len(),
                dimension
            )));
        }
        Ok(vectors)
    }

    /// Embeds a single text as a batch of one.
    pub async fn embed_one(&self, text: String) -> Result<Vec<f32>, RagError> {
        self.embed(vec![text])
            .await?
            .pop()
            .ok_or_else(|| RagError::Embedding("model returned no embedding".to_string()))
    }
}
