use super::error::RagError;

/// A text embedding model.
///
/// `embed` is blocking CPU work; callers go through
/// [`EmbeddingService`](crate::infrastructure::embedding::EmbeddingService),
/// which runs it on the blocking pool.
pub trait Embedder: Send + Sync {
    fn model_name(&self) -> &str;

    /// Length of every vector this model produces.
    fn dimension(&self) -> usize;

    /// Embeds `texts`; `result[i]` is the embedding of `texts[i]`.
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError>;
}
