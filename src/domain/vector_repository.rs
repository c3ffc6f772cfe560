use async_trait::async_trait;

use super::document::{QueryMatch, StoredRecord};
use super::error::RagError;

/// A named, persistent collection of embedded documents.
///
/// Implementations use one fixed distance metric for the lifetime of the collection.
#[async_trait]
pub trait VectorRepository: Send + Sync {
    /// Inserts the record, replacing any existing record with the same id.
    async fn upsert(&self, record: StoredRecord) -> Result<(), RagError>;

    /// Returns up to `top_k` records ordered by ascending distance to `vector`.
    /// `top_k == 0` returns every record.
    async fn query(&self, vector: Vec<f32>, top_k: usize) -> Result<Vec<QueryMatch>, RagError>;

    /// Number of records currently stored.
    async fn count(&self) -> Result<u64, RagError>;

    fn collection_name(&self) -> &str;

    fn dimension(&self) -> usize;

    /// Name of the distance metric, e.g. "cosine".
    fn distance_metric(&self) -> &str;
}
