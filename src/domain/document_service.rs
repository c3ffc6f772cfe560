use async_trait::async_trait;

use super::document::{CollectionStats, IngestReceipt, QueryMatch, SearchQuery};
use super::error::RagError;

#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Extracts, embeds and stores one document under `name`.
    async fn ingest_document(&self, name: &str, bytes: Vec<u8>) -> Result<IngestReceipt, RagError>;

    /// Embeds the query text and returns the closest stored documents.
    async fn query_documents(&self, query: SearchQuery) -> Result<Vec<QueryMatch>, RagError>;

    async fn collection_stats(&self) -> Result<CollectionStats, RagError>;
}
