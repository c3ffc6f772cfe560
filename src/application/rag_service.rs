use async_trait::async_trait;
use log::{debug, error, info};
use std::path::PathBuf;
use std::sync::Arc;

use crate::domain::document::{
    CollectionStats, DocumentFormat, IngestReceipt, IngestStage, QueryMatch, SearchQuery, StoredRecord,
};
use crate::domain::document_service::DocumentService;
use crate::domain::error::RagError;
use crate::domain::vector_repository::VectorRepository;
use crate::infrastructure::embedding::EmbeddingService;
use crate::infrastructure::extract::stage_and_extract;

/// Ingestion and query pipelines over an embedding service and a vector store.
pub struct RagServiceImpl {
    embedder: Arc<EmbeddingService>,
    vector_db: Arc<dyn VectorRepository>,
    staging_dir: PathBuf,
    default_top_k: usize,
}

impl RagServiceImpl {
    pub fn new(
        embedder: Arc<EmbeddingService>,
        vector_db: Arc<dyn VectorRepository>,
        staging_dir: PathBuf,
        default_top_k: usize,
    ) -> Self {
        Self { embedder, vector_db, staging_dir, default_top_k }
    }

    async fn run_ingestion(&self, name: &str, bytes: Vec<u8>) -> Result<IngestReceipt, RagError> {
        // Reject unknown formats before anything touches the disk.
        let format = DocumentFormat::from_file_name(name)?;
        debug!("'{}': {} as {} ({} bytes)", name, IngestStage::Received, format, bytes.len());

        let staging_dir = self.staging_dir.clone();
        let doc_name = name.to_string();
        let text = tokio::task::spawn_blocking(move || stage_and_extract(&staging_dir, &doc_name, format, &bytes))
            .await
            .map_err(|e| RagError::Extraction {
                name: name.to_string(),
                reason: format!("extraction task failed: {e}"),
            })??;
        let characters = text.chars().count();
        debug!("'{}': {} ({} characters)", name, IngestStage::Extracted, characters);

        let vector = self.embedder.embed_one(text.clone()).await?;
        debug!("'{}': {} (dimension {})", name, IngestStage::Embedded, vector.len());

        self.vector_db
            .upsert(StoredRecord { id: name.to_string(), text, vector })
            .await?;
        debug!("'{}': {}", name, IngestStage::Stored);

        Ok(IngestReceipt { id: name.to_string(), format, characters })
    }
}

#[async_trait]
impl DocumentService for RagServiceImpl {
    async fn ingest_document(&self, name: &str, bytes: Vec<u8>) -> Result<IngestReceipt, RagError> {
        info!("Ingesting document '{}'...", name);
        let receipt = self.run_ingestion(name, bytes).await.inspect_err(|e| {
            error!("Ingestion of '{}' failed ({}): {}", name, e.kind(), e);
        })?;
        info!("Document '{}' ingested ({} characters).", receipt.id, receipt.characters);
        Ok(receipt)
    }

    async fn query_documents(&self, query: SearchQuery) -> Result<Vec<QueryMatch>, RagError> {
        let top_k = query.top_k.unwrap_or(self.default_top_k);
        info!("Performing search for query: '{}', top_k: {}", query.text, top_k);

        let vector = self.embedder.embed_one(query.text).await?;
        match self.vector_db.query(vector, top_k).await {
            Ok(results) => {
                info!("Search returned {} results from repository.", results.len());
                Ok(results)
            }
            Err(e) => {
                error!("Search failed in repository: {}", e);
                Err(e)
            }
        }
    }

    async fn collection_stats(&self) -> Result<CollectionStats, RagError> {
        Ok(CollectionStats {
            collection: self.vector_db.collection_name().to_string(),
            records: self.vector_db.count().await?,
            dimension: self.vector_db.dimension(),
            distance: self.vector_db.distance_metric().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::Embedder;
    use crate::infrastructure::memory_store::InMemoryVectorStore;
    use assert_matches::assert_matches;
    use mockall::mock;
    use tempfile::tempdir;

    const DIM: usize = 4;

    struct ConstantEmbedder;

    impl Embedder for ConstantEmbedder {
        fn model_name(&self) -> &str {
            "constant"
        }

        fn dimension(&self) -> usize {
            DIM
        }

        fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
            Ok(texts.iter().map(|_| vec![1.0; DIM]).collect())
        }
    }

    struct FailingEmbedder;

    impl Embedder for FailingEmbedder {
        fn model_name(&self) -> &str {
            "failing"
        }

        fn dimension(&self) -> usize {
            DIM
        }

        fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
            Err(RagError::Embedding("model crashed".to_string()))
        }
    }

    mock! {
        Repository {}

        #[async_trait]
        impl VectorRepository for Repository {
            async fn upsert(&self, record: StoredRecord) -> Result<(), RagError>;
            async fn query(&self, vector: Vec<f32>, top_k: usize) -> Result<Vec<QueryMatch>, RagError>;
            async fn count(&self) -> Result<u64, RagError>;
            fn collection_name(&self) -> &str;
            fn dimension(&self) -> usize;
            fn distance_metric(&self) -> &str;
        }
    }

    fn service(embedder: Arc<dyn Embedder>, repo: Arc<dyn VectorRepository>, staging: PathBuf) -> RagServiceImpl {
        RagServiceImpl::new(Arc::new(EmbeddingService::new(embedder, 1)), repo, staging, 5)
    }

    #[tokio::test]
    async fn test_unsupported_format_is_rejected_before_staging() {
        let dir = tempdir().unwrap();
        let staging = dir.path().join("staging");
        let store = Arc::new(InMemoryVectorStore::new("docs", DIM));
        let service = service(Arc::new(ConstantEmbedder), store.clone(), staging.clone());

        let result = service.ingest_document("report.xyz", b"data".to_vec()).await;

        assert_matches!(result, Err(RagError::UnsupportedFormat { extension }) if extension == "xyz");
        assert!(!staging.exists());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_embedding_failure_stores_nothing() {
        let dir = tempdir().unwrap();
        let mut repo = MockRepository::new();
        repo.expect_upsert().times(0);
        let service = service(Arc::new(FailingEmbedder), Arc::new(repo), dir.path().to_path_buf());

        let result = service.ingest_document("a.txt", b"hello".to_vec()).await;

        assert_matches!(result, Err(RagError::Embedding(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_is_surfaced() {
        let dir = tempdir().unwrap();
        let mut repo = MockRepository::new();
        repo.expect_upsert()
            .times(1)
            .returning(|_| Err(RagError::StoreWrite("disk full".to_string())));
        let service = service(Arc::new(ConstantEmbedder), Arc::new(repo), dir.path().to_path_buf());

        let result = service.ingest_document("a.txt", b"hello".to_vec()).await;

        let err = result.unwrap_err();
        assert_matches!(err, RagError::StoreWrite(_));
        assert!(!err.is_caller_error());
    }

    #[tokio::test]
    async fn test_query_uses_default_top_k() {
        let dir = tempdir().unwrap();
        let mut repo = MockRepository::new();
        repo.expect_query()
            .withf(|vector, top_k| vector.len() == DIM && *top_k == 5)
            .times(1)
            .returning(|_, _| Ok(Vec::new()));
        let service = service(Arc::new(ConstantEmbedder), Arc::new(repo), dir.path().to_path_buf());

        let results = service
            .query_documents(SearchQuery { text: "anything".to_string(), top_k: None })
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_query_store_failure() {
        let dir = tempdir().unwrap();
        let mut repo = MockRepository::new();
        repo.expect_query()
            .returning(|_, _| Err(RagError::StoreRead("unreachable".to_string())));
        let service = service(Arc::new(ConstantEmbedder), Arc::new(repo), dir.path().to_path_buf());

        let result = service
            .query_documents(SearchQuery { text: "q".to_string(), top_k: Some(3) })
            .await;
        assert_matches!(result, Err(RagError::StoreRead(_)));
    }

    #[tokio::test]
    async fn test_collection_stats() {
        let dir = tempdir().unwrap();
        let store = Arc::new(InMemoryVectorStore::new("docs", DIM));
        let service = service(Arc::new(ConstantEmbedder), store, dir.path().to_path_buf());
        service.ingest_document("a.txt", b"hello".to_vec()).await.unwrap();

        let stats = service.collection_stats().await.unwrap();
        assert_eq!(stats.collection, "docs");
        assert_eq!(stats.records, 1);
        assert_eq!(stats.dimension, DIM);
        assert_eq!(stats.distance, "cosine");
    }
}
