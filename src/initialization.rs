use anyhow::{anyhow, Context, Result};
use std::sync::Arc;

use crate::application::rag_service::RagServiceImpl;
use crate::config::{RagConfig, StoreBackend};
use crate::domain::document_service::DocumentService;
use crate::domain::vector_repository::VectorRepository;
use crate::infrastructure::docker::{ensure_qdrant_via_docker, health_url_for};
use crate::infrastructure::embedding::{parse_model_name, EmbeddingGenerator, EmbeddingService};
use crate::infrastructure::memory_store::InMemoryVectorStore;
use crate::infrastructure::vector_db::{qdrant_client, VectorDb};
use crate::server::handler::DocumentServiceState;

/// Loads the embedding model and opens the configured store.
pub async fn build_document_service(config: &RagConfig) -> Result<Arc<dyn DocumentService>> {
    let model = parse_model_name(&config.embedding.model)
        .ok_or_else(|| anyhow!("Unknown embedding model: {}", config.embedding.model))?;
    let cache_dir = config.embedding.cache_dir.clone();

    log::info!("Loading embedding model '{}'...", config.embedding.model);
    let generator = tokio::task::spawn_blocking(move || EmbeddingGenerator::new(model, cache_dir))
        .await
        .context("Embedding model loader panicked")?
        .inspect_err(|e| log::error!("Failed to create EmbeddingGenerator: {:?}", e))?;
    let embedder = Arc::new(EmbeddingService::new(Arc::new(generator), config.embedding.max_concurrent));
    log::info!(
        "Embedding model '{}' ready (dimension {}, {} concurrent workers).",
        embedder.model_name(),
        embedder.dimension(),
        embedder.max_concurrent()
    );

    let vector_db = open_store(config, embedder.dimension()).await?;

    Ok(Arc::new(RagServiceImpl::new(
        embedder,
        vector_db,
        config.ingest.staging_dir.clone(),
        config.query.default_top_k,
    )))
}

async fn open_store(config: &RagConfig, dimension: usize) -> Result<Arc<dyn VectorRepository>> {
    match config.store.backend {
        StoreBackend::Memory => {
            log::warn!("Using the in-memory store; documents will not survive a restart.");
            Ok(Arc::new(InMemoryVectorStore::new(config.store.collection.clone(), dimension)))
        }
        StoreBackend::Qdrant => {
            if config.store.auto_start_qdrant {
                if let Err(e) = ensure_qdrant_via_docker(health_url_for(&config.store.qdrant_url)).await {
                    // A Qdrant managed elsewhere may still be reachable over gRPC.
                    log::error!("Qdrant check/start failed: {}", e);
                }
            }

            let client = qdrant_client::Qdrant::from_url(&config.store.qdrant_url)
                .build()
                .with_context(|| format!("Failed to build Qdrant client for {}", config.store.qdrant_url))?;
            let vector_db = VectorDb::new(Box::new(client), config.store.collection.clone(), dimension as u64)?;
            vector_db
                .initialize_collection()
                .await
                .with_context(|| format!("Failed to open collection '{}'", config.store.collection))?;
            Ok(Arc::new(vector_db))
        }
    }
}

/// Performs all the heavy initialization in the background and publishes the
/// service into the handler state.
pub async fn initialize_background_services(
    config: Arc<RagConfig>,
    service_state: DocumentServiceState,
) -> Result<()> {
    let service = build_document_service(&config).await?;

    let mut state = service_state
        .lock()
        .map_err(|_| anyhow!("Document service state lock poisoned"))?;
    *state = Some(service);
    log::info!("DocumentService is now initialized and available.");
    Ok(())
}
