pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod initialization;
pub mod server;

pub use application::rag_service::RagServiceImpl;
pub use config::{load_config, RagConfig, StoreBackend};
pub use domain::document::{
    CollectionStats, DocumentFormat, IngestReceipt, QueryMatch, SearchQuery, StoredRecord,
};
pub use domain::document_service::DocumentService;
pub use domain::embedding::Embedder;
pub use domain::error::{ErrorKind, RagError};
pub use domain::vector_repository::VectorRepository;
pub use fastembed::EmbeddingModel;
pub use infrastructure::embedding::{EmbeddingGenerator, EmbeddingService};
pub use infrastructure::memory_store::InMemoryVectorStore;
pub use infrastructure::vector_db::{qdrant_client, VectorDb};
