pub mod docker;
pub mod embedding;
pub mod extract;
pub mod file_system;
pub mod memory_store;
pub mod staging;
pub mod vector_db;

// Re-export key types for easier access from application layer
pub use embedding::{EmbeddingGenerator, EmbeddingService};
pub use memory_store::InMemoryVectorStore;
pub use vector_db::VectorDb;

// Re-export EmbeddingModel directly from the dependency
pub use fastembed::EmbeddingModel;
