pub mod bulk_ingest;
pub mod rag_service;
