pub mod document;
pub mod document_service;
pub mod embedding;
pub mod error;
pub mod vector_repository;
