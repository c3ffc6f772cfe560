//! In-process vector store.
//!
//! Keeps records in a map and ranks by brute-force cosine distance. Nothing is
//! persisted, so it suits tests and throwaway sessions rather than real use.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::document::{QueryMatch, StoredRecord};
use crate::domain::error::RagError;
use crate::domain::vector_repository::VectorRepository;

pub struct InMemoryVectorStore {
    collection_name: String,
    dimension: usize,
    records: RwLock<HashMap<String, StoredRecord>>,
}

impl InMemoryVectorStore {
    pub fn new(collection_name: impl Into<String>, dimension: usize) -> Self {
        Self {
            collection_name: collection_name.into(),
            dimension,
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Returns a copy of the record stored under `id`.
    pub async fn get(&self, id: &str) -> Option<StoredRecord> {
        self.records.read().await.get(id).cloned()
    }
}

/// `1 - cosine_similarity`; a zero vector is treated as orthogonal to everything.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorRepository for InMemoryVectorStore {
    async fn upsert(&self, record: StoredRecord) -> Result<(), RagError> {
        if record.vector.len() != self.dimension {
            return Err(RagError::StoreWrite(format!(
                "vector dimension ({}) does not match collection dimension ({})",
                record.vector.len(),
                self.dimension
            )));
        }
        let mut records = self.records.write().await;
        if records.insert(record.id.clone(), record).is_some() {
            log::debug!("Replaced existing record in '{}'", self.collection_name);
        }
        Ok(())
    }

    async fn query(&self, vector: Vec<f32>, top_k: usize) -> Result<Vec<QueryMatch>, RagError> {
        if vector.len() != self.dimension {
            return Err(RagError::StoreRead(format!(
                "query vector dimension ({}) does not match collection dimension ({})",
                vector.len(),
                self.dimension
            )));
        }
        let records = self.records.read().await;
        let mut matches: Vec<QueryMatch> = records
            .values()
            .map(|record| QueryMatch {
                id: record.id.clone(),
                text: record.text.clone(),
                distance: cosine_distance(&vector, &record.vector),
            })
            .collect();

        // Ties break on id so results are stable across calls.
        matches.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        if top_k > 0 {
            matches.truncate(top_k);
        }
        Ok(matches)
    }

    async fn count(&self) -> Result<u64, RagError> {
        Ok(self.records.read().await.len() as u64)
    }

    fn collection_name(&self) -> &str {
        &self.collection_name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn distance_metric(&self) -> &str {
        "cosine"
    }
}
