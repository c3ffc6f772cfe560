use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

// Use the re-exported module path for Qdrant internally
pub use qdrant_client;
use self::qdrant_client::qdrant::value::Kind as QdrantValueKind;
use self::qdrant_client::qdrant::vectors_config::Config as VectorsConfigKind;
use self::qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, Distance, PointId, PointStruct, SearchPointsBuilder,
    UpsertPointsBuilder, Value as QdrantValue, VectorParamsBuilder,
};
use self::qdrant_client::{Payload, Qdrant};

use crate::domain::document::{QueryMatch, StoredRecord};
use crate::domain::error::RagError;
use crate::domain::vector_repository::VectorRepository;

const IDENTITY_FIELD: &str = "identity";
const TEXT_FIELD: &str = "text";

/// Qdrant-backed collection using cosine distance.
///
/// Points are keyed by a UUIDv5 of the document identity, so re-ingesting a
/// name overwrites its point.
pub struct VectorDb {
    client: Box<Qdrant>,
    collection_name: String,
    vector_size: u64,
}

impl VectorDb {
    /// Creates a new VectorDb instance.
    ///
    /// # Arguments
    ///
    /// * `client` - An initialized Qdrant client.
    /// * `collection_name` - The name of the collection to use.
    /// * `vector_size` - The dimension of the vectors.
    pub fn new(client: Box<Qdrant>, collection_name: String, vector_size: u64) -> Result<Self> {
        if collection_name.is_empty() {
            return Err(anyhow!("Collection name cannot be empty"));
        }
        if vector_size == 0 {
            return Err(anyhow!("Vector size must be greater than zero"));
        }
        Ok(Self { client, collection_name, vector_size })
    }

    /// Creates the collection if it doesn't exist.
    ///
    /// An existing collection is never recreated; if its dimension or metric
    /// disagrees with ours this fails instead.
    pub async fn initialize_collection(&self) -> Result<()> {
        log::info!("Checking if collection '{}' exists...", self.collection_name);

        if self.client.collection_exists(self.collection_name.as_str()).await? {
            log::info!("Collection '{}' already exists.", self.collection_name);
            return self.verify_existing_collection().await;
        }

        log::info!(
            "Creating collection '{}' with size {} and distance Cosine...",
            self.collection_name,
            self.vector_size
        );
        let create_builder = CreateCollectionBuilder::new(self.collection_name.clone())
            .vectors_config(VectorParamsBuilder::new(self.vector_size, Distance::Cosine));

        match self.client.create_collection(create_builder).await {
            Ok(_) => {
                log::info!("Successfully created collection '{}'.", self.collection_name);
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to create collection '{}': {}", self.collection_name, e);
                Err(anyhow!("Failed to create collection: {}", e))
            }
        }
    }

    async fn verify_existing_collection(&self) -> Result<()> {
        let info = self.client.collection_info(self.collection_name.as_str()).await?;
        let params = info
            .result
            .and_then(|r| r.config)
            .and_then(|c| c.params)
            .and_then(|p| p.vectors_config)
            .and_then(|v| v.config);

        match params {
            Some(VectorsConfigKind::Params(params)) => {
                if params.size != self.vector_size {
                    bail!(
                        "Collection '{}' stores vectors of dimension {}, but the embedding model produces {}",
                        self.collection_name,
                        params.size,
                        self.vector_size
                    );
                }
                if params.distance != Distance::Cosine as i32 {
                    bail!(
                        "Collection '{}' uses a different distance metric than cosine",
                        self.collection_name
                    );
                }
                Ok(())
            }
            _ => bail!(
                "Collection '{}' has no single unnamed vector configuration",
                self.collection_name
            ),
        }
    }

    async fn count_points(&self) -> Result<u64, RagError> {
        let response = self
            .client
            .count(CountPointsBuilder::new(self.collection_name.clone()).exact(true))
            .await
            .map_err(|e| RagError::StoreRead(format!("Qdrant count failed: {e}")))?;
        Ok(response.result.map(|r| r.count).unwrap_or(0))
    }
}

/// Stable point id for a document identity.
pub fn point_id(identity: &str) -> PointId {
    PointId::from(Uuid::new_v5(&Uuid::NAMESPACE_OID, identity.as_bytes()).to_string())
}

fn string_field(payload: &HashMap<String, QdrantValue>, key: &str) -> Option<String> {
    match payload.get(key).and_then(|v| v.kind.as_ref()) {
        Some(QdrantValueKind::StringValue(s)) => Some(s.clone()),
        _ => None,
    }
}

#[async_trait]
impl VectorRepository for VectorDb {
    async fn upsert(&self, record: StoredRecord) -> Result<(), RagError> {
        if record.vector.len() as u64 != self.vector_size {
            return Err(RagError::StoreWrite(format!(
                "Vector dimension ({}) does not match collection dimension ({})",
                record.vector.len(),
                self.vector_size
            )));
        }

        let payload = Payload::try_from(serde_json::json!({
            "identity": &record.id,
            "text": &record.text,
        }))
        .map_err(|e| RagError::StoreWrite(format!("Failed to build payload: {e}")))?;
        let point = PointStruct::new(point_id(&record.id), record.vector, payload);

        let upsert_builder = UpsertPointsBuilder::new(self.collection_name.clone(), vec![point]).wait(true);
        match self.client.upsert_points(upsert_builder).await {
            Ok(response) => {
                log::debug!("Upsert response: {:?}", response);
                log::info!("Upserted '{}' into collection '{}'.", record.id, self.collection_name);
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to upsert '{}' into collection '{}': {}", record.id, self.collection_name, e);
                Err(RagError::StoreWrite(format!("Qdrant upsert failed: {e}")))
            }
        }
    }

    async fn query(&self, vector: Vec<f32>, top_k: usize) -> Result<Vec<QueryMatch>, RagError> {
        if vector.len() as u64 != self.vector_size {
            return Err(RagError::StoreRead(format!(
                "Query vector dimension ({}) does not match collection dimension ({})",
                vector.len(),
                self.vector_size
            )));
        }

        let limit = if top_k == 0 { self.count_points().await? } else { top_k as u64 };
        if limit == 0 {
            return Ok(Vec::new());
        }

        log::info!("Searching in collection '{}' with limit {}...", self.collection_name, limit);
        let search_request =
            SearchPointsBuilder::new(self.collection_name.clone(), vector, limit).with_payload(true);
        let response = self.client.search_points(search_request).await.map_err(|e| {
            log::error!("Qdrant search failed in collection '{}': {}", self.collection_name, e);
            RagError::StoreRead(format!("Qdrant search failed: {e}"))
        })?;

        // Qdrant returns cosine similarity, best first; report it as a distance.
        let matches: Vec<QueryMatch> = response
            .result
            .into_iter()
            .filter_map(|scored_point| {
                let id = string_field(&scored_point.payload, IDENTITY_FIELD);
                let text = string_field(&scored_point.payload, TEXT_FIELD);
                match (id, text) {
                    (Some(id), Some(text)) => Some(QueryMatch {
                        id,
                        text,
                        distance: 1.0 - scored_point.score,
                    }),
                    _ => {
                        log::warn!("Search result point {:?} has an incomplete payload, skipping.", scored_point.id);
                        None
                    }
                }
            })
            .collect();

        log::info!("Search returned {} results.", matches.len());
        Ok(matches)
    }

    async fn count(&self) -> Result<u64, RagError> {
        self.count_points().await
    }

    fn collection_name(&self) -> &str {
        &self.collection_name
    }

    fn dimension(&self) -> usize {
        self.vector_size as usize
    }

    fn distance_metric(&self) -> &str {
        "cosine"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_id_is_stable_per_identity() {
        assert_eq!(point_id("report.pdf"), point_id("report.pdf"));
        assert_ne!(point_id("report.pdf"), point_id("report.docx"));
    }

    fn string_value(s: &str) -> QdrantValue {
        QdrantValue { kind: Some(QdrantValueKind::StringValue(s.to_string())) }
    }

    #[test]
    fn test_string_field() {
        let mut map = HashMap::new();
        map.insert("identity".to_string(), string_value("a.txt"));
        map.insert("size".to_string(), QdrantValue { kind: Some(QdrantValueKind::IntegerValue(3)) });
        assert_eq!(string_field(&map, "identity"), Some("a.txt".to_string()));
        assert_eq!(string_field(&map, "size"), None);
        assert_eq!(string_field(&map, "missing"), None);
    }
}
