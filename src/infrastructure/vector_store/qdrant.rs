use async_trait::async_trait;
use qdrant_client::qdrant::{point_id::PointIdOptions, PointId, ScoredPoint, SearchPointsBuilder};
use qdrant_client::Qdrant;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::domain::{
    ports::{EmbeddingService, FieldSelection, SimilarityRequest, VectorStoreClient},
    DomainError, RawHit, StoreSchema,
};
use crate::infrastructure::config::QdrantConfig;

/// Qdrant-backed store. Collections are listed as the schema and the concept
/// is embedded before each vector search.
pub struct QdrantStore {
    client: Qdrant,
    embedding: Arc<dyn EmbeddingService>,
    closed: AtomicBool,
}

impl QdrantStore {
    pub fn new(
        config: &QdrantConfig,
        embedding: Arc<dyn EmbeddingService>,
    ) -> Result<Self, DomainError> {
        let mut builder = Qdrant::from_url(&config.url);
        if let Some(key) = &config.api_key {
            builder = builder.api_key(key.clone());
        }
        let client = builder
            .build()
            .map_err(|e| DomainError::config(format!("failed to build qdrant client: {e}")))?;

        Ok(Self {
            client,
            embedding,
            closed: AtomicBool::new(false),
        })
    }

    fn ensure_open(&self) -> Result<(), DomainError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(DomainError::unavailable("store client is closed"));
        }
        Ok(())
    }
}

#[async_trait]
impl VectorStoreClient for QdrantStore {
    async fn get_schema(&self) -> Result<StoreSchema, DomainError> {
        self.ensure_open()?;
        let response = self
            .client
            .list_collections()
            .await
            .map_err(|e| DomainError::unavailable(e.to_string()))?;

        Ok(StoreSchema::from_names(
            response.collections.into_iter().map(|c| c.name),
        ))
    }

    async fn query_similar(
        &self,
        request: SimilarityRequest<'_>,
    ) -> Result<Vec<RawHit>, DomainError> {
        self.ensure_open()?;
        let vector = self
            .embedding
            .embed(request.concept)
            .await
            .map_err(|e| DomainError::unavailable(format!("embedding failed: {e}")))?;

        if vector.len() != self.embedding.dimension() {
            return Err(DomainError::internal_store(format!(
                "embedding has {} dimensions, expected {}",
                vector.len(),
                self.embedding.dimension()
            )));
        }

        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(request.collection, vector, request.limit as u64)
                    .with_payload(true),
            )
            .await
            .map_err(|e| DomainError::unavailable(e.to_string()))?;

        Ok(response
            .result
            .into_iter()
            .map(|point| scored_point_to_hit(point, request.fields))
            .collect())
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::info!("qdrant client closed");
        }
    }
}

fn point_id_to_string(id: PointId) -> Option<String> {
    match id.point_id_options? {
        PointIdOptions::Num(n) => Some(n.to_string()),
        PointIdOptions::Uuid(uuid) => Some(uuid),
    }
}

/// Cosine similarity `score` becomes a distance where lower is closer.
fn scored_point_to_hit(point: ScoredPoint, fields: &FieldSelection) -> RawHit {
    let text = |name: &str| {
        point
            .payload
            .get(name)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    };

    RawHit {
        title: text(&fields.title),
        body: text(&fields.body),
        id: if fields.with_id {
            point.id.clone().and_then(point_id_to_string)
        } else {
            None
        },
        distance: fields.with_distance.then(|| 1.0 - f64::from(point.score)),
    }
}
