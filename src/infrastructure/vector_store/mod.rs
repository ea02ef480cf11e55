mod in_memory;
mod qdrant;
mod weaviate;

pub use in_memory::{InMemoryVectorStore, StoredRecord};
pub use qdrant::QdrantStore;
pub use weaviate::WeaviateStore;

use std::sync::Arc;

use crate::domain::{ports::VectorStoreClient, DomainError};
use crate::infrastructure::config::{AppConfig, StoreBackend};
use crate::infrastructure::embedding::TextEmbedding;

/// Builds the process-wide store client for the configured backend.
pub fn connect_store(config: &AppConfig) -> Result<Arc<dyn VectorStoreClient>, DomainError> {
    let store: Arc<dyn VectorStoreClient> = match config.store.backend {
        StoreBackend::Weaviate => Arc::new(WeaviateStore::new(&config.store.weaviate)?),
        StoreBackend::Qdrant => {
            let embedding = Arc::new(TextEmbedding::from_config(&config.embedding)?);
            Arc::new(QdrantStore::new(&config.store.qdrant, embedding)?)
        }
        StoreBackend::Memory => Arc::new(InMemoryVectorStore::new()),
    };

    tracing::info!(backend = ?config.store.backend, "vector store client ready");
    Ok(store)
}
