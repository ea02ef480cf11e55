pub mod config;
pub mod embedding;
pub mod vector_store;

pub use config::{AppConfig, LogFormat, StoreBackend};
pub use embedding::TextEmbedding;
pub use vector_store::{
    connect_store, InMemoryVectorStore, QdrantStore, StoredRecord, WeaviateStore,
};
