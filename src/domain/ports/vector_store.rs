use crate::domain::{errors::DomainError, RawHit, StoreSchema};
use async_trait::async_trait;

/// Which record properties and metadata a similarity query asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSelection {
    pub title: String,
    pub body: String,
    pub with_id: bool,
    pub with_distance: bool,
}

impl FieldSelection {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            with_id: true,
            with_distance: true,
        }
    }

    pub fn properties(&self) -> [&str; 2] {
        [&self.title, &self.body]
    }
}

impl Default for FieldSelection {
    fn default() -> Self {
        Self::new("title", "body")
    }
}

/// A concept-similarity query against one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimilarityRequest<'a> {
    pub collection: &'a str,
    pub concept: &'a str,
    pub limit: usize,
    pub fields: &'a FieldSelection,
}

/// Capability over a vector store's wire protocol.
///
/// `get_schema` fails with `StoreUnavailable` on connectivity or auth problems
/// and `InternalStore` when the schema document has the wrong shape.
/// `query_similar` uses the same split for per-collection queries.
#[async_trait]
pub trait VectorStoreClient: Send + Sync {
    async fn get_schema(&self) -> Result<StoreSchema, DomainError>;

    async fn query_similar(
        &self,
        request: SimilarityRequest<'_>,
    ) -> Result<Vec<RawHit>, DomainError>;

    /// Releases the client. Later calls fail with `StoreUnavailable`.
    async fn close(&self) {}
}
