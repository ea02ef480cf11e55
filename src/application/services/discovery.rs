use std::sync::Arc;
use tracing::instrument;

use crate::domain::{ports::VectorStoreClient, Collection, DomainError};

/// Resolves the searchable collections currently declared by the store.
///
/// Nothing is cached: every call costs one schema round trip, since the
/// schema may change between requests.
pub struct CollectionDiscovery {
    store: Arc<dyn VectorStoreClient>,
}

impl CollectionDiscovery {
    pub fn new(store: Arc<dyn VectorStoreClient>) -> Self {
        Self { store }
    }

    /// Collection names in store order, with blank names dropped. An empty
    /// schema is a valid result.
    #[instrument(skip(self))]
    pub async fn discover(&self) -> Result<Vec<Collection>, DomainError> {
        let schema = self.store.get_schema().await?;
        let declared = schema.collections.len();

        let collections: Vec<Collection> = schema
            .collections
            .into_iter()
            .filter_map(|c| Collection::new(c.name))
            .collect();

        if collections.len() != declared {
            tracing::debug!(
                declared,
                kept = collections.len(),
                "dropped blank collection names"
            );
        }

        Ok(collections)
    }
}
