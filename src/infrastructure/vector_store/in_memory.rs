use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::domain::{
    ports::{SimilarityRequest, VectorStoreClient},
    DomainError, RawHit, StoreSchema,
};

/// A record with a precomputed distance to whatever concept matches it.
/// Text lives in named properties so queries can select them by name, like
/// the schema properties of a real store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub id: Option<String>,
    pub properties: BTreeMap<String, String>,
    pub distance: Option<f64>,
}

impl StoredRecord {
    /// A record with `title` and `body` properties.
    pub fn new(id: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            properties: BTreeMap::new(),
            distance: None,
        }
        .with_property("title", title)
        .with_property("body", body)
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn with_distance(mut self, distance: f64) -> Self {
        self.distance = Some(distance);
        self
    }

    /// True when any whitespace-separated term of `concept` occurs in one of
    /// `searched` properties, ignoring case.
    fn matches(&self, concept: &str, searched: [&str; 2]) -> bool {
        let haystack = searched
            .iter()
            .filter_map(|name| self.properties.get(*name))
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        concept
            .split_whitespace()
            .any(|term| haystack.contains(&term.to_lowercase()))
    }
}

#[derive(Default)]
struct Inner {
    /// Declaration order doubles as discovery order.
    collections: Vec<(String, Vec<StoredRecord>)>,
    failures: HashMap<String, DomainError>,
    schema_failure: Option<DomainError>,
}

/// Process-local store for development and tests. Supports failure
/// injection per collection and counts calls.
#[derive(Default)]
pub struct InMemoryVectorStore {
    inner: RwLock<Inner>,
    schema_calls: AtomicUsize,
    query_calls: AtomicUsize,
    closed: AtomicBool,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(
        self,
        collection: impl Into<String>,
        records: impl IntoIterator<Item = StoredRecord>,
    ) -> Self {
        if let Ok(mut inner) = self.inner.write() {
            let collection = collection.into();
            inner.collections.retain(|(name, _)| *name != collection);
            inner.collections.push((collection, records.into_iter().collect()));
        }
        self
    }

    /// Makes every query against `collection` fail with `error`.
    pub fn with_failure(self, collection: impl Into<String>, error: DomainError) -> Self {
        if let Ok(mut inner) = self.inner.write() {
            let collection = collection.into();
            if !inner.collections.iter().any(|(name, _)| *name == collection) {
                inner.collections.push((collection.clone(), Vec::new()));
            }
            inner.failures.insert(collection, error);
        }
        self
    }

    pub fn with_schema_failure(self, error: DomainError) -> Self {
        if let Ok(mut inner) = self.inner.write() {
            inner.schema_failure = Some(error);
        }
        self
    }

    pub fn schema_calls(&self) -> usize {
        self.schema_calls.load(Ordering::Relaxed)
    }

    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::Relaxed)
    }

    fn ensure_open(&self) -> Result<(), DomainError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(DomainError::unavailable("store client is closed"));
        }
        Ok(())
    }
}

#[async_trait]
impl VectorStoreClient for InMemoryVectorStore {
    async fn get_schema(&self) -> Result<StoreSchema, DomainError> {
        self.schema_calls.fetch_add(1, Ordering::Relaxed);
        self.ensure_open()?;
        let inner = self
            .inner
            .read()
            .map_err(|e| DomainError::internal_store(e.to_string()))?;

        if let Some(err) = &inner.schema_failure {
            return Err(err.clone());
        }

        Ok(StoreSchema::from_names(
            inner.collections.iter().map(|(name, _)| name.clone()),
        ))
    }

    async fn query_similar(
        &self,
        request: SimilarityRequest<'_>,
    ) -> Result<Vec<RawHit>, DomainError> {
        self.query_calls.fetch_add(1, Ordering::Relaxed);
        self.ensure_open()?;
        let inner = self
            .inner
            .read()
            .map_err(|e| DomainError::internal_store(e.to_string()))?;

        if let Some(err) = inner.failures.get(request.collection) {
            return Err(err.clone());
        }

        let records = inner
            .collections
            .iter()
            .find(|(name, _)| name == request.collection)
            .map(|(_, records)| records.as_slice())
            .ok_or_else(|| {
                DomainError::internal_store(format!("unknown collection {}", request.collection))
            })?;

        Ok(records
            .iter()
            .filter(|record| record.matches(request.concept, request.fields.properties()))
            .take(request.limit)
            .map(|record| RawHit {
                id: record.id.clone().filter(|_| request.fields.with_id),
                title: record.properties.get(&request.fields.title).cloned(),
                body: record.properties.get(&request.fields.body).cloned(),
                distance: record.distance.filter(|_| request.fields.with_distance),
            })
            .collect())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::FieldSelection;

    fn request<'a>(
        collection: &'a str,
        concept: &'a str,
        limit: usize,
        fields: &'a FieldSelection,
    ) -> SimilarityRequest<'a> {
        SimilarityRequest {
            collection,
            concept,
            limit,
            fields,
        }
    }

    #[tokio::test]
    async fn test_schema_in_insert_order() {
        let store = InMemoryVectorStore::new()
            .with_collection("Recipes", Vec::new())
            .with_collection("Articles", Vec::new());
        let schema = store.get_schema().await.unwrap();
        assert_eq!(schema, StoreSchema::from_names(["Recipes", "Articles"]));
        assert_eq!(store.schema_calls(), 1);
    }

    #[tokio::test]
    async fn test_term_match_and_limit() {
        let fields = FieldSelection::default();
        let store = InMemoryVectorStore::new().with_collection(
            "Recipes",
            [
                StoredRecord::new("1", "Oat Cookies", "Rolled oats").with_distance(0.2),
                StoredRecord::new("2", "Bread", "Flour and water").with_distance(0.1),
                StoredRecord::new("3", "Sugar cookies", "Butter").with_distance(0.4),
            ],
        );

        let hits = store
            .query_similar(request("Recipes", "COOKIES", 10, &fields))
            .await
            .unwrap();
        let ids: Vec<_> = hits.iter().map(|h| h.id.as_deref().unwrap()).collect();
        assert_eq!(ids, vec!["1", "3"]);

        let hits = store
            .query_similar(request("Recipes", "cookies", 1, &fields))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(store.query_calls(), 2);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let fields = FieldSelection::default();
        let store = InMemoryVectorStore::new()
            .with_failure("Broken", DomainError::unavailable("connection reset"));
        let err = store
            .query_similar(request("Broken", "x", 5, &fields))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn test_selects_properties_by_requested_name() {
        let fields = FieldSelection::new("name", "content");
        let store = InMemoryVectorStore::new().with_collection(
            "Recipes",
            [
                StoredRecord::new("1", "Cookies", "ignored body")
                    .with_property("name", "Ginger snaps")
                    .with_property("content", "Crisp cookies with ginger"),
                StoredRecord::new("2", "Cookies", "only default fields"),
            ],
        );

        let hits = store
            .query_similar(request("Recipes", "cookies", 10, &fields))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id.as_deref(), Some("1"));
        assert_eq!(hits[0].title.as_deref(), Some("Ginger snaps"));
        assert_eq!(hits[0].body.as_deref(), Some("Crisp cookies with ginger"));
    }

    #[tokio::test]
    async fn test_missing_property_is_absent() {
        let fields = FieldSelection::default();
        let record = StoredRecord {
            id: None,
            properties: BTreeMap::from([("title".to_string(), "cookies".to_string())]),
            distance: None,
        };
        let store = InMemoryVectorStore::new().with_collection("Notes", [record]);
        let hits = store
            .query_similar(request("Notes", "cookies", 5, &fields))
            .await
            .unwrap();
        assert_eq!(hits[0].title.as_deref(), Some("cookies"));
        assert_eq!(hits[0].body, None);
    }

    #[tokio::test]
    async fn test_close() {
        let store = InMemoryVectorStore::new();
        store.close().await;
        assert!(store.get_schema().await.is_err());
    }
}
