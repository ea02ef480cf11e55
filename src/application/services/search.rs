use futures::stream::{FuturesOrdered, StreamExt};
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

use crate::application::services::CollectionDiscovery;
use crate::domain::{
    ports::{FieldSelection, SimilarityRequest, VectorStoreClient},
    rank, Collection, DomainError, ErrorKind, RawHit, SearchHit, SearchOutcome, SearchQuery,
};

/// How per-collection queries are issued. Both strategies report the first
/// collection in discovery order that has hits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FanOut {
    #[default]
    Sequential,
    Concurrent,
}

impl std::str::FromStr for FanOut {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "concurrent" => Ok(Self::Concurrent),
            other => Err(DomainError::config(format!("unknown fan-out mode: {other}"))),
        }
    }
}

/// Counts how the collections that did not produce hits behaved.
#[derive(Debug, Default)]
struct FailureTally {
    answered: usize,
    unavailable: usize,
    malformed: usize,
    last_error: Option<String>,
}

impl FailureTally {
    fn record(&mut self, err: &DomainError) {
        match err.kind() {
            ErrorKind::InternalStore => self.malformed += 1,
            _ => self.unavailable += 1,
        }
        self.last_error = Some(err.to_string());
    }

    fn conclude(self) -> ScanState {
        let failed = self.unavailable + self.malformed;
        if self.answered > 0 || failed == 0 {
            return ScanState::Exhausted;
        }

        let reason = if self.unavailable == 0 {
            ErrorKind::InternalStore
        } else {
            ErrorKind::StoreUnavailable
        };
        let detail = format!(
            "all {failed} collection queries failed; last error: {}",
            self.last_error.unwrap_or_default()
        );
        ScanState::Failed { reason, detail }
    }
}

/// Linear scan over discovered collections: skip on failure, stop on the
/// first collection with hits.
#[derive(Debug)]
enum ScanState {
    Scanning { tally: FailureTally, pending: usize },
    Found { collection: String, hits: Vec<SearchHit> },
    Exhausted,
    Failed { reason: ErrorKind, detail: String },
}

impl ScanState {
    fn start(collections: usize) -> Self {
        if collections == 0 {
            Self::Exhausted
        } else {
            Self::Scanning {
                tally: FailureTally::default(),
                pending: collections,
            }
        }
    }

    fn is_terminal(&self) -> bool {
        !matches!(self, Self::Scanning { .. })
    }

    fn advance(
        self,
        collection: &Collection,
        result: Result<Vec<RawHit>, DomainError>,
        limit: usize,
    ) -> Self {
        let Self::Scanning { mut tally, pending } = self else {
            return self;
        };

        match result {
            Ok(raw) if !raw.is_empty() => {
                let hits = raw.into_iter().take(limit).map(SearchHit::from).collect();
                return Self::Found {
                    collection: collection.name().to_string(),
                    hits: rank(hits),
                };
            }
            Ok(_) => {
                tracing::debug!(collection = %collection, "collection returned no hits");
                tally.answered += 1;
            }
            Err(err) => {
                tracing::warn!(
                    collection = %collection,
                    kind = err.kind().as_str(),
                    error = %err,
                    "collection query failed, skipping"
                );
                tally.record(&err);
            }
        }

        match pending.saturating_sub(1) {
            0 => tally.conclude(),
            pending => Self::Scanning { tally, pending },
        }
    }

    fn into_outcome(self) -> SearchOutcome {
        match self {
            Self::Found { collection, hits } => SearchOutcome::Found { collection, hits },
            Self::Failed { reason, detail } => SearchOutcome::Failed { reason, detail },
            Self::Exhausted | Self::Scanning { .. } => SearchOutcome::Empty,
        }
    }
}

/// Searches discovered collections in order and returns the ranked hits of the
/// first one that matches.
pub struct SearchAggregator {
    store: Arc<dyn VectorStoreClient>,
    discovery: CollectionDiscovery,
    fields: FieldSelection,
    fan_out: FanOut,
    deadline: Option<Duration>,
}

impl SearchAggregator {
    pub fn new(store: Arc<dyn VectorStoreClient>) -> Self {
        Self {
            discovery: CollectionDiscovery::new(store.clone()),
            store,
            fields: FieldSelection::default(),
            fan_out: FanOut::default(),
            deadline: None,
        }
    }

    pub fn with_fields(mut self, fields: FieldSelection) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_fan_out(mut self, fan_out: FanOut) -> Self {
        self.fan_out = fan_out;
        self
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn fan_out(&self) -> FanOut {
        self.fan_out
    }

    /// Runs a search bounded by the configured deadline, if any.
    pub async fn search(&self, query: &SearchQuery) -> SearchOutcome {
        match self.deadline {
            Some(deadline) => self.search_until(query, tokio::time::sleep(deadline)).await,
            None => self.search_until(query, std::future::pending::<()>()).await,
        }
    }

    /// Runs a search that is abandoned as soon as `cancel` resolves. In-flight
    /// store calls are dropped and the outcome is `Failed{Cancelled}`.
    #[instrument(skip(self, query, cancel), fields(limit = query.limit, fan_out = ?self.fan_out))]
    pub async fn search_until<F>(&self, query: &SearchQuery, cancel: F) -> SearchOutcome
    where
        F: Future<Output = ()>,
    {
        let query = match query.validated() {
            Ok(query) => query,
            Err(err) => {
                tracing::debug!(error = %err, "rejected query");
                return err.into();
            }
        };

        let outcome = tokio::select! {
            biased;
            _ = cancel => {
                tracing::warn!("search cancelled before completion");
                SearchOutcome::from(DomainError::cancelled("deadline expired or caller cancelled"))
            }
            outcome = self.run(&query) => outcome,
        };

        match &outcome {
            SearchOutcome::Found { collection, hits } => {
                tracing::info!(collection = %collection, hits = hits.len(), "search matched")
            }
            SearchOutcome::Empty => tracing::info!("search found nothing"),
            SearchOutcome::Failed { reason, detail } => {
                tracing::warn!(kind = reason.as_str(), detail = %detail, "search failed")
            }
        }

        outcome
    }

    async fn run(&self, query: &SearchQuery) -> SearchOutcome {
        let collections = match self.discovery.discover().await {
            Ok(collections) => collections,
            Err(err) => return err.into(),
        };
        tracing::debug!(collections = collections.len(), "discovered collections");

        let limit = query.limit_usize();
        let mut state = ScanState::start(collections.len());

        match self.fan_out {
            FanOut::Sequential => {
                for collection in &collections {
                    let result = self.query_collection(collection, query).await;
                    state = state.advance(collection, result, limit);
                    if state.is_terminal() {
                        break;
                    }
                }
            }
            FanOut::Concurrent => {
                // Results come back in discovery order; dropping the stream
                // abandons queries behind a terminal state.
                let mut pending: FuturesOrdered<_> = collections
                    .iter()
                    .map(|c| async move { (c, self.query_collection(c, query).await) })
                    .collect();
                while let Some((collection, result)) = pending.next().await {
                    state = state.advance(collection, result, limit);
                    if state.is_terminal() {
                        break;
                    }
                }
            }
        }

        state.into_outcome()
    }

    #[instrument(skip(self, query), fields(collection = %collection))]
    async fn query_collection(
        &self,
        collection: &Collection,
        query: &SearchQuery,
    ) -> Result<Vec<RawHit>, DomainError> {
        self.store
            .query_similar(SimilarityRequest {
                collection: collection.name(),
                concept: &query.text,
                limit: query.limit_usize(),
                fields: &self.fields,
            })
            .await
    }
}
