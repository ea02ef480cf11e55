use std::sync::Arc;

use crate::application::SearchAggregator;
use crate::domain::ports::VectorStoreClient;
use crate::infrastructure::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn VectorStoreClient>,
    pub aggregator: Arc<SearchAggregator>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Wires the aggregator over the shared store client using the search
    /// section of `config`.
    pub fn new(store: Arc<dyn VectorStoreClient>, config: AppConfig) -> Self {
        let aggregator = SearchAggregator::new(store.clone())
            .with_fields(config.search.fields())
            .with_fan_out(config.search.fan_out)
            .with_deadline(config.search.deadline());

        Self {
            store,
            aggregator: Arc::new(aggregator),
            config: Arc::new(config),
        }
    }

    pub fn with_aggregator(mut self, aggregator: SearchAggregator) -> Self {
        self.aggregator = Arc::new(aggregator);
        self
    }
}
