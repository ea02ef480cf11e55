//! Application layer - search orchestration.
//!
//! Services here depend on domain ports (traits) rather than concrete store
//! adapters, so the same aggregator runs against any vector store.

pub mod services;

pub use services::{CollectionDiscovery, FanOut, SearchAggregator};
