mod discovery;
mod search;

pub use discovery::CollectionDiscovery;
pub use search::{FanOut, SearchAggregator};
