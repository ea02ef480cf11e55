mod collection;
mod hit;
mod outcome;
mod query;

pub use collection::{Collection, CollectionDescriptor, StoreSchema};
pub use hit::{rank, RawHit, SearchHit};
pub use outcome::SearchOutcome;
pub use query::{clamp_limit, SearchQuery, DEFAULT_LIMIT, MAX_LIMIT, MIN_LIMIT};
