//! Semantic search over a vector store whose collections are discovered at
//! request time. The first collection, in schema order, that matches the
//! query supplies the ranked results.

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;
