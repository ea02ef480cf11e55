use serde::Serialize;
use thiserror::Error;

/// Classification of a failed search, carried by `SearchOutcome::Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidQuery,
    StoreUnavailable,
    #[serde(rename = "internal_store_error")]
    InternalStore,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidQuery => "invalid_query",
            Self::StoreUnavailable => "store_unavailable",
            Self::InternalStore => "internal_store_error",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Vector store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Vector store returned an unexpected response: {0}")]
    InternalStore(String),

    #[error("Search cancelled: {0}")]
    Cancelled(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DomainError {
    pub fn invalid_query(msg: impl Into<String>) -> Self {
        Self::InvalidQuery(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::StoreUnavailable(msg.into())
    }

    pub fn internal_store(msg: impl Into<String>) -> Self {
        Self::InternalStore(msg.into())
    }

    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Search-facing classification. Configuration problems surface before
    /// any search runs, so they count as an unavailable store if they leak.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidQuery(_) => ErrorKind::InvalidQuery,
            Self::StoreUnavailable(_) | Self::Config(_) => ErrorKind::StoreUnavailable,
            Self::InternalStore(_) => ErrorKind::InternalStore,
            Self::Cancelled(_) => ErrorKind::Cancelled,
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            Self::InvalidQuery(msg)
            | Self::StoreUnavailable(msg)
            | Self::InternalStore(msg)
            | Self::Cancelled(msg)
            | Self::Config(msg) => msg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(DomainError::invalid_query("x").kind(), ErrorKind::InvalidQuery);
        assert_eq!(DomainError::unavailable("x").kind(), ErrorKind::StoreUnavailable);
        assert_eq!(DomainError::internal_store("x").kind(), ErrorKind::InternalStore);
        assert_eq!(DomainError::cancelled("x").kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::InternalStore).unwrap();
        assert_eq!(json, "\"internal_store_error\"");
        assert_eq!(ErrorKind::StoreUnavailable.as_str(), "store_unavailable");
    }
}
