use crate::domain::{DomainError, ErrorKind, SearchHit};

/// Terminal value of one aggregation run.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// The first collection, in discovery order, with at least one hit.
    /// `hits` is non-empty and ranked.
    Found {
        collection: String,
        hits: Vec<SearchHit>,
    },
    Empty,
    Failed {
        reason: ErrorKind,
        detail: String,
    },
}

impl SearchOutcome {
    pub fn failed(reason: ErrorKind, detail: impl Into<String>) -> Self {
        Self::Failed {
            reason,
            detail: detail.into(),
        }
    }

    pub fn collection(&self) -> Option<&str> {
        match self {
            Self::Found { collection, .. } => Some(collection),
            _ => None,
        }
    }

    pub fn hits(&self) -> &[SearchHit] {
        match self {
            Self::Found { hits, .. } => hits,
            _ => &[],
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl From<DomainError> for SearchOutcome {
    fn from(err: DomainError) -> Self {
        Self::failed(err.kind(), err.detail())
    }
}
