use serde::Serialize;

use crate::domain::DomainError;

pub const DEFAULT_LIMIT: i64 = 5;
pub const MIN_LIMIT: i64 = 1;
pub const MAX_LIMIT: i64 = 50;

/// Clamps a caller-supplied result limit into `[MIN_LIMIT, MAX_LIMIT]`.
pub fn clamp_limit(limit: i64) -> i64 {
    limit.clamp(MIN_LIMIT, MAX_LIMIT)
}

/// A free-text search request.
///
/// Fields stay public so transport code can build one directly; the search
/// service re-validates through [`SearchQuery::validated`] before touching the
/// store, so an out-of-range limit or blank text never reaches a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchQuery {
    pub text: String,
    pub limit: i64,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>, limit: Option<i64>) -> Result<Self, DomainError> {
        Self {
            text: text.into(),
            limit: limit.unwrap_or(DEFAULT_LIMIT),
        }
        .validated()
    }

    /// Returns a copy with trimmed text and a clamped limit, or
    /// `InvalidQuery` when nothing but whitespace is left.
    pub fn validated(&self) -> Result<Self, DomainError> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(DomainError::invalid_query("query text must not be empty"));
        }

        Ok(Self {
            text: text.to_string(),
            limit: clamp_limit(self.limit),
        })
    }

    pub fn limit_usize(&self) -> usize {
        clamp_limit(self.limit) as usize
    }
}
