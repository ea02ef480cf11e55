use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::api::state::AppState;
use crate::domain::{DomainError, ErrorKind, SearchHit, SearchOutcome, SearchQuery};

/// Inbound search parameters, from the query string or a JSON body.
#[derive(Debug, Default, Deserialize)]
pub struct SearchRequest {
    #[serde(alias = "q", alias = "text")]
    pub query: Option<String>,
    #[serde(default, deserialize_with = "deserialize_limit")]
    pub limit: Option<i64>,
}

/// Accepts the limit as a JSON number or a numeric string. Integers outside
/// the `i64` range saturate so clamping still applies to them.
fn deserialize_limit<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    struct LimitVisitor;

    impl<'de> de::Visitor<'de> for LimitVisitor {
        type Value = Option<i64>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an integer limit")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(i64::try_from(v).unwrap_or(i64::MAX)))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            if v.fract() != 0.0 || v.is_nan() {
                return Err(E::invalid_value(de::Unexpected::Float(v), &self));
            }
            // `as` saturates at the i64 bounds.
            Ok(Some(v as i64))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            let v = v.trim();
            if v.is_empty() {
                return Ok(None);
            }
            if let Ok(limit) = v.parse::<i64>() {
                return Ok(Some(limit));
            }
            let (negative, digits) = match v.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, v.strip_prefix('+').unwrap_or(v)),
            };
            if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                Ok(Some(if negative { i64::MIN } else { i64::MAX }))
            } else {
                Err(E::invalid_value(de::Unexpected::Str(v), &self))
            }
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
            d.deserialize_any(self)
        }
    }

    deserializer.deserialize_any(LimitVisitor)
}

impl SearchRequest {
    pub fn into_query(self) -> Result<SearchQuery, DomainError> {
        let text = self
            .query
            .ok_or_else(|| DomainError::invalid_query("missing `query` parameter"))?;
        SearchQuery::new(text, self.limit)
    }
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub collection: Option<String>,
    pub count: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorKind,
    pub message: String,
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidQuery => StatusCode::BAD_REQUEST,
        ErrorKind::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::InternalStore => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::Cancelled => StatusCode::GATEWAY_TIMEOUT,
    }
}

fn error_response(kind: ErrorKind, message: impl Into<String>) -> Response {
    let body = ErrorResponse {
        success: false,
        error: kind,
        message: message.into(),
    };
    (status_for(kind), Json(body)).into_response()
}

/// Maps a search outcome onto the HTTP envelope.
pub fn outcome_response(outcome: SearchOutcome) -> Response {
    match outcome {
        SearchOutcome::Found { collection, hits } => Json(SearchResponse {
            success: true,
            collection: Some(collection),
            count: hits.len(),
            results: hits,
        })
        .into_response(),
        SearchOutcome::Empty => Json(SearchResponse {
            success: true,
            collection: None,
            count: 0,
            results: Vec::new(),
        })
        .into_response(),
        SearchOutcome::Failed { reason, detail } => error_response(reason, detail),
    }
}

async fn run_search(state: &AppState, request: SearchRequest) -> Response {
    let query = match request.into_query() {
        Ok(query) => query,
        Err(e) => return error_response(e.kind(), e.detail()),
    };

    outcome_response(state.aggregator.search(&query).await)
}

pub async fn search_get(
    State(state): State<AppState>,
    params: Result<Query<SearchRequest>, QueryRejection>,
) -> Response {
    match params {
        Ok(Query(request)) => run_search(&state, request).await,
        Err(rejection) => error_response(ErrorKind::InvalidQuery, rejection.body_text()),
    }
}

pub async fn search_post(
    State(state): State<AppState>,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> Response {
    match body {
        Ok(Json(request)) => run_search(&state, request).await,
        Err(rejection) => error_response(ErrorKind::InvalidQuery, rejection.body_text()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_aliases() {
        let request: SearchRequest =
            serde_json::from_value(serde_json::json!({ "q": "cookies", "limit": 900 })).unwrap();
        let query = request.into_query().unwrap();
        assert_eq!(query.text, "cookies");
        assert_eq!(query.limit, 50);

        let request: SearchRequest =
            serde_json::from_value(serde_json::json!({ "text": "tea" })).unwrap();
        assert_eq!(request.into_query().unwrap().limit, 5);
    }

    #[test]
    fn test_out_of_range_limit_saturates() {
        let request: SearchRequest =
            serde_json::from_str(r#"{ "query": "cookies", "limit": 99999999999999999999 }"#)
                .unwrap();
        assert_eq!(request.into_query().unwrap().limit, 50);

        let request: SearchRequest =
            serde_json::from_str(r#"{ "query": "cookies", "limit": "99999999999999999999" }"#)
                .unwrap();
        assert_eq!(request.limit, Some(i64::MAX));

        let request: SearchRequest =
            serde_json::from_str(r#"{ "query": "cookies", "limit": "-99999999999999999999" }"#)
                .unwrap();
        assert_eq!(request.into_query().unwrap().limit, 1);
    }

    #[test]
    fn test_non_numeric_limit_is_rejected() {
        assert!(serde_json::from_str::<SearchRequest>(r#"{ "query": "x", "limit": "ten" }"#).is_err());
        assert!(serde_json::from_str::<SearchRequest>(r#"{ "query": "x", "limit": 2.5 }"#).is_err());

        let request: SearchRequest =
            serde_json::from_str(r#"{ "query": "x", "limit": null }"#).unwrap();
        assert_eq!(request.limit, None);
    }

    #[test]
    fn test_missing_query_is_invalid() {
        let err = SearchRequest::default().into_query().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidQuery);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(ErrorKind::InvalidQuery), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(ErrorKind::StoreUnavailable),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(ErrorKind::InternalStore),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(status_for(ErrorKind::Cancelled), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn test_empty_outcome_is_ok() {
        let response = outcome_response(SearchOutcome::Empty);
        assert_eq!(response.status(), StatusCode::OK);
    }
}
