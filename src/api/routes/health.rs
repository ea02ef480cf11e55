use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::api::state::AppState;
use crate::application::CollectionDiscovery;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub store: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collections: Option<usize>,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// Ready once the store answers a schema request.
pub async fn readiness_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<ReadinessResponse>) {
    match CollectionDiscovery::new(state.store.clone()).discover().await {
        Ok(collections) => (
            StatusCode::OK,
            Json(ReadinessResponse {
                status: "ready".into(),
                store: "connected".into(),
                collections: Some(collections.len()),
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessResponse {
                    status: "not_ready".into(),
                    store: e.kind().as_str().into(),
                    collections: None,
                }),
            )
        }
    }
}
