//! API route handlers.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use tracing::{instrument, warn, Span};

use rssrelay_core::types::{FeedRequest, RelayResponse};

use crate::dto::{FeedQuery, HealthResponse};
use crate::error::ApiError;
use crate::state::AppState;

type Result<T> = std::result::Result<T, ApiError>;

/// GET /v1/feed
///
/// The key is checked before the parameters. A query string that does not
/// deserialize, such as a repeated `url`, is an invalid request.
#[instrument(skip_all, fields(url = tracing::field::Empty))]
pub async fn get_feed(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<FeedQuery>, QueryRejection>,
) -> Result<Json<RelayResponse>> {
    let Query(query) = query.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "Rejected unreadable query string");
        ApiError::invalid_request(rejection.body_text())
    })?;
    if let Some(url) = query.url.as_deref() {
        Span::current().record("url", url);
    }

    if let Some(expected) = &state.config.api_key {
        if query.key.as_deref() != Some(expected.as_str()) {
            warn!("Rejected request with invalid key");
            return Err(ApiError::unauthorized());
        }
    }

    let request = FeedRequest::from_params(
        query.url.as_deref(),
        query.count.as_deref(),
        state.relay.config().default_count,
    )?;

    let response = state.relay.relay(&request).await?;
    Ok(Json(response))
}

/// GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        uptime_seconds: state.uptime_seconds(),
        relay: state.relay.stats(),
    })
}
