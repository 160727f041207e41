//! # rssrelay API Server
//!
//! HTTP front end for the feed relay.
//!
//! ## Endpoints
//!
//! - `GET /v1/feed?url=<feed>&count=<n>&key=<api key>` - First items of a feed
//! - `GET /health` - Liveness and relay counters
//!
//! ## Example
//!
//! ```rust,ignore
//! use rssrelay_api::{ApiConfig, ApiServer};
//!
//! let config = ApiConfig::from_env();
//! let server = ApiServer::from_config(config).await?;
//! server.run(([0, 0, 0, 0], 3000)).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod dto;
mod error;
mod handlers;
mod routes;
mod state;

pub use dto::{FeedQuery, HealthResponse};
pub use error::{ApiError, ErrorResponse};
pub use routes::create_router;
pub use state::{ApiConfig, AppState, CorsPolicy, DEFAULT_PORT};

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// API server for rssrelay.
pub struct ApiServer {
    state: Arc<AppState>,
}

impl ApiServer {
    /// Creates a server around prepared state.
    pub fn new(state: AppState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// Connects the configured store and builds the server.
    pub async fn from_config(config: ApiConfig) -> rssrelay_core::Result<Self> {
        Ok(Self::new(AppState::from_config(config).await?))
    }

    /// Creates the router with all routes and layers configured.
    pub fn router(&self) -> Router {
        let router = create_router(self.state.clone());
        let router = match cors_layer(&self.state.config.cors) {
            Some(cors) => router.layer(cors),
            None => router,
        };
        router.layer(TraceLayer::new_for_http())
    }

    /// Runs the server on the given address.
    pub async fn run(self, addr: impl Into<SocketAddr>) -> std::io::Result<()> {
        let addr = addr.into();
        let listener = tokio::net::TcpListener::bind(addr).await?;

        info!("rssrelay listening on {}", addr);

        axum::serve(listener, self.router()).await
    }
}

fn cors_layer(policy: &CorsPolicy) -> Option<CorsLayer> {
    let origins = match policy {
        CorsPolicy::Disabled => return None,
        CorsPolicy::AllowAll => AllowOrigin::from(Any),
        CorsPolicy::AllowList(list) => {
            let values: Vec<HeaderValue> = list
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        warn!(origin = %origin, "Skipping invalid CORS origin");
                        None
                    }
                })
                .collect();
            AllowOrigin::list(values)
        }
    };

    Some(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET])
            .allow_headers(Any),
    )
}
