// SPDX-FileCopyrightText: 2026 Rapport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::future::Future;
use std::sync::Arc;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use rapport_analysis::{Analyzer, Archive, Engine};
use rapport_core::{RapportError, StorageAdapter};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::{auth_middleware, Identity};
use crate::handlers;

/// Response header carrying the archive id of a stored analysis.
pub const ANALYSIS_ID_HEADER: &str = "x-analysis-id";

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub analyzer: Analyzer,
    pub identity: Identity,
    /// Backs the history and character routes; `None` answers 503.
    pub store: Option<Arc<dyn StorageAdapter>>,
}

impl GatewayState {
    /// Wires the analyzer so that it archives into the same store the
    /// history and character routes read from.
    pub fn new(engine: Engine, identity: Identity, store: Option<Arc<dyn StorageAdapter>>) -> Self {
        let archive = match &store {
            Some(store) => Archive::Enabled(store.clone()),
            None => Archive::Disabled,
        };
        Self {
            analyzer: Analyzer::new(engine, archive),
            identity,
            store,
        }
    }

    /// The configured store, or [`RapportError::Unavailable`].
    pub fn store(&self) -> Result<&Arc<dyn StorageAdapter>, RapportError> {
        self.store
            .as_ref()
            .ok_or_else(|| RapportError::Unavailable("persistence is not configured".to_string()))
    }
}

/// CORS for the configured browser origins, with credentials.
fn cors_layer(origins: &[String]) -> Result<CorsLayer, RapportError> {
    let origins = origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o)
                .map_err(|e| RapportError::Config(format!("invalid CORS origin `{o}`: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([HeaderName::from_static(ANALYSIS_ID_HEADER)]))
}

/// Builds the application router.
///
/// - `GET /health` (public)
/// - `POST /api/analyze`
/// - `GET /api/analyses`
/// - `GET|POST /api/characters`
/// - `GET|PUT|DELETE /api/characters/{id}`
pub fn build_router(state: GatewayState, cors_origins: &[String]) -> Result<Router, RapportError> {
    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/api/analyze", post(handlers::analyze))
        .route("/api/analyses", get(handlers::list_analyses))
        .route(
            "/api/characters",
            get(handlers::list_characters).post(handlers::create_character),
        )
        .route(
            "/api/characters/{id}",
            get(handlers::get_character)
                .put(handlers::update_character)
                .delete(handlers::delete_character),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.identity.clone(),
            auth_middleware,
        ))
        .with_state(state);

    Ok(Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(cors_layer(cors_origins)?)
        .layer(TraceLayer::new_for_http()))
}

/// Binds `host:port` and serves `router` until `shutdown` resolves.
pub async fn start_server(
    host: &str,
    port: u16,
    router: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), RapportError> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| RapportError::Config(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("Rapport listening on {addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| RapportError::Internal(format!("gateway server error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_without_store_disables_archive() {
        let state = GatewayState::new(Engine::Mock, Identity::Unconfigured, None);
        assert!(!state.analyzer.archive().is_enabled());
        assert!(matches!(state.store(), Err(RapportError::Unavailable(_))));
    }

    #[test]
    fn invalid_cors_origin_is_config_error() {
        let state = GatewayState::new(Engine::Mock, Identity::Unconfigured, None);
        let err = build_router(state, &["bad\norigin".to_string()]).unwrap_err();
        assert!(matches!(err, RapportError::Config(_)));
    }
}
