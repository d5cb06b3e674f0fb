// SPDX-FileCopyrightText: 2026 Rapport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `rapport serve`: adapter wiring and the HTTP server lifecycle.

use std::sync::Arc;

use rapport_analysis::Engine;
use rapport_anthropic::AnthropicGenerator;
use rapport_auth::SignedTokenVerifier;
use rapport_config::{AnalysisMode, RapportConfig};
use rapport_core::{RapportError, StorageAdapter};
use rapport_gateway::{build_router, start_server, GatewayState, Identity};
use rapport_storage::SqliteStorage;
use tracing::{info, warn};

/// Builds the analysis engine selected by `analysis.mode`.
///
/// Delegated mode fails here when no API key can be resolved.
pub fn build_engine(config: &RapportConfig) -> Result<Engine, RapportError> {
    match config.analysis.mode {
        AnalysisMode::Mock => Ok(Engine::Mock),
        AnalysisMode::Delegated => {
            let generator = AnthropicGenerator::new(&config.anthropic)?;
            Ok(Engine::Delegated(Arc::new(generator)))
        }
    }
}

/// Identity verification from `auth.token_secret`, or unconfigured.
pub fn build_identity(config: &RapportConfig) -> Identity {
    match &config.auth.token_secret {
        Some(secret) => Identity::Verifier(Arc::new(SignedTokenVerifier::new(secret.as_bytes()))),
        None => {
            warn!("auth.token_secret is not set; protected routes will answer 500");
            Identity::Unconfigured
        }
    }
}

/// Opens and migrates the store when `storage.database_path` is set.
pub async fn build_storage(config: &RapportConfig) -> Result<Option<Arc<SqliteStorage>>, RapportError> {
    let Some(storage) = SqliteStorage::from_config(&config.storage) else {
        info!("storage.database_path is not set; persistence disabled");
        return Ok(None);
    };
    storage.initialize().await?;
    info!(path = storage.path(), "storage initialized");
    Ok(Some(Arc::new(storage)))
}

/// Runs the `rapport serve` command until SIGINT or SIGTERM.
pub async fn run_serve(config: RapportConfig) -> Result<(), RapportError> {
    init_tracing(&config.server.log_level);

    info!(mode = %config.analysis.mode, "starting rapport serve");

    let engine = build_engine(&config)?;
    let identity = build_identity(&config);
    let storage = build_storage(&config).await?;

    let store = storage.clone().map(|s| s as Arc<dyn StorageAdapter>);
    let state = GatewayState::new(engine, identity, store);
    let router = build_router(state, &config.server.cors_origins)?;

    let served = start_server(
        &config.server.host,
        config.server.port,
        router,
        shutdown_signal(),
    )
    .await;

    if let Some(storage) = storage {
        if let Err(e) = storage.close().await {
            warn!(error = %e, "failed to close storage cleanly");
        }
    }

    info!("rapport stopped");
    served
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT (Ctrl+C), initiating shutdown"),
        _ = terminate => info!("received SIGTERM, initiating shutdown"),
    }
}

/// Initializes the tracing subscriber. `RUST_LOG` overrides `server.log_level`.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("rapport={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(toml: &str) -> RapportConfig {
        rapport_config::load_and_validate_str(toml).unwrap()
    }

    #[test]
    fn mock_mode_builds_mock_engine() {
        let engine = build_engine(&config("")).unwrap();
        assert_eq!(engine.label(), "mock");
    }

    #[test]
    fn delegated_mode_with_key_builds_generator() {
        let engine = build_engine(&config(
            "[analysis]\nmode = \"delegated\"\n[anthropic]\napi_key = \"sk-test\"\n",
        ))
        .unwrap();
        assert_eq!(engine.label(), "delegated");
    }

    #[test]
    fn identity_follows_token_secret() {
        assert!(matches!(build_identity(&config("")), Identity::Unconfigured));
        let configured = build_identity(&config("[auth]\ntoken_secret = \"0123456789abcdef\"\n"));
        assert!(matches!(configured, Identity::Verifier(_)));
    }

    #[tokio::test]
    async fn storage_is_optional() {
        assert!(build_storage(&config("")).await.unwrap().is_none());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("serve.db");
        let toml = format!("[storage]\ndatabase_path = \"{}\"\n", path.display());
        let storage = build_storage(&config(&toml)).await.unwrap().unwrap();
        assert_eq!(storage.path(), path.to_string_lossy());
        storage.close().await.unwrap();
    }
}
