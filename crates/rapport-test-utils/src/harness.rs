// SPDX-FileCopyrightText: 2026 Rapport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the gateway router with a signed-token verifier,
//! a chosen analysis engine, and a temp SQLite database. Requests are driven
//! through the router in-process with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use rapport_analysis::Engine;
use rapport_auth::SignedTokenVerifier;
use rapport_core::{RapportError, StorageAdapter, UserId};
use rapport_gateway::{build_router, GatewayState, Identity};
use rapport_storage::SqliteStorage;
use serde_json::Value;
use tower::ServiceExt;

use crate::mock_generator::MockGenerator;

/// Token secret used by every harness.
pub const TEST_SECRET: &str = "rapport-test-secret-0123456789";

/// Origin allowed by the harness CORS layer.
pub const TEST_ORIGIN: &str = "http://localhost:5173";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    generator: Option<MockGenerator>,
    storage: bool,
    identity: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            generator: None,
            storage: true,
            identity: true,
        }
    }

    /// Use the delegated engine backed by `generator` instead of the mock scorer.
    pub fn with_generator(mut self, generator: MockGenerator) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Run without persistence; storage-backed routes answer 503.
    pub fn without_storage(mut self) -> Self {
        self.storage = false;
        self
    }

    /// Run without an identity verifier; protected routes answer 500.
    pub fn without_identity(mut self) -> Self {
        self.identity = false;
        self
    }

    /// Build the harness, creating the temp database when storage is enabled.
    pub async fn build(self) -> Result<TestHarness, RapportError> {
        let temp_dir = tempfile::TempDir::new().map_err(RapportError::storage)?;

        let storage = if self.storage {
            let path = temp_dir.path().join("rapport-test.db");
            let storage = SqliteStorage::new(path.to_string_lossy(), true);
            storage.initialize().await?;
            Some(Arc::new(storage))
        } else {
            None
        };

        let verifier = Arc::new(SignedTokenVerifier::new(TEST_SECRET));
        let identity = if self.identity {
            Identity::Verifier(verifier.clone())
        } else {
            Identity::Unconfigured
        };

        let engine = match &self.generator {
            Some(generator) => Engine::Delegated(Arc::new(generator.clone())),
            None => Engine::Mock,
        };

        let store = storage
            .clone()
            .map(|s| s as Arc<dyn StorageAdapter>);
        let state = GatewayState::new(engine, identity, store);
        let router = build_router(state, &[TEST_ORIGIN.to_string()])?;

        Ok(TestHarness {
            router,
            verifier,
            storage,
            generator: self.generator,
            _temp_dir: temp_dir,
        })
    }
}

/// A decoded response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// `None` when the body is empty.
    pub body: Option<Value>,
}

impl TestResponse {
    /// The `{"error": ...}` message, if any.
    pub fn error(&self) -> Option<&str> {
        self.body.as_ref()?.get("error")?.as_str()
    }
}

/// A complete in-process gateway with temp storage.
pub struct TestHarness {
    /// The assembled application router.
    pub router: Router,
    /// Verifier sharing [`TEST_SECRET`] with the router.
    pub verifier: Arc<SignedTokenVerifier>,
    /// SQLite storage (temp DB, removed on drop).
    pub storage: Option<Arc<SqliteStorage>>,
    /// The delegated engine, when one was configured.
    pub generator: Option<MockGenerator>,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Mint a one-hour token for `user`.
    pub fn token_for(&self, user: &str) -> Result<String, RapportError> {
        self.verifier
            .issue(&UserId(user.to_string()), chrono::Duration::hours(1))
            .map(|t| t.0)
    }

    /// Send a request as `user` (or anonymously when `None`).
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> Result<TestResponse, RapportError> {
        let token = user.map(|u| self.token_for(u)).transpose()?;
        self.request_with_token(method, uri, token.as_deref(), body).await
    }

    /// Send a request carrying a raw bearer token.
    pub async fn request_with_token(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<TestResponse, RapportError> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .map_err(|e| RapportError::Internal(format!("invalid test request: {e}")))?;

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .map_err(|e| RapportError::Internal(format!("router failed: {e}")))?;

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|e| RapportError::Internal(format!("failed to read body: {e}")))?;
        let body = if bytes.is_empty() {
            None
        } else {
            Some(
                serde_json::from_slice(&bytes)
                    .map_err(|e| RapportError::Internal(format!("body is not JSON: {e}")))?,
            )
        };

        Ok(TestResponse {
            status,
            headers,
            body,
        })
    }
}
