// SPDX-FileCopyrightText: 2026 Rapport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use rapport_core::types::{AnalysisRecord, AnalyzeRequest, Character, CharacterDraft};
use rapport_core::{RapportError, UserId};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::server::{GatewayState, ANALYSIS_ID_HEADER};

/// Default page size for `GET /api/analyses`.
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Largest accepted `limit` for `GET /api/analyses`.
pub const MAX_HISTORY_LIMIT: usize = 100;

/// Response body for `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    /// `mock` or `delegated`.
    pub mode: &'static str,
    /// Whether analyses are archived.
    pub storage: bool,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub analyses: Vec<AnalysisRecord>,
}

#[derive(Debug, Serialize)]
pub struct CharacterListResponse {
    pub characters: Vec<Character>,
}

/// GET /health
pub async fn health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        mode: state.analyzer.engine().label(),
        storage: state.store.is_some(),
    })
}

/// POST /api/analyze
///
/// Returns the report; when the analysis was archived its id is sent in the
/// `x-analysis-id` header so the body stays exactly the report contract.
pub async fn analyze(
    State(state): State<GatewayState>,
    Extension(user): Extension<UserId>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let analysis = state.analyzer.analyze(&user, &request).await?;

    let mut headers = HeaderMap::new();
    if let Some(id) = analysis.archive_id {
        if let Ok(value) = HeaderValue::from_str(&id) {
            headers.insert(ANALYSIS_ID_HEADER, value);
        }
    }
    Ok((headers, Json(analysis.report)).into_response())
}

/// GET /api/analyses?limit=N
pub async fn list_analyses(
    State(state): State<GatewayState>,
    Extension(user): Extension<UserId>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let Query(query) = query?;
    let limit = match query.limit {
        None => DEFAULT_HISTORY_LIMIT,
        Some(0) => {
            return Err(RapportError::Validation("limit must be at least 1".to_string()).into());
        }
        Some(n) => n.min(MAX_HISTORY_LIMIT),
    };
    let analyses = state.store()?.list_analyses(&user.0, limit).await?;
    Ok(Json(HistoryResponse { analyses }))
}

/// GET /api/characters
pub async fn list_characters(
    State(state): State<GatewayState>,
    Extension(user): Extension<UserId>,
) -> Result<Json<CharacterListResponse>, ApiError> {
    let characters = state.store()?.list_characters(&user.0).await?;
    Ok(Json(CharacterListResponse { characters }))
}

/// POST /api/characters
pub async fn create_character(
    State(state): State<GatewayState>,
    Extension(user): Extension<UserId>,
    payload: Result<Json<CharacterDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Character>), ApiError> {
    let Json(draft) = payload?;
    draft.validate()?;
    let store = state.store()?;

    let now = chrono::Utc::now().to_rfc3339();
    let character = Character {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user.0,
        name: draft.name.trim().to_string(),
        description: draft.description,
        messages: draft.messages,
        created_at: now.clone(),
        updated_at: now,
    };
    store.create_character(&character).await?;
    tracing::debug!(id = %character.id, "character created");
    Ok((StatusCode::CREATED, Json(character)))
}

fn character_not_found(id: &str) -> RapportError {
    RapportError::NotFound {
        resource: "character".to_string(),
        id: id.to_string(),
    }
}

/// GET /api/characters/{id}
pub async fn get_character(
    State(state): State<GatewayState>,
    Extension(user): Extension<UserId>,
    Path(id): Path<String>,
) -> Result<Json<Character>, ApiError> {
    let character = state
        .store()?
        .get_character(&user.0, &id)
        .await?
        .ok_or_else(|| character_not_found(&id))?;
    Ok(Json(character))
}

/// PUT /api/characters/{id}
pub async fn update_character(
    State(state): State<GatewayState>,
    Extension(user): Extension<UserId>,
    Path(id): Path<String>,
    payload: Result<Json<CharacterDraft>, JsonRejection>,
) -> Result<Json<Character>, ApiError> {
    let Json(draft) = payload?;
    draft.validate()?;
    let store = state.store()?;

    let existing = store
        .get_character(&user.0, &id)
        .await?
        .ok_or_else(|| character_not_found(&id))?;
    let updated = Character {
        name: draft.name.trim().to_string(),
        description: draft.description,
        messages: draft.messages,
        updated_at: chrono::Utc::now().to_rfc3339(),
        ..existing
    };
    if !store.update_character(&updated).await? {
        return Err(character_not_found(&id).into());
    }
    Ok(Json(updated))
}

/// DELETE /api/characters/{id}
pub async fn delete_character(
    State(state): State<GatewayState>,
    Extension(user): Extension<UserId>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.store()?.delete_character(&user.0, &id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(character_not_found(&id).into())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use rapport_analysis::Engine;
    use rapport_auth::SignedTokenVerifier;
    use rapport_core::types::{AdapterType, HealthStatus};
    use rapport_core::{PluginAdapter, StorageAdapter};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::auth::Identity;
    use crate::server::build_router;

    const SECRET: &str = "gateway-test-secret-0123";

    /// In-memory store keyed by `(user_id, id)`.
    #[derive(Default)]
    struct MemoryStore {
        analyses: Mutex<Vec<AnalysisRecord>>,
        characters: Mutex<HashMap<(String, String), Character>>,
    }

    #[async_trait]
    impl PluginAdapter for MemoryStore {
        fn name(&self) -> &str {
            "memory"
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 1, 0)
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::Storage
        }
        async fn health_check(&self) -> Result<HealthStatus, RapportError> {
            Ok(HealthStatus::Healthy)
        }
        async fn shutdown(&self) -> Result<(), RapportError> {
            Ok(())
        }
    }

    #[async_trait]
    impl StorageAdapter for MemoryStore {
        async fn initialize(&self) -> Result<(), RapportError> {
            Ok(())
        }
        async fn close(&self) -> Result<(), RapportError> {
            Ok(())
        }
        async fn save_analysis(&self, record: &AnalysisRecord) -> Result<String, RapportError> {
            self.analyses.lock().unwrap().push(record.clone());
            Ok(record.id.clone())
        }
        async fn list_analyses(&self, user_id: &str, limit: usize) -> Result<Vec<AnalysisRecord>, RapportError> {
            Ok(self
                .analyses
                .lock()
                .unwrap()
                .iter()
                .rev()
                .filter(|r| r.user_id == user_id)
                .take(limit)
                .cloned()
                .collect())
        }
        async fn create_character(&self, c: &Character) -> Result<(), RapportError> {
            self.characters
                .lock()
                .unwrap()
                .insert((c.user_id.clone(), c.id.clone()), c.clone());
            Ok(())
        }
        async fn get_character(&self, user_id: &str, id: &str) -> Result<Option<Character>, RapportError> {
            Ok(self
                .characters
                .lock()
                .unwrap()
                .get(&(user_id.to_string(), id.to_string()))
                .cloned())
        }
        async fn list_characters(&self, user_id: &str) -> Result<Vec<Character>, RapportError> {
            Ok(self
                .characters
                .lock()
                .unwrap()
                .values()
                .filter(|c| c.user_id == user_id)
                .cloned()
                .collect())
        }
        async fn update_character(&self, c: &Character) -> Result<bool, RapportError> {
            let mut map = self.characters.lock().unwrap();
            let key = (c.user_id.clone(), c.id.clone());
            Ok(map.insert(key, c.clone()).is_some())
        }
        async fn delete_character(&self, user_id: &str, id: &str) -> Result<bool, RapportError> {
            Ok(self
                .characters
                .lock()
                .unwrap()
                .remove(&(user_id.to_string(), id.to_string()))
                .is_some())
        }
    }

    fn verifier() -> Arc<SignedTokenVerifier> {
        Arc::new(SignedTokenVerifier::new(SECRET))
    }

    fn token_for(user: &str) -> String {
        verifier()
            .issue(&UserId(user.into()), chrono::Duration::hours(1))
            .unwrap()
            .0
    }

    fn app(store: Option<Arc<MemoryStore>>) -> axum::Router {
        let store = store.map(|s| s as Arc<dyn StorageAdapter>);
        let state = GatewayState::new(Engine::Mock, Identity::Verifier(verifier()), store);
        build_router(state, &["http://localhost:5173".to_string()]).unwrap()
    }

    async fn call(
        app: &axum::Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Option<Value>) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            builder = builder.header("authorization", format!("Bearer {t}"));
        }
        let request = match body {
            Some(b) => builder
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = (!bytes.is_empty()).then(|| serde_json::from_slice(&bytes).unwrap());
        (status, headers, json)
    }

    fn two_messages() -> Value {
        json!({
            "messages": [
                {"id": "m1", "speaker": "me", "text": "hi"},
                {"id": "m2", "speaker": "partner", "text": "hello"}
            ]
        })
    }

    #[tokio::test]
    async fn health_is_public() {
        let (status, _, body) = call(&app(None), "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.unwrap(), json!({"ok": true, "mode": "mock", "storage": false}));
    }

    #[tokio::test]
    async fn analyze_requires_token() {
        let (status, _, body) =
            call(&app(None), "POST", "/api/analyze", None, Some(two_messages())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.unwrap()["error"].as_str().unwrap().contains("Bearer"));

        let (status, _, _) = call(
            &app(None),
            "POST",
            "/api/analyze",
            Some("forged.9999999999.00"),
            Some(two_messages()),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unconfigured_identity_is_server_error() {
        let state = GatewayState::new(Engine::Mock, Identity::Unconfigured, None);
        let router = build_router(state, &[]).unwrap();

        let (status, _, _) = call(&router, "POST", "/api/analyze", None, Some(two_messages())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "header is checked first");

        let (status, _, body) =
            call(&router, "POST", "/api/analyze", Some("any"), Some(two_messages())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.unwrap()["error"].as_str().unwrap().contains("not configured"));
    }

    #[tokio::test]
    async fn analyze_returns_report_and_archive_header() {
        let store = Arc::new(MemoryStore::default());
        let router = app(Some(store.clone()));
        let token = token_for("alice");

        let (status, headers, body) =
            call(&router, "POST", "/api/analyze", Some(&token), Some(two_messages())).await;
        assert_eq!(status, StatusCode::OK);
        let body = body.unwrap();
        assert!(body["summary_1line"].is_string());
        assert_eq!(body["timeline_points"].as_array().unwrap().len(), 2);

        let id = headers.get(ANALYSIS_ID_HEADER).unwrap().to_str().unwrap();
        let saved = store.analyses.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].id, id);
        assert_eq!(saved[0].user_id, "alice");
        assert_eq!(saved[0].message_count, 2);
    }

    #[tokio::test]
    async fn analyze_without_store_has_no_header() {
        let (status, headers, _) = call(
            &app(None),
            "POST",
            "/api/analyze",
            Some(&token_for("alice")),
            Some(two_messages()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(headers.get(ANALYSIS_ID_HEADER).is_none());
    }

    #[tokio::test]
    async fn invalid_bodies_are_unprocessable() {
        let router = app(None);
        let token = token_for("alice");

        let one = json!({"messages": [{"id": "m1", "speaker": "me", "text": "hi"}]});
        let (status, _, body) = call(&router, "POST", "/api/analyze", Some(&token), Some(one)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body.unwrap()["error"].is_string());

        let bad_speaker = json!({"messages": [
            {"id": "m1", "speaker": "them", "text": "hi"},
            {"id": "m2", "speaker": "me", "text": "yo"}
        ]});
        let (status, _, _) =
            call(&router, "POST", "/api/analyze", Some(&token), Some(bad_speaker)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let bad_language = json!({
            "messages": [
                {"id": "m1", "speaker": "me", "text": "hi"},
                {"id": "m2", "speaker": "partner", "text": "yo"}
            ],
            "options": {"language": "fr"}
        });
        let (status, _, _) =
            call(&router, "POST", "/api/analyze", Some(&token), Some(bad_language)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn storage_routes_unavailable_without_store() {
        let token = token_for("alice");
        for (method, uri) in [
            ("GET", "/api/analyses"),
            ("GET", "/api/characters"),
            ("GET", "/api/characters/x"),
            ("DELETE", "/api/characters/x"),
        ] {
            let (status, _, _) = call(&app(None), method, uri, Some(&token), None).await;
            assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{method} {uri}");
        }
    }

    #[tokio::test]
    async fn history_lists_own_analyses() {
        let store = Arc::new(MemoryStore::default());
        let router = app(Some(store));
        let alice = token_for("alice");
        let bob = token_for("bob");

        for _ in 0..3 {
            call(&router, "POST", "/api/analyze", Some(&alice), Some(two_messages())).await;
        }
        call(&router, "POST", "/api/analyze", Some(&bob), Some(two_messages())).await;

        let (status, _, body) = call(&router, "GET", "/api/analyses?limit=2", Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        let analyses = body.unwrap()["analyses"].as_array().unwrap().clone();
        assert_eq!(analyses.len(), 2);
        assert!(analyses.iter().all(|a| a["user_id"] == "alice"));

        let (status, _, _) = call(&router, "GET", "/api/analyses?limit=0", Some(&alice), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _, _) = call(&router, "GET", "/api/analyses?limit=abc", Some(&alice), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn character_crud() {
        let store = Arc::new(MemoryStore::default());
        let router = app(Some(store));
        let token = token_for("alice");

        let draft = json!({
            "name": "  Jiwoo  ",
            "description": "college friend",
            "messages": [{"id": "m1", "speaker": "partner", "ts": "09:00", "text": "hey"}]
        });
        let (status, _, body) =
            call(&router, "POST", "/api/characters", Some(&token), Some(draft)).await;
        assert_eq!(status, StatusCode::CREATED);
        let created = body.unwrap();
        assert_eq!(created["name"], "Jiwoo");
        assert!(created.get("user_id").is_none());
        let id = created["id"].as_str().unwrap().to_string();

        let uri = format!("/api/characters/{id}");
        let (status, _, body) = call(&router, "GET", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.unwrap()["messages"][0]["ts"], "09:00");

        let (status, _, body) = call(
            &router,
            "PUT",
            &uri,
            Some(&token),
            Some(json!({"name": "Jiwoo Kim", "messages": []})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let updated = body.unwrap();
        assert_eq!(updated["name"], "Jiwoo Kim");
        assert_eq!(updated["created_at"], created["created_at"]);
        assert!(updated["description"].is_null());

        let (status, _, body) = call(&router, "GET", "/api/characters", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.unwrap()["characters"].as_array().unwrap().len(), 1);

        let other = token_for("bob");
        let (status, _, _) = call(&router, "GET", &uri, Some(&other), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _, body) = call(&router, "DELETE", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_none());

        let (status, _, _) = call(&router, "DELETE", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn character_validation() {
        let router = app(Some(Arc::new(MemoryStore::default())));
        let token = token_for("alice");

        let (status, _, _) = call(
            &router,
            "POST",
            "/api/characters",
            Some(&token),
            Some(json!({"name": "   "})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _, _) = call(
            &router,
            "PUT",
            "/api/characters/missing",
            Some(&token),
            Some(json!({"name": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn cors_preflight_allows_configured_origin() {
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/api/analyze")
            .header("origin", "http://localhost:5173")
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "authorization,content-type")
            .body(Body::empty())
            .unwrap();
        let response = app(None).oneshot(request).await.unwrap();
        let headers = response.headers();
        assert_eq!(
            headers.get("access-control-allow-origin").unwrap(),
            "http://localhost:5173"
        );
        assert_eq!(headers.get("access-control-allow-credentials").unwrap(), "true");
    }
}
