// SPDX-FileCopyrightText: 2026 Rapport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bearer-token authentication middleware.
//!
//! The `Authorization` header is checked before the verifier: a missing or
//! malformed header is 401 even when no verifier is configured, and a
//! well-formed header against an unconfigured deployment is a 500.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use rapport_core::types::AuthToken;
use rapport_core::{IdentityAdapter, RapportError};

use crate::error::ApiError;

/// The identity verifier, or its explicit absence.
#[derive(Clone, Default)]
pub enum Identity {
    #[default]
    Unconfigured,
    Verifier(Arc<dyn IdentityAdapter>),
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Identity::Unconfigured => f.write_str("Unconfigured"),
            Identity::Verifier(v) => f.debug_tuple("Verifier").field(&v.name()).finish(),
        }
    }
}

/// Extracts the token from `Authorization: Bearer <token>`.
pub fn bearer_token(request: &Request) -> Option<AuthToken> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| AuthToken(t.to_string()))
}

/// Verifies the caller and inserts their [`UserId`](rapport_core::UserId)
/// as a request extension.
pub async fn auth_middleware(
    State(identity): State<Identity>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&request).ok_or_else(|| {
        RapportError::Unauthorized("missing Authorization Bearer token".to_string())
    })?;

    let Identity::Verifier(verifier) = identity else {
        tracing::error!("request rejected: no identity verifier configured");
        return Err(RapportError::Config("identity verification is not configured".to_string()).into());
    };

    let user = verifier.verify(token).await.map_err(|e| {
        tracing::debug!(error = %e, "token rejected");
        match e {
            RapportError::Unauthorized(_) => {
                RapportError::Unauthorized("invalid or expired token".to_string())
            }
            other => other,
        }
    })?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
