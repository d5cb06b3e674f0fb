// SPDX-FileCopyrightText: 2026 Rapport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping from [`RapportError`] to HTTP responses.
//!
//! Every error body has the shape `{"error": "<message>"}`.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rapport_core::RapportError;
use serde::Serialize;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// A handler error, rendered with the status matching its kind.
#[derive(Debug)]
pub struct ApiError(pub RapportError);

impl From<RapportError> for ApiError {
    fn from(err: RapportError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(RapportError::Validation(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(RapportError::Validation(rejection.body_text()))
    }
}

/// HTTP status for each error kind.
pub fn status_for(err: &RapportError) -> StatusCode {
    match err {
        RapportError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        RapportError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        RapportError::NotFound { .. } => StatusCode::NOT_FOUND,
        RapportError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        RapportError::MalformedOutput { .. }
        | RapportError::SchemaViolation { .. }
        | RapportError::Provider { .. } => StatusCode::BAD_GATEWAY,
        RapportError::Config(_) | RapportError::Storage { .. } | RapportError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let message = match &self.0 {
            // Database detail stays in the logs.
            RapportError::Storage { .. } => "storage failure".to_string(),
            other => other.to_string(),
        };
        if status.is_server_error() {
            tracing::error!(kind = self.0.kind(), error = %self.0, "request failed");
        } else {
            tracing::debug!(kind = self.0.kind(), error = %self.0, "request rejected");
        }
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
