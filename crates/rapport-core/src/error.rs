// SPDX-FileCopyrightText: 2026 Rapport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Rapport analysis service.

use thiserror::Error;

/// The primary error type used across adapter traits and core operations.
#[derive(Debug, Error)]
pub enum RapportError {
    /// Malformed caller input (too few messages, empty text, bad option value).
    #[error("validation error: {0}")]
    Validation(String),

    /// Deployment misconfiguration (missing credential, unconfigured verifier).
    #[error("configuration error: {0}")]
    Config(String),

    /// Missing or invalid caller identity.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The generation engine returned text that is not a single JSON object.
    #[error("malformed engine output: {message}")]
    MalformedOutput { message: String },

    /// The generation engine returned JSON that violates the report contract.
    #[error("schema violation at `{field}`: {reason}")]
    SchemaViolation { field: String, reason: String },

    /// Generation provider errors (HTTP failure, API error response).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A requested resource does not exist (or belongs to someone else).
    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    /// An optional collaborator needed for this operation is not configured.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RapportError {
    /// Wraps any error as a storage failure.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            source: Box::new(err),
        }
    }

    /// Short machine-readable name of the variant, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Config(_) => "config",
            Self::Unauthorized(_) => "unauthorized",
            Self::MalformedOutput { .. } => "malformed_output",
            Self::SchemaViolation { .. } => "schema_violation",
            Self::Provider { .. } => "provider",
            Self::Storage { .. } => "storage",
            Self::NotFound { .. } => "not_found",
            Self::Unavailable(_) => "unavailable",
            Self::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_violation_names_field() {
        let err = RapportError::SchemaViolation {
            field: "timeline_points[3].mood".into(),
            reason: "must be between 0 and 100".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("timeline_points[3].mood"));
        assert_eq!(err.kind(), "schema_violation");
    }

    #[test]
    fn storage_helper_boxes_source() {
        let err = RapportError::storage(std::io::Error::other("disk full"));
        assert!(err.to_string().contains("disk full"));
        assert_eq!(err.kind(), "storage");
    }
}
