// SPDX-FileCopyrightText: 2026 Rapport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generation engine double for deterministic testing.
//!
//! `MockGenerator` implements `GenerationAdapter` with a queue of scripted
//! outcomes, enabling delegated-mode tests without external API calls.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use rapport_core::types::{AdapterType, GenerationRequest, HealthStatus};
use rapport_core::{GenerationAdapter, PluginAdapter, RapportError};

enum Outcome {
    Payload(String),
    Failure(String),
}

/// A generation engine that replays pre-configured outcomes.
///
/// Outcomes are popped from a FIFO queue. When the queue is empty, the
/// engine fails with a provider error. Every request is recorded.
#[derive(Clone, Default)]
pub struct MockGenerator {
    outcomes: Arc<Mutex<VecDeque<Outcome>>>,
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl MockGenerator {
    /// Create a generator with an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a generator pre-loaded with raw payloads.
    pub fn with_responses(responses: Vec<String>) -> Self {
        let outcomes = responses.into_iter().map(Outcome::Payload).collect();
        Self {
            outcomes: Arc::new(Mutex::new(outcomes)),
            requests: Arc::default(),
        }
    }

    /// Queue a raw payload.
    pub async fn push_response(&self, raw: impl Into<String>) {
        self.outcomes.lock().await.push_back(Outcome::Payload(raw.into()));
    }

    /// Queue a provider failure.
    pub async fn push_failure(&self, message: impl Into<String>) {
        self.outcomes.lock().await.push_back(Outcome::Failure(message.into()));
    }

    /// Requests received so far, oldest first.
    pub async fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl PluginAdapter for MockGenerator {
    fn name(&self) -> &str {
        "mock-generator"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Generation
    }

    async fn health_check(&self) -> Result<HealthStatus, RapportError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), RapportError> {
        Ok(())
    }
}

#[async_trait]
impl GenerationAdapter for MockGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String, RapportError> {
        self.requests.lock().await.push(request);
        match self.outcomes.lock().await.pop_front() {
            Some(Outcome::Payload(raw)) => Ok(raw),
            Some(Outcome::Failure(message)) => Err(RapportError::Provider {
                message,
                source: None,
            }),
            None => Err(RapportError::Provider {
                message: "mock generator has no queued response".to_string(),
                source: None,
            }),
        }
    }
}
