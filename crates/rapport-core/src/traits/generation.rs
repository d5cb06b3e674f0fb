// SPDX-FileCopyrightText: 2026 Rapport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generation adapter trait for the delegated LLM engine.

use async_trait::async_trait;

use crate::error::RapportError;
use crate::traits::adapter::PluginAdapter;
use crate::types::GenerationRequest;

/// Adapter for the external generative engine.
///
/// The returned text is untrusted: callers must route it through the
/// report reconciler before handing anything to a client.
#[async_trait]
pub trait GenerationAdapter: PluginAdapter {
    /// Sends one prompt pair with its output schema and returns the raw text.
    async fn generate(&self, request: GenerationRequest) -> Result<String, RapportError>;
}
