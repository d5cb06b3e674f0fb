// SPDX-FileCopyrightText: 2026 Rapport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic Messages API generation adapter for Rapport.
//!
//! [`AnthropicGenerator`] implements [`GenerationAdapter`] by offering the
//! model a single `submit_analysis` tool whose input schema is the report
//! contract, and forcing the model to call it. The tool input is returned as
//! raw JSON text for the reconciler to validate.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use rapport_config::model::AnthropicConfig;
use rapport_core::error::RapportError;
use rapport_core::traits::{GenerationAdapter, PluginAdapter};
use rapport_core::types::{AdapterType, GenerationRequest, HealthStatus};
use tracing::{debug, info, warn};

use crate::client::AnthropicClient;
use crate::types::{
    ApiMessage, MessageRequest, MessageResponse, ResponseContentBlock, ToolChoice, ToolDefinition,
};

/// Name of the tool the model is forced to call.
pub const SUBMIT_TOOL: &str = "submit_analysis";

/// Generation engine backed by the Anthropic Messages API.
///
/// API key resolution order: config -> `ANTHROPIC_API_KEY` env var -> error.
pub struct AnthropicGenerator {
    client: AnthropicClient,
    max_tokens: u32,
}

impl AnthropicGenerator {
    /// Creates a generator from the `[anthropic]` config section.
    pub fn new(config: &AnthropicConfig) -> Result<Self, RapportError> {
        let api_key = resolve_api_key(&config.api_key)?;
        let client = AnthropicClient::new(
            &api_key,
            &config.api_version,
            config.default_model.clone(),
            Duration::from_secs(config.timeout_secs),
        )?;

        info!(
            model = config.default_model,
            timeout_secs = config.timeout_secs,
            "Anthropic generator initialized"
        );

        Ok(Self {
            client,
            max_tokens: config.max_tokens,
        })
    }

    #[cfg(test)]
    fn with_client(client: AnthropicClient, max_tokens: u32) -> Self {
        Self { client, max_tokens }
    }

    fn to_message_request(&self, request: GenerationRequest) -> MessageRequest {
        MessageRequest {
            model: self.client.default_model().to_string(),
            messages: vec![ApiMessage::user(request.user_prompt)],
            system: Some(request.system_prompt),
            max_tokens: self.max_tokens,
            tools: vec![ToolDefinition {
                name: SUBMIT_TOOL.to_string(),
                description: "Submit the finished relationship analysis report.".to_string(),
                input_schema: request.output_schema,
            }],
            tool_choice: Some(ToolChoice::Tool {
                name: SUBMIT_TOOL.to_string(),
            }),
        }
    }
}

/// Pulls the raw report text out of a response.
///
/// Prefers the `submit_analysis` tool input; falls back to concatenated text
/// blocks so the reconciler can report what the model actually said.
fn extract_payload(response: MessageResponse) -> Result<String, RapportError> {
    let mut text = String::new();
    for block in response.content {
        match block {
            ResponseContentBlock::ToolUse { name, input, .. } if name == SUBMIT_TOOL => {
                return serde_json::to_string(&input).map_err(|e| RapportError::Provider {
                    message: format!("failed to serialize tool input: {e}"),
                    source: Some(Box::new(e)),
                });
            }
            ResponseContentBlock::Text { text: t } => text.push_str(&t),
            ResponseContentBlock::ToolUse { name, .. } => {
                warn!(tool = %name, "model called an unexpected tool");
            }
            ResponseContentBlock::Unsupported => {}
        }
    }

    if text.is_empty() {
        return Err(RapportError::Provider {
            message: format!(
                "response {} contained no analysis (stop_reason: {})",
                response.id,
                response.stop_reason.as_deref().unwrap_or("none")
            ),
            source: None,
        });
    }
    Ok(text)
}

#[async_trait]
impl PluginAdapter for AnthropicGenerator {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Generation
    }

    async fn health_check(&self) -> Result<HealthStatus, RapportError> {
        // No API call: a health probe should not spend tokens.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), RapportError> {
        debug!("Anthropic generator shutting down");
        Ok(())
    }
}

#[async_trait]
impl GenerationAdapter for AnthropicGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String, RapportError> {
        let api_request = self.to_message_request(request);
        let response = self.client.complete_message(&api_request).await?;
        debug!(
            id = %response.id,
            model = %response.model,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "analysis generated"
        );
        extract_payload(response)
    }
}

/// Resolves the API key from config or environment.
pub fn resolve_api_key(config_key: &Option<String>) -> Result<String, RapportError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.clone());
    }

    match std::env::var("ANTHROPIC_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(key),
        _ => Err(RapportError::Config(
            "Anthropic API key not found. Set anthropic.api_key in config or ANTHROPIC_API_KEY environment variable.".into(),
        )),
    }
}
