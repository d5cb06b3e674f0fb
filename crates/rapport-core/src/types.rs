// SPDX-FileCopyrightText: 2026 Rapport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the analysis engines, adapters, and the gateway.
//!
//! Wire names follow the HTTP contract: request options are camelCase,
//! report fields are snake_case.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::RapportError;

/// Upper bound for every integer score in a report.
pub const SCORE_MAX: u8 = 100;

/// Inclusive score range for which the liking index is declared a tie.
pub const TIE_RANGE: std::ops::RangeInclusive<u8> = 46..=54;

/// Minimum number of messages in an analysis request.
pub const MIN_MESSAGES: usize = 2;

/// Opaque identifier of a verified caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A bearer token presented by a caller, not yet verified.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(pub String);

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthToken([redacted])")
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the capability an adapter provides.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Generation,
    Identity,
    Storage,
}

// --- Transcript ---

/// One of the two participants in a transcript.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Speaker {
    Me,
    Partner,
}

/// A single chat message as received from the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub speaker: Speaker,
    #[serde(
        rename = "ts",
        alias = "timestamp",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<String>,
    pub text: String,
}

/// Output language for static texts and generated prose.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Language {
    #[default]
    Ko,
    En,
}

/// Caller options controlling which optional report sections are populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeOptions {
    #[serde(default)]
    pub language: Language,
    #[serde(default = "default_true")]
    pub want_highlights: bool,
    #[serde(default = "default_true")]
    pub want_metrics: bool,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            language: Language::Ko,
            want_highlights: true,
            want_metrics: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Request body for an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub messages: Vec<Message>,
    #[serde(default)]
    pub options: AnalyzeOptions,
}

impl AnalyzeRequest {
    /// Rejects transcripts the engines must never see.
    pub fn validate(&self) -> Result<(), RapportError> {
        if self.messages.len() < MIN_MESSAGES {
            return Err(RapportError::Validation(format!(
                "messages must contain at least {MIN_MESSAGES} entries, got {}",
                self.messages.len()
            )));
        }
        validate_messages(&self.messages)
    }
}

/// Checks per-message constraints: non-empty id and text, ids unique.
pub fn validate_messages(messages: &[Message]) -> Result<(), RapportError> {
    let mut seen = HashSet::with_capacity(messages.len());
    for (i, m) in messages.iter().enumerate() {
        if m.id.is_empty() {
            return Err(RapportError::Validation(format!(
                "messages[{i}].id must not be empty"
            )));
        }
        if m.text.is_empty() {
            return Err(RapportError::Validation(format!(
                "messages[{i}].text must not be empty"
            )));
        }
        if !seen.insert(m.id.as_str()) {
            return Err(RapportError::Validation(format!(
                "messages[{i}].id `{}` is duplicated",
                m.id
            )));
        }
    }
    Ok(())
}

// --- Report ---

/// Confidence attached to a report or a liking index.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// A per-speaker score pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsPair {
    pub me: u8,
    pub partner: u8,
}

/// Behavioral metrics for both speakers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    pub initiative: MetricsPair,
    pub responsiveness: MetricsPair,
    pub warmth: MetricsPair,
    pub repair: MetricsPair,
    pub balance_index: u8,
}

/// Polarity of a highlight: green is positive, red is negative.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HighlightKind {
    Green,
    Red,
}

/// A flagged message with a short rationale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    #[serde(rename = "type")]
    pub kind: HighlightKind,
    pub message_id: String,
    pub reason: String,
}

/// Which speaker the liking index favors.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Winner {
    Me,
    Partner,
    Tie,
}

impl Winner {
    /// Derives the winner from a liking score.
    ///
    /// Scores in [`TIE_RANGE`] are a tie; above 50 favors `me`, otherwise `partner`.
    pub fn from_score(score: u8) -> Self {
        if TIE_RANGE.contains(&score) {
            Winner::Tie
        } else if score > 50 {
            Winner::Me
        } else {
            Winner::Partner
        }
    }
}

/// Relative affection/engagement asymmetry between the speakers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikingIndex {
    pub score: u8,
    pub winner: Winner,
    pub rationale: String,
    pub confidence: Confidence,
}

/// One sampled message annotated with signal values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub message_id: String,
    pub sequence_index: u32,
    pub speaker: Speaker,
    pub mood: u8,
    pub tension: u8,
    pub repair: u8,
}

/// The analysis result returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    #[serde(rename = "summary_1line")]
    pub summary: String,
    pub confidence: Confidence,
    pub metrics: Option<Metrics>,
    pub highlights: Vec<Highlight>,
    pub liking_index: Option<LikingIndex>,
    pub timeline_points: Vec<TimelinePoint>,
}

// --- Persistence ---

/// An archived analysis. Raw message text is never part of the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: String,
    pub user_id: String,
    pub created_at: String,
    pub options: AnalyzeOptions,
    pub result: AnalysisReport,
    pub message_count: usize,
}

/// Maximum length of a character name, in characters.
pub const CHARACTER_NAME_MAX: usize = 80;

/// Maximum number of messages stored with a character.
pub const CHARACTER_MESSAGES_MAX: usize = 1000;

/// A saved transcript template owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Character {
    pub id: String,
    #[serde(skip_serializing)]
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub messages: Vec<Message>,
    pub created_at: String,
    pub updated_at: String,
}

/// Caller-supplied fields for creating or replacing a character.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CharacterDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl CharacterDraft {
    /// Validates name length and the embedded transcript.
    pub fn validate(&self) -> Result<(), RapportError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(RapportError::Validation(
                "name must not be empty".to_string(),
            ));
        }
        if name.chars().count() > CHARACTER_NAME_MAX {
            return Err(RapportError::Validation(format!(
                "name must be at most {CHARACTER_NAME_MAX} characters"
            )));
        }
        if self.messages.len() > CHARACTER_MESSAGES_MAX {
            return Err(RapportError::Validation(format!(
                "messages must contain at most {CHARACTER_MESSAGES_MAX} entries"
            )));
        }
        validate_messages(&self.messages)
    }
}

// --- Generation ---

/// A request to the delegated generation engine.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    /// JSON Schema the engine is instructed to satisfy.
    pub output_schema: serde_json::Value,
}
