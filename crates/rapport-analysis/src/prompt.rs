// SPDX-FileCopyrightText: 2026 Rapport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt and output-schema construction for the delegated engine.

use std::fmt::Write as _;

use rapport_core::types::{AnalyzeOptions, GenerationRequest, Language, Message};
use serde_json::{json, Value};

use crate::reconcile::REQUIRED_FIELDS;
use crate::sampler::TIMELINE_MAX;

/// Builds the full generation request for a transcript.
pub fn build_request(messages: &[Message], options: &AnalyzeOptions) -> GenerationRequest {
    GenerationRequest {
        system_prompt: system_prompt(options),
        user_prompt: user_prompt(messages, options),
        output_schema: output_schema(),
    }
}

/// Instructions describing the report contract.
pub fn system_prompt(options: &AnalyzeOptions) -> String {
    let language = match options.language {
        Language::Ko => "Korean",
        Language::En => "English",
    };
    format!(
        "You analyze chat transcripts between two people, \"me\" and \"partner\", \
         and report on their relationship dynamics.\n\
         Respond only with a JSON object matching the provided schema.\n\
         Rules:\n\
         - Every score is an integer from 0 to 100.\n\
         - liking_index.winner is \"tie\" when 46 <= score <= 54, otherwise \"me\" if score > 50, else \"partner\".\n\
         - Copy message ids verbatim from the transcript; never invent ids.\n\
         - timeline_points has at most {TIMELINE_MAX} entries in transcript order, \
           with sequence_index counting up from 0.\n\
         - Include metrics when requested; otherwise set metrics to null.\n\
         - If highlights are not requested, return an empty highlights array.\n\
         - Write summary_1line, reasons, and the rationale in {language}."
    )
}

/// The transcript and options, one message per line.
pub fn user_prompt(messages: &[Message], options: &AnalyzeOptions) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Options: metrics={}, highlights={}, language={}",
        if options.want_metrics { "requested" } else { "not requested" },
        if options.want_highlights { "requested" } else { "not requested" },
        options.language,
    );
    let _ = writeln!(out, "Transcript ({} messages):", messages.len());
    for m in messages {
        match &m.timestamp {
            Some(ts) => {
                let _ = writeln!(out, "[{}] ({ts}) {}: {}", m.id, m.speaker, m.text);
            }
            None => {
                let _ = writeln!(out, "[{}] {}: {}", m.id, m.speaker, m.text);
            }
        }
    }
    out
}

fn score() -> Value {
    json!({"type": "integer", "minimum": 0, "maximum": 100})
}

fn pair() -> Value {
    json!({
        "type": "object",
        "properties": {"me": score(), "partner": score()},
        "required": ["me", "partner"],
        "additionalProperties": false
    })
}

/// JSON Schema of the report the engine must produce.
pub fn output_schema() -> Value {
    let confidence = json!({"type": "string", "enum": ["low", "medium", "high"]});
    json!({
        "type": "object",
        "properties": {
            "summary_1line": {"type": "string"},
            "confidence": confidence,
            "metrics": {
                "type": ["object", "null"],
                "properties": {
                    "initiative": pair(),
                    "responsiveness": pair(),
                    "warmth": pair(),
                    "repair": pair(),
                    "balance_index": score()
                },
                "required": ["initiative", "responsiveness", "warmth", "repair", "balance_index"],
                "additionalProperties": false
            },
            "highlights": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "type": {"type": "string", "enum": ["green", "red"]},
                        "message_id": {"type": "string"},
                        "reason": {"type": "string"}
                    },
                    "required": ["type", "message_id", "reason"],
                    "additionalProperties": false
                }
            },
            "liking_index": {
                "type": ["object", "null"],
                "properties": {
                    "score": score(),
                    "winner": {"type": "string", "enum": ["me", "partner", "tie"]},
                    "rationale": {"type": "string"},
                    "confidence": confidence
                },
                "required": ["score", "winner", "rationale", "confidence"],
                "additionalProperties": false
            },
            "timeline_points": {
                "type": "array",
                "maxItems": TIMELINE_MAX,
                "items": {
                    "type": "object",
                    "properties": {
                        "message_id": {"type": "string"},
                        "sequence_index": {"type": "integer", "minimum": 0},
                        "speaker": {"type": "string", "enum": ["me", "partner"]},
                        "mood": score(),
                        "tension": score(),
                        "repair": score()
                    },
                    "required": ["message_id", "sequence_index", "speaker", "mood", "tension", "repair"],
                    "additionalProperties": false
                }
            }
        },
        "required": REQUIRED_FIELDS,
        "additionalProperties": false
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rapport_core::types::Speaker;

    fn messages() -> Vec<Message> {
        vec![
            Message {
                id: "1".into(),
                speaker: Speaker::Me,
                timestamp: Some("21:04".into()),
                text: "are you home?".into(),
            },
            Message {
                id: "2".into(),
                speaker: Speaker::Partner,
                timestamp: None,
                text: "almost".into(),
            },
        ]
    }

    #[test]
    fn user_prompt_lists_every_message() {
        let prompt = user_prompt(&messages(), &AnalyzeOptions::default());
        assert!(prompt.contains("[1] (21:04) me: are you home?"));
        assert!(prompt.contains("[2] partner: almost"));
        assert!(prompt.contains("language=ko"));
    }

    #[test]
    fn system_prompt_names_language() {
        let en = AnalyzeOptions {
            language: Language::En,
            ..AnalyzeOptions::default()
        };
        assert!(system_prompt(&en).contains("in English"));
        assert!(system_prompt(&AnalyzeOptions::default()).contains("in Korean"));
    }

    #[test]
    fn schema_caps_timeline() {
        let schema = output_schema();
        assert_eq!(
            schema["properties"]["timeline_points"]["maxItems"],
            json!(TIMELINE_MAX)
        );
        assert_eq!(schema["required"].as_array().unwrap().len(), REQUIRED_FIELDS.len());
    }
}
