// SPDX-FileCopyrightText: 2026 Rapport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transcript and payload fixtures.

use rapport_core::types::{Message, Speaker};
use serde_json::{json, Value};

/// A single message without a timestamp.
pub fn message(id: &str, speaker: Speaker, text: &str) -> Message {
    Message {
        id: id.to_string(),
        speaker,
        timestamp: None,
        text: text.to_string(),
    }
}

/// `n` messages with ids `msg-1..=msg-n`, alternating speakers starting with `me`.
pub fn transcript(n: usize) -> Vec<Message> {
    (1..=n)
        .map(|i| {
            let speaker = if i % 2 == 1 { Speaker::Me } else { Speaker::Partner };
            message(&format!("msg-{i}"), speaker, &format!("line {i}"))
        })
        .collect()
}

/// A transcript as the JSON body of `POST /api/analyze`.
pub fn analyze_body(messages: &[Message], options: Option<Value>) -> Value {
    let mut body = json!({ "messages": messages });
    if let Some(options) = options {
        body["options"] = options;
    }
    body
}

/// A well-formed engine payload that refers to the given transcript.
///
/// Highlights point at the first and last message; every message gets a
/// timeline point.
pub fn report_payload(messages: &[Message]) -> Value {
    let first = messages.first().map(|m| m.id.as_str()).unwrap_or_default();
    let last = messages.last().map(|m| m.id.as_str()).unwrap_or_default();
    let points: Vec<Value> = messages
        .iter()
        .enumerate()
        .map(|(i, m)| {
            json!({
                "message_id": m.id,
                "sequence_index": i,
                "speaker": m.speaker.to_string(),
                "mood": 60,
                "tension": 30,
                "repair": 55
            })
        })
        .collect();

    json!({
        "summary_1line": "Both sides keep the conversation going.",
        "confidence": "medium",
        "metrics": {
            "initiative": {"me": 55, "partner": 45},
            "responsiveness": {"me": 60, "partner": 62},
            "warmth": {"me": 70, "partner": 68},
            "repair": {"me": 50, "partner": 52},
            "balance_index": 58
        },
        "highlights": [
            {"type": "green", "message_id": first, "reason": "friendly opener"},
            {"type": "red", "message_id": last, "reason": "abrupt ending"}
        ],
        "liking_index": {
            "score": 50,
            "winner": "tie",
            "rationale": "Effort is evenly matched.",
            "confidence": "low"
        },
        "timeline_points": points
    })
}
