// SPDX-FileCopyrightText: 2026 Rapport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Validating decode of generation-engine output into an [`AnalysisReport`].
//!
//! The engine is told which shape to produce but nothing guarantees it did.
//! [`reconcile`] is the single place where that payload is forced and checked
//! before it may reach a caller:
//!
//! 1. parse as one JSON object,
//! 2. null `metrics` when metrics were not requested,
//! 3. empty `highlights` when highlights were not requested,
//! 4. keep at most [`TIMELINE_MAX`] timeline points (prefix),
//! 5. check every field constraint, failing on the first offending path.
//!
//! Nothing else is patched.

use std::collections::HashSet;

use rapport_core::types::{AnalysisReport, AnalyzeOptions, Message, Winner, SCORE_MAX};
use rapport_core::RapportError;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::sampler::TIMELINE_MAX;

/// Why an engine payload was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// The raw text is not a single JSON object.
    #[error("engine output is not a JSON object: {0}")]
    Malformed(String),

    /// The JSON object violates the report contract at `field`.
    #[error("`{field}` {reason}")]
    Violation { field: String, reason: String },
}

impl From<SchemaError> for RapportError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::Malformed(message) => RapportError::MalformedOutput { message },
            SchemaError::Violation { field, reason } => {
                RapportError::SchemaViolation { field, reason }
            }
        }
    }
}

/// Top-level keys every payload must carry. `metrics` is additionally
/// required when metrics are requested; `liking_index` may be absent or null.
pub const REQUIRED_FIELDS: &[&str] = &["summary_1line", "confidence", "highlights", "timeline_points"];

const CONFIDENCE: &[&str] = &["low", "medium", "high"];
const SPEAKER: &[&str] = &["me", "partner"];
const HIGHLIGHT_KIND: &[&str] = &["green", "red"];
const WINNER: &[&str] = &["me", "partner", "tie"];
const METRIC_PAIRS: &[&str] = &["initiative", "responsiveness", "warmth", "repair"];

/// Forces and validates a raw engine payload against the report contract.
///
/// `transcript` is the (already truncated) input the engine was shown; every
/// message id in the report must refer to one of its messages.
pub fn reconcile(
    raw: &str,
    options: &AnalyzeOptions,
    transcript: &[Message],
) -> Result<AnalysisReport, SchemaError> {
    let mut value: Value =
        serde_json::from_str(raw.trim()).map_err(|e| SchemaError::Malformed(e.to_string()))?;

    {
        let kind = kind_of(&value);
        let Some(obj) = value.as_object_mut() else {
            return Err(SchemaError::Malformed(format!("top-level value is {kind}")));
        };

        if !options.want_metrics {
            obj.insert("metrics".to_string(), Value::Null);
        }
        if !options.want_highlights {
            obj.insert("highlights".to_string(), Value::Array(Vec::new()));
        }
        if let Some(Value::Array(points)) = obj.get_mut("timeline_points") {
            points.truncate(TIMELINE_MAX);
        }

        let ids: HashSet<&str> = transcript.iter().map(|m| m.id.as_str()).collect();
        Checker { ids: &ids }.report(obj, options)?;
    }

    serde_json::from_value(value).map_err(|e| violation("$", format!("does not decode: {e}")))
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn violation(field: impl Into<String>, reason: impl Into<String>) -> SchemaError {
    SchemaError::Violation {
        field: field.into(),
        reason: reason.into(),
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

struct Checker<'a> {
    ids: &'a HashSet<&'a str>,
}

impl Checker<'_> {
    fn report(&self, obj: &Map<String, Value>, options: &AnalyzeOptions) -> Result<(), SchemaError> {
        non_empty_string(required(obj, "", "summary_1line")?, "summary_1line")?;
        one_of(required(obj, "", "confidence")?, "confidence", CONFIDENCE)?;

        match obj.get("metrics") {
            Some(Value::Null) | None if options.want_metrics => {
                return Err(violation("metrics", "is required when metrics are requested"));
            }
            Some(Value::Null) | None => {}
            Some(v) => self.metrics(v, "metrics")?,
        }

        let highlights = array(required(obj, "", "highlights")?, "highlights")?;
        for (i, h) in highlights.iter().enumerate() {
            self.highlight(h, &format!("highlights[{i}]"))?;
        }

        match obj.get("liking_index") {
            Some(Value::Null) | None => {}
            Some(v) => self.liking_index(v, "liking_index")?,
        }

        let points = array(required(obj, "", "timeline_points")?, "timeline_points")?;
        let mut previous: Option<u64> = None;
        for (i, p) in points.iter().enumerate() {
            let path = format!("timeline_points[{i}]");
            let seq = self.timeline_point(p, &path)?;
            let ok = match previous {
                None => seq == 0,
                Some(prev) => seq > prev,
            };
            if !ok {
                return Err(violation(
                    join(&path, "sequence_index"),
                    "must start at 0 and be strictly increasing",
                ));
            }
            previous = Some(seq);
        }

        Ok(())
    }

    fn metrics(&self, v: &Value, path: &str) -> Result<(), SchemaError> {
        let obj = object(v, path)?;
        for key in METRIC_PAIRS {
            let pair_path = join(path, key);
            let pair = object(required(obj, path, key)?, &pair_path)?;
            score(required(pair, &pair_path, "me")?, &join(&pair_path, "me"))?;
            score(required(pair, &pair_path, "partner")?, &join(&pair_path, "partner"))?;
        }
        score(required(obj, path, "balance_index")?, &join(path, "balance_index"))?;
        Ok(())
    }

    fn highlight(&self, v: &Value, path: &str) -> Result<(), SchemaError> {
        let obj = object(v, path)?;
        one_of(required(obj, path, "type")?, &join(path, "type"), HIGHLIGHT_KIND)?;
        self.message_id(required(obj, path, "message_id")?, &join(path, "message_id"))?;
        non_empty_string(required(obj, path, "reason")?, &join(path, "reason"))?;
        Ok(())
    }

    fn liking_index(&self, v: &Value, path: &str) -> Result<(), SchemaError> {
        let obj = object(v, path)?;
        let s = score(required(obj, path, "score")?, &join(path, "score"))?;
        let winner = one_of(required(obj, path, "winner")?, &join(path, "winner"), WINNER)?;
        let expected = Winner::from_score(s).to_string();
        if winner != expected {
            return Err(violation(
                join(path, "winner"),
                format!("must be `{expected}` for score {s}"),
            ));
        }
        string(required(obj, path, "rationale")?, &join(path, "rationale"))?;
        one_of(required(obj, path, "confidence")?, &join(path, "confidence"), CONFIDENCE)?;
        Ok(())
    }

    /// Validates one point and returns its sequence index.
    fn timeline_point(&self, v: &Value, path: &str) -> Result<u64, SchemaError> {
        let obj = object(v, path)?;
        self.message_id(required(obj, path, "message_id")?, &join(path, "message_id"))?;
        let seq_path = join(path, "sequence_index");
        let seq = required(obj, path, "sequence_index")?
            .as_u64()
            .filter(|&s| s <= u64::from(u32::MAX))
            .ok_or_else(|| violation(&seq_path, "must be a non-negative integer"))?;
        one_of(required(obj, path, "speaker")?, &join(path, "speaker"), SPEAKER)?;
        for key in ["mood", "tension", "repair"] {
            score(required(obj, path, key)?, &join(path, key))?;
        }
        Ok(seq)
    }

    fn message_id(&self, v: &Value, path: &str) -> Result<(), SchemaError> {
        let id = string(v, path)?;
        if self.ids.contains(id) {
            Ok(())
        } else {
            Err(violation(path, format!("`{id}` does not match any input message")))
        }
    }
}

fn required<'v>(
    obj: &'v Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<&'v Value, SchemaError> {
    obj.get(key)
        .ok_or_else(|| violation(join(path, key), "is required"))
}

fn object<'v>(v: &'v Value, path: &str) -> Result<&'v Map<String, Value>, SchemaError> {
    v.as_object()
        .ok_or_else(|| violation(path, format!("must be an object, found {}", kind_of(v))))
}

fn array<'v>(v: &'v Value, path: &str) -> Result<&'v Vec<Value>, SchemaError> {
    v.as_array()
        .ok_or_else(|| violation(path, format!("must be an array, found {}", kind_of(v))))
}

fn string<'v>(v: &'v Value, path: &str) -> Result<&'v str, SchemaError> {
    v.as_str()
        .ok_or_else(|| violation(path, format!("must be a string, found {}", kind_of(v))))
}

fn non_empty_string<'v>(v: &'v Value, path: &str) -> Result<&'v str, SchemaError> {
    let s = string(v, path)?;
    if s.trim().is_empty() {
        return Err(violation(path, "must not be empty"));
    }
    Ok(s)
}

fn one_of<'v>(v: &'v Value, path: &str, allowed: &[&str]) -> Result<&'v str, SchemaError> {
    let s = string(v, path)?;
    if allowed.contains(&s) {
        Ok(s)
    } else {
        Err(violation(
            path,
            format!("must be one of {}, found `{s}`", allowed.join("|")),
        ))
    }
}

fn score(v: &Value, path: &str) -> Result<u8, SchemaError> {
    v.as_u64()
        .filter(|&n| n <= u64::from(SCORE_MAX))
        .map(|n| n as u8)
        .ok_or_else(|| violation(path, format!("must be an integer between 0 and {SCORE_MAX}")))
}
