// SPDX-FileCopyrightText: 2026 Rapport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `rapport analyze`: offline analysis of a transcript file.

use std::path::PathBuf;

use clap::Args;
use rapport_analysis::{Analyzer, Archive, Engine};
use rapport_config::RapportConfig;
use rapport_core::types::{AnalyzeRequest, Language, Message};
use rapport_core::{RapportError, UserId};
use serde_json::Value;

use crate::serve::build_engine;

/// Arguments for `rapport analyze`.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// JSON file holding either `{"messages": [...], "options": {...}}` or a bare message array.
    pub file: PathBuf,

    /// Use the mock scorer regardless of `analysis.mode`.
    #[arg(long)]
    pub mock: bool,

    /// Output language (`ko` or `en`).
    #[arg(long)]
    pub language: Option<Language>,

    /// Leave the highlights empty.
    #[arg(long)]
    pub no_highlights: bool,

    /// Leave the metrics block null.
    #[arg(long)]
    pub no_metrics: bool,

    /// Pretty-print the report.
    #[arg(long)]
    pub pretty: bool,
}

/// Parses a transcript file body.
pub fn parse_transcript(content: &str) -> Result<AnalyzeRequest, RapportError> {
    let value: Value = serde_json::from_str(content)
        .map_err(|e| RapportError::Validation(format!("transcript is not valid JSON: {e}")))?;
    let request = if value.is_array() {
        let messages: Vec<Message> = serde_json::from_value(value)
            .map_err(|e| RapportError::Validation(format!("invalid message list: {e}")))?;
        AnalyzeRequest {
            messages,
            options: Default::default(),
        }
    } else {
        serde_json::from_value(value)
            .map_err(|e| RapportError::Validation(format!("invalid analyze request: {e}")))?
    };
    Ok(request)
}

fn apply_overrides(request: &mut AnalyzeRequest, args: &AnalyzeArgs) {
    if let Some(language) = args.language {
        request.options.language = language;
    }
    if args.no_highlights {
        request.options.want_highlights = false;
    }
    if args.no_metrics {
        request.options.want_metrics = false;
    }
}

/// Runs the `rapport analyze` command. Nothing is archived.
pub async fn run_analyze(config: &RapportConfig, args: AnalyzeArgs) -> Result<(), RapportError> {
    let content = std::fs::read_to_string(&args.file).map_err(|e| {
        RapportError::Validation(format!("failed to read {}: {e}", args.file.display()))
    })?;
    let mut request = parse_transcript(&content)?;
    apply_overrides(&mut request, &args);

    let engine = if args.mock { Engine::Mock } else { build_engine(config)? };
    let analyzer = Analyzer::new(engine, Archive::Disabled);
    let analysis = analyzer.analyze(&UserId("local".to_string()), &request).await?;

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&analysis.report)
    } else {
        serde_json::to_string(&analysis.report)
    }
    .map_err(|e| RapportError::Internal(format!("failed to render report: {e}")))?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(file: &str) -> AnalyzeArgs {
        AnalyzeArgs {
            file: PathBuf::from(file),
            mock: true,
            language: None,
            no_highlights: false,
            no_metrics: false,
            pretty: false,
        }
    }

    #[test]
    fn parses_envelope_and_bare_array() {
        let envelope = r#"{"messages":[{"id":"a","speaker":"me","text":"hi"}],"options":{"language":"en"}}"#;
        let request = parse_transcript(envelope).unwrap();
        assert_eq!(request.options.language, Language::En);

        let bare = r#"[{"id":"a","speaker":"me","text":"hi"},{"id":"b","speaker":"partner","text":"yo"}]"#;
        let request = parse_transcript(bare).unwrap();
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.options.language, Language::Ko);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            parse_transcript("not json"),
            Err(RapportError::Validation(_))
        ));
        assert!(matches!(
            parse_transcript(r#"[{"id":"a"}]"#),
            Err(RapportError::Validation(_))
        ));
    }

    #[test]
    fn flags_override_file_options() {
        let mut request = parse_transcript(r#"{"messages":[]}"#).unwrap();
        let mut a = args("x.json");
        a.language = Some(Language::En);
        a.no_metrics = true;
        apply_overrides(&mut request, &a);
        assert_eq!(request.options.language, Language::En);
        assert!(!request.options.want_metrics);
        assert!(request.options.want_highlights);
    }

    #[tokio::test]
    async fn missing_file_is_validation_error() {
        let config = rapport_config::load_and_validate_str("").unwrap();
        let err = run_analyze(&config, args("/nonexistent/rapport-chat.json"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
