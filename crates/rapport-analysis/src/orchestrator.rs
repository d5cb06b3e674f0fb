// SPDX-FileCopyrightText: 2026 Rapport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Analysis orchestration: validate, window, score, archive.
//!
//! The engine is fixed when the [`Analyzer`] is built. A delegated failure
//! is returned as-is; there is no fallback to the mock scorer and no retry.
//! Archiving is best-effort and never changes the returned report.

use std::sync::Arc;

use rapport_core::types::{AnalysisRecord, AnalysisReport, AnalyzeOptions, AnalyzeRequest, Message};
use rapport_core::{GenerationAdapter, RapportError, StorageAdapter, UserId};
use tracing::{debug, info, warn};

use crate::{mock, prompt, reconcile};

/// Most recent messages considered per request; older ones are dropped.
pub const MAX_TRANSCRIPT: usize = 1000;

/// The scoring engine, selected once per deployment.
#[derive(Clone)]
pub enum Engine {
    /// Deterministic placeholder scorer.
    Mock,
    /// External generation engine whose output is reconciled.
    Delegated(Arc<dyn GenerationAdapter>),
}

impl Engine {
    /// Short label for health output and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Engine::Mock => "mock",
            Engine::Delegated(_) => "delegated",
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Engine::Mock => f.write_str("Mock"),
            Engine::Delegated(g) => f.debug_tuple("Delegated").field(&g.name()).finish(),
        }
    }
}

/// Where finished analyses are archived, if anywhere.
#[derive(Clone, Default)]
pub enum Archive {
    /// No store configured; archiving is a no-op.
    #[default]
    Disabled,
    /// Archive into the given store.
    Enabled(Arc<dyn StorageAdapter>),
}

impl Archive {
    /// Returns `true` when a store is configured.
    pub fn is_enabled(&self) -> bool {
        matches!(self, Archive::Enabled(_))
    }

    /// Saves the record, returning its id. Failures are logged and swallowed.
    pub async fn save(&self, record: &AnalysisRecord) -> Option<String> {
        let Archive::Enabled(store) = self else {
            debug!("archive disabled, skipping save");
            return None;
        };
        match store.save_analysis(record).await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(error = %e, user_id = %record.user_id, "failed to archive analysis");
                None
            }
        }
    }
}

/// A finished analysis and, when archived, its record id.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub report: AnalysisReport,
    pub archive_id: Option<String>,
}

/// Runs analyses against the configured engine and archive.
#[derive(Clone)]
pub struct Analyzer {
    engine: Engine,
    archive: Archive,
}

impl Analyzer {
    pub fn new(engine: Engine, archive: Archive) -> Self {
        Self { engine, archive }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn archive(&self) -> &Archive {
        &self.archive
    }

    /// Validates, scores, and archives one request for `user`.
    pub async fn analyze(
        &self,
        user: &UserId,
        request: &AnalyzeRequest,
    ) -> Result<Analysis, RapportError> {
        request.validate()?;

        let window = recent_window(&request.messages);
        if window.len() < request.messages.len() {
            info!(
                received = request.messages.len(),
                kept = window.len(),
                "transcript truncated to most recent messages"
            );
        }

        let report = self.score(window, &request.options).await.inspect_err(|e| {
            warn!(engine = self.engine.label(), kind = e.kind(), error = %e, "scoring failed");
        })?;

        let record = AnalysisRecord {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user.0.clone(),
            created_at: chrono::Utc::now().to_rfc3339(),
            options: request.options,
            result: report.clone(),
            message_count: request.messages.len(),
        };
        let archive_id = self.archive.save(&record).await;

        info!(
            engine = self.engine.label(),
            messages = window.len(),
            timeline_points = report.timeline_points.len(),
            archived = archive_id.is_some(),
            "analysis complete"
        );

        Ok(Analysis { report, archive_id })
    }

    /// Scores an already validated, windowed transcript.
    pub async fn score(
        &self,
        messages: &[Message],
        options: &AnalyzeOptions,
    ) -> Result<AnalysisReport, RapportError> {
        match &self.engine {
            Engine::Mock => Ok(mock::score(messages, options)),
            Engine::Delegated(generator) => {
                let request = prompt::build_request(messages, options);
                let raw = generator.generate(request).await?;
                debug!(bytes = raw.len(), "generation engine responded");
                Ok(reconcile::reconcile(&raw, options, messages)?)
            }
        }
    }
}

/// The last [`MAX_TRANSCRIPT`] messages of a transcript.
pub fn recent_window(messages: &[Message]) -> &[Message] {
    &messages[messages.len().saturating_sub(MAX_TRANSCRIPT)..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rapport_core::types::{
        AdapterType, Character, GenerationRequest, HealthStatus, Language, Speaker,
    };
    use rapport_core::PluginAdapter;
    use std::sync::Mutex;
    use tracing_test::traced_test;

    struct CannedGenerator {
        reply: Result<String, String>,
        seen: Mutex<Vec<GenerationRequest>>,
    }

    impl CannedGenerator {
        fn new(reply: Result<&str, &str>) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.map(str::to_string).map_err(str::to_string),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl PluginAdapter for CannedGenerator {
        fn name(&self) -> &str {
            "canned"
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
    impl GenerationAdapter for CannedGenerator {
        async fn generate(&self, request: GenerationRequest) -> Result<String, RapportError> {
            self.seen.lock().unwrap().push(request);
            self.reply.clone().map_err(|message| RapportError::Provider {
                message,
                source: None,
            })
        }
    }

    /// Store whose every write fails.
    struct BrokenStore;

    #[async_trait]
    impl PluginAdapter for BrokenStore {
        fn name(&self) -> &str {
            "broken"
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 1, 0)
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::Storage
        }
        async fn health_check(&self) -> Result<HealthStatus, RapportError> {
            Ok(HealthStatus::Unhealthy("broken".into()))
        }
        async fn shutdown(&self) -> Result<(), RapportError> {
            Ok(())
        }
    }

    fn broken() -> RapportError {
        RapportError::storage(std::io::Error::other("disk unavailable"))
    }

    #[async_trait]
    impl StorageAdapter for BrokenStore {
        async fn initialize(&self) -> Result<(), RapportError> {
            Ok(())
        }
        async fn close(&self) -> Result<(), RapportError> {
            Ok(())
        }
        async fn save_analysis(&self, _: &AnalysisRecord) -> Result<String, RapportError> {
            Err(broken())
        }
        async fn list_analyses(&self, _: &str, _: usize) -> Result<Vec<AnalysisRecord>, RapportError> {
            Err(broken())
        }
        async fn create_character(&self, _: &Character) -> Result<(), RapportError> {
            Err(broken())
        }
        async fn get_character(&self, _: &str, _: &str) -> Result<Option<Character>, RapportError> {
            Err(broken())
        }
        async fn list_characters(&self, _: &str) -> Result<Vec<Character>, RapportError> {
            Err(broken())
        }
        async fn update_character(&self, _: &Character) -> Result<bool, RapportError> {
            Err(broken())
        }
        async fn delete_character(&self, _: &str, _: &str) -> Result<bool, RapportError> {
            Err(broken())
        }
    }

    fn transcript(n: usize) -> Vec<Message> {
        (1..=n)
            .map(|i| Message {
                id: format!("msg-{i}"),
                speaker: if i % 2 == 0 { Speaker::Partner } else { Speaker::Me },
                timestamp: None,
                text: format!("line {i}"),
            })
            .collect()
    }

    fn request(n: usize) -> AnalyzeRequest {
        AnalyzeRequest {
            messages: transcript(n),
            options: AnalyzeOptions::default(),
        }
    }

    fn user() -> UserId {
        UserId("user-1".into())
    }

    #[tokio::test]
    async fn mock_engine_scores_without_archive() {
        let analyzer = Analyzer::new(Engine::Mock, Archive::Disabled);
        let analysis = analyzer.analyze(&user(), &request(2)).await.unwrap();
        assert!(analysis.archive_id.is_none());
        assert_eq!(analysis.report.highlights.len(), 2);
    }

    #[tokio::test]
    async fn invalid_request_never_reaches_engine() {
        let generator = CannedGenerator::new(Ok("{}"));
        let analyzer = Analyzer::new(Engine::Delegated(generator.clone()), Archive::Disabled);
        let err = analyzer.analyze(&user(), &request(1)).await.unwrap_err();
        assert!(matches!(err, RapportError::Validation(_)));
        assert!(generator.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn long_transcript_keeps_most_recent_window() {
        let analyzer = Analyzer::new(Engine::Mock, Archive::Disabled);
        let analysis = analyzer.analyze(&user(), &request(1200)).await.unwrap();
        let highlights = &analysis.report.highlights;
        assert_eq!(highlights[0].message_id, "msg-201");
        assert_eq!(highlights[1].message_id, "msg-1200");
        assert_eq!(
            analysis.report.metrics.unwrap().initiative.me,
            50,
            "initiative is computed over the window"
        );
    }

    #[test]
    fn recent_window_bounds() {
        let short = transcript(3);
        assert_eq!(recent_window(&short).len(), 3);
        let long = transcript(1001);
        let window = recent_window(&long);
        assert_eq!(window.len(), MAX_TRANSCRIPT);
        assert_eq!(window[0].id, "msg-2");
    }

    #[tokio::test]
    async fn delegated_output_is_reconciled() {
        let raw = r#"{
            "summary_1line": "Balanced.",
            "confidence": "low",
            "metrics": {"initiative": {"me": 1, "partner": 2}},
            "highlights": [],
            "liking_index": null,
            "timeline_points": [
                {"message_id": "msg-1", "sequence_index": 0, "speaker": "me", "mood": 1, "tension": 2, "repair": 3}
            ]
        }"#;
        let generator = CannedGenerator::new(Ok(raw));
        let analyzer = Analyzer::new(Engine::Delegated(generator.clone()), Archive::Disabled);
        let mut req = request(2);
        req.options.want_metrics = false;
        req.options.language = Language::En;

        let analysis = analyzer.analyze(&user(), &req).await.unwrap();
        assert!(analysis.report.metrics.is_none());
        assert_eq!(analysis.report.timeline_points.len(), 1);

        let seen = generator.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].user_prompt.contains("[msg-2] partner: line 2"));
        assert!(seen[0].system_prompt.contains("English"));
    }

    #[tokio::test]
    async fn malformed_delegated_output_fails_without_report() {
        let generator = CannedGenerator::new(Ok("not json at all"));
        let analyzer = Analyzer::new(Engine::Delegated(generator), Archive::Disabled);
        let err = analyzer.analyze(&user(), &request(2)).await.unwrap_err();
        assert!(matches!(err, RapportError::MalformedOutput { .. }));
    }

    #[tokio::test]
    async fn engine_error_is_not_masked_by_mock() {
        let generator = CannedGenerator::new(Err("upstream 500"));
        let analyzer = Analyzer::new(Engine::Delegated(generator), Archive::Disabled);
        let err = analyzer.analyze(&user(), &request(2)).await.unwrap_err();
        assert!(matches!(err, RapportError::Provider { message, .. } if message == "upstream 500"));
    }

    #[tokio::test]
    #[traced_test]
    async fn archive_failure_still_returns_report() {
        let analyzer = Analyzer::new(Engine::Mock, Archive::Enabled(Arc::new(BrokenStore)));
        let analysis = analyzer.analyze(&user(), &request(4)).await.unwrap();
        assert!(analysis.archive_id.is_none());
        assert_eq!(analysis.report.timeline_points.len(), 4);
        assert!(logs_contain("failed to archive analysis"));
    }

    #[test]
    fn engine_labels() {
        assert_eq!(Engine::Mock.label(), "mock");
        let generator: Arc<dyn GenerationAdapter> = CannedGenerator::new(Ok("{}"));
        assert_eq!(Engine::Delegated(generator).label(), "delegated");
        assert!(!Archive::Disabled.is_enabled());
    }
}
