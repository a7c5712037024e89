//! Analysis orchestrator: compiles the prompt, makes one bounded call to the
//! text-generation backend, and returns its first text segment.

use std::time::Duration;

use gbp_core::{AppConfig, BusinessData, BusinessProfile, PerformanceMetrics};

use crate::backend::{GenerationRequest, Message, TextGenerator};
use crate::error::AnalysisError;
use crate::normalize::normalize_metrics;
use crate::prompt::{compile_prompt_for_window, DEFAULT_WINDOW_DAYS};

/// Outcome of one analysis: the report text, or why there is none.
pub type AnalysisResult = Result<String, AnalysisError>;

/// Prefix shown to chat users when the analysis failed.
pub const FAILURE_MARKER: &str = "❌ Error al generar análisis";

pub const DEFAULT_MAX_TOKENS: u32 = 1500;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct AnalyzerSettings {
    pub model: String,
    pub max_tokens: u32,
    /// Upper bound on the backend call; elapsed yields [`AnalysisError::Timeout`].
    pub timeout: Duration,
    pub window_days: u32,
}

impl AnalyzerSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            model: config.analysis_model.clone(),
            max_tokens: config.analysis_max_tokens,
            timeout: Duration::from_secs(config.analysis_timeout_secs),
            window_days: config.performance_window_days,
        }
    }
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            model: gbp_core::DEFAULT_ANALYSIS_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: DEFAULT_TIMEOUT,
            window_days: DEFAULT_WINDOW_DAYS,
        }
    }
}

/// Stateless orchestrator. Safe to share across concurrent requests.
pub struct Analyzer<G> {
    generator: G,
    settings: AnalyzerSettings,
}

impl<G: TextGenerator> Analyzer<G> {
    pub fn new(generator: G, settings: AnalyzerSettings) -> Self {
        Self {
            generator,
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &AnalyzerSettings {
        &self.settings
    }

    /// Produce the optimization report for a profile and its counters.
    ///
    /// Makes exactly one backend call, bounded by the configured timeout,
    /// with no retry. Failures are logged here and returned to the caller.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::Timeout`] when the bound elapses.
    /// - [`AnalysisError::EmptyResponse`] when the backend returns no text.
    /// - Any transport, API, or decoding error from the backend.
    pub async fn analyze(
        &self,
        profile: &BusinessProfile,
        metrics: &PerformanceMetrics,
    ) -> AnalysisResult {
        let prompt = compile_prompt_for_window(profile, metrics, self.settings.window_days);
        let request = GenerationRequest {
            model: self.settings.model.clone(),
            max_tokens: self.settings.max_tokens,
            messages: vec![Message::user(prompt.into_string())],
        };

        let outcome =
            match tokio::time::timeout(self.settings.timeout, self.generator.generate(&request))
                .await
            {
                Ok(result) => result.and_then(|segments| {
                    segments
                        .into_iter()
                        .next()
                        .ok_or(AnalysisError::EmptyResponse)
                }),
                Err(_elapsed) => Err(AnalysisError::Timeout(self.settings.timeout)),
            };

        match &outcome {
            Ok(report) => tracing::info!(
                model = %self.settings.model,
                report_chars = report.chars().count(),
                "analysis completed"
            ),
            Err(err) => tracing::error!(
                model = %self.settings.model,
                kind = ?err.kind(),
                error = %err,
                "analysis failed"
            ),
        }
        outcome
    }

    /// Normalize the fetched insights, then [`Analyzer::analyze`].
    ///
    /// # Errors
    ///
    /// Same as [`Analyzer::analyze`].
    pub async fn analyze_payload(&self, data: &BusinessData) -> AnalysisResult {
        let metrics = normalize_metrics(&data.insights);
        self.analyze(&data.profile, &metrics).await
    }
}

/// Render a result as the single always-displayable string sent to the user.
#[must_use]
pub fn display_text(result: &AnalysisResult) -> String {
    match result {
        Ok(report) => report.clone(),
        Err(err) => format!("{FAILURE_MARKER}: {err}"),
    }
}
