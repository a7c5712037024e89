//! Analysis core for Business Profile optimization reports.
//!
//! Normalizes raw performance insights into fixed counters, scores profile
//! completeness against a weighted rubric, compiles both into a Spanish
//! prompt, and asks a text-generation backend for the final report.

pub mod analyzer;
pub mod backend;
pub mod error;
pub mod normalize;
pub mod prompt;
pub mod scorer;

pub use analyzer::{display_text, AnalysisResult, Analyzer, AnalyzerSettings, FAILURE_MARKER};
pub use backend::{AnthropicClient, GenerationRequest, Message, Role, TextGenerator};
pub use error::{AnalysisError, AnalysisErrorKind};
pub use normalize::normalize_metrics;
pub use prompt::{compile_prompt, compile_prompt_for_window, AnalysisPrompt};
pub use scorer::{score_profile, CompletenessReport, RubricField, RUBRIC};
