//! Shared domain types and configuration for the Business Profile bot.

pub mod app_config;
pub mod config;
pub mod metrics;
pub mod profile;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{
    check_env, load_app_config, load_app_config_from_env, EnvCheck, DEFAULT_ANALYSIS_MODEL,
};
pub use metrics::{MetricEntry, MetricKind, PerformanceMetrics};
pub use profile::{BusinessData, BusinessProfile, PostalAddress};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
