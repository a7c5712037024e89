use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Model used for the optimization report unless `GBP_ANALYSIS_MODEL` overrides it.
pub const DEFAULT_ANALYSIS_MODEL: &str = "claude-opus-4-5-20251101";

/// Environment variables without which the bot cannot start.
pub const REQUIRED_VARS: &[(&str, &str)] = &[
    ("TELEGRAM_BOT_TOKEN", "Token de Telegram"),
    ("GOOGLE_CLIENT_ID", "Google Client ID"),
    ("GOOGLE_CLIENT_SECRET", "Google Client Secret"),
    ("CLAUDE_API_KEY", "Claude API Key"),
];

const PREVIEW_CHARS: usize = 20;

/// Reads `.env` (when present) into the process environment, then builds the
/// configuration from it.
///
/// # Errors
///
/// Fails with [`ConfigError`] when a required variable is unset or a value
/// does not parse.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Builds the configuration from the current process environment only.
///
/// # Errors
///
/// Fails with [`ConfigError`] when a required variable is unset or a value
/// does not parse.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Typed access to environment variables through an injectable lookup.
struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    /// Blank values count as unset.
    fn required(&self, var: &str) -> Result<String, ConfigError> {
        match (self.lookup)(var) {
            Ok(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(ConfigError::MissingEnvVar(var.to_owned())),
        }
    }

    fn text(&self, var: &str, fallback: &str) -> String {
        (self.lookup)(var).unwrap_or_else(|_| fallback.to_owned())
    }

    fn parsed<T>(&self, var: &str, fallback: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match (self.lookup)(var) {
            Err(_) => Ok(fallback),
            Ok(raw) => raw.trim().parse().map_err(|e: T::Err| invalid(var, e)),
        }
    }

    /// Like [`EnvReader::parsed`], but zero is rejected.
    fn positive<T>(&self, var: &str, fallback: T) -> Result<T, ConfigError>
    where
        T: FromStr + Default + PartialEq,
        T::Err: Display,
    {
        let value = self.parsed(var, fallback)?;
        if value == T::default() {
            return Err(invalid(var, "must be at least 1"));
        }
        Ok(value)
    }
}

fn invalid(var: &str, reason: impl Display) -> ConfigError {
    ConfigError::InvalidEnvVar {
        var: var.to_owned(),
        reason: reason.to_string(),
    }
}

fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let env_vars = EnvReader { lookup };

    Ok(AppConfig {
        telegram_bot_token: env_vars.required("TELEGRAM_BOT_TOKEN")?,
        google_client_id: env_vars.required("GOOGLE_CLIENT_ID")?,
        google_client_secret: env_vars.required("GOOGLE_CLIENT_SECRET")?,
        claude_api_key: env_vars.required("CLAUDE_API_KEY")?,
        env: parse_environment(&env_vars.text("ENVIRONMENT", "development"))?,
        log_level: env_vars.text("GBP_LOG_LEVEL", "info"),
        telegram_poll_timeout_secs: env_vars.parsed("GBP_TELEGRAM_POLL_TIMEOUT_SECS", 30)?,
        google_redirect_uri: env_vars.text("GBP_GOOGLE_REDIRECT_URI", "urn:ietf:wg:oauth:2.0:oob"),
        google_max_retries: env_vars.parsed("GBP_GOOGLE_MAX_RETRIES", 3)?,
        google_retry_backoff_ms: env_vars.parsed("GBP_GOOGLE_RETRY_BACKOFF_MS", 1_000)?,
        analysis_model: env_vars.text("GBP_ANALYSIS_MODEL", DEFAULT_ANALYSIS_MODEL),
        analysis_max_tokens: env_vars.parsed("GBP_ANALYSIS_MAX_TOKENS", 1_500)?,
        analysis_timeout_secs: env_vars.positive("GBP_ANALYSIS_TIMEOUT_SECS", 120)?,
        request_timeout_secs: env_vars.positive("GBP_REQUEST_TIMEOUT_SECS", 30)?,
        performance_window_days: env_vars.positive("GBP_PERFORMANCE_WINDOW_DAYS", 30)?,
        credentials_path: PathBuf::from(
            env_vars.text("GBP_CREDENTIALS_PATH", "./data/credentials.json"),
        ),
    })
}

fn parse_environment(value: &str) -> Result<Environment, ConfigError> {
    match value {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(invalid(
            "ENVIRONMENT",
            format!("expected development, test or production, got '{other}'"),
        )),
    }
}

/// Presence of one required environment variable, as reported by `gbp-bot check`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvCheck {
    pub var: &'static str,
    pub description: &'static str,
    /// Leading characters of the value, or `None` when unset or blank.
    pub preview: Option<String>,
}

impl EnvCheck {
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.preview.is_some()
    }
}

/// Report which of [`REQUIRED_VARS`] are set, without exposing full secrets.
pub fn check_env<F>(lookup: F) -> Vec<EnvCheck>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    REQUIRED_VARS
        .iter()
        .map(|&(var, description)| EnvCheck {
            var,
            description,
            preview: lookup(var)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(|v| preview(&v)),
        })
        .collect()
}

fn preview(value: &str) -> String {
    if value.chars().count() > PREVIEW_CHARS {
        let head: String = value.chars().take(PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        value.to_string()
    }
}
