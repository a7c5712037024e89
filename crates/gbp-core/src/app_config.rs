use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub telegram_bot_token: String,
    pub telegram_poll_timeout_secs: u64,
    pub google_client_id: String,
    pub google_client_secret: String,
    pub google_redirect_uri: String,
    pub google_max_retries: u32,
    pub google_retry_backoff_ms: u64,
    pub claude_api_key: String,
    pub analysis_model: String,
    pub analysis_max_tokens: u32,
    pub analysis_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub performance_window_days: u32,
    pub credentials_path: PathBuf,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("telegram_bot_token", &"[redacted]")
            .field(
                "telegram_poll_timeout_secs",
                &self.telegram_poll_timeout_secs,
            )
            .field("google_client_id", &self.google_client_id)
            .field("google_client_secret", &"[redacted]")
            .field("google_redirect_uri", &self.google_redirect_uri)
            .field("google_max_retries", &self.google_max_retries)
            .field("google_retry_backoff_ms", &self.google_retry_backoff_ms)
            .field("claude_api_key", &"[redacted]")
            .field("analysis_model", &self.analysis_model)
            .field("analysis_max_tokens", &self.analysis_max_tokens)
            .field("analysis_timeout_secs", &self.analysis_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("performance_window_days", &self.performance_window_days)
            .field("credentials_path", &self.credentials_path)
            .finish()
    }
}
