mod commands;
mod handlers;
mod messages;
mod store;
mod telegram;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use gbp_analysis::{display_text, score_profile, Analyzer, AnalyzerSettings, AnthropicClient};
use gbp_core::{BusinessProfile, MetricEntry};
use gbp_google::{BusinessProfileClient, OAuthClient, OAuthSettings};
use tracing_subscriber::EnvFilter;

use crate::handlers::BotContext;
use crate::store::CredentialStore;
use crate::telegram::TelegramClient;

#[derive(Debug, Parser)]
#[command(name = "gbp-bot")]
#[command(about = "Telegram bot that audits and optimizes Google Business Profiles")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the Telegram bot (default)
    Run,
    /// Report which required environment variables are set
    Check,
    /// Analyze a profile stored as JSON without Telegram or Google
    Analyze {
        /// Business profile JSON file
        #[arg(long)]
        profile: PathBuf,
        /// JSON array of `{ "metric", "value" }` insight entries
        #[arg(long)]
        insights: Option<PathBuf>,
        /// Print only the completeness score; no text generation
        #[arg(long)]
        score_only: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        None | Some(Commands::Run) => run_bot().await,
        Some(Commands::Check) => run_check(),
        Some(Commands::Analyze {
            profile,
            insights,
            score_only,
        }) => run_analyze(&profile, insights.as_deref(), score_only).await,
    }
}

fn init_tracing(log_level: &str) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    Ok(())
}

async fn run_bot() -> anyhow::Result<()> {
    let config = gbp_core::load_app_config_from_env()?;
    init_tracing(&config.log_level)?;
    tracing::info!(env = %config.env, model = %config.analysis_model, "starting gbp-bot");

    let telegram = TelegramClient::new(
        &config.telegram_bot_token,
        config.telegram_poll_timeout_secs + config.request_timeout_secs,
    )?;
    let oauth = OAuthClient::new(
        OAuthSettings {
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            redirect_uri: config.google_redirect_uri.clone(),
        },
        config.request_timeout_secs,
    )?;
    let google = BusinessProfileClient::new(config.request_timeout_secs)?
        .with_retry_policy(config.google_max_retries, config.google_retry_backoff_ms)
        .with_window_days(config.performance_window_days);
    let analyzer = Analyzer::new(
        AnthropicClient::new(&config.claude_api_key, config.analysis_timeout_secs)?,
        AnalyzerSettings::from_app_config(&config),
    );
    let store = CredentialStore::load(&config.credentials_path).await?;

    let ctx = Arc::new(BotContext {
        telegram,
        oauth,
        google,
        analyzer,
        store,
        poll_timeout_secs: config.telegram_poll_timeout_secs,
    });
    handlers::run_polling(ctx, shutdown_signal(), handlers::SHUTDOWN_GRACE).await;
    Ok(())
}

fn run_check() -> anyhow::Result<()> {
    let checks = gbp_core::check_env(|key| std::env::var(key));
    for check in &checks {
        match &check.preview {
            Some(preview) => println!("✅ {}: {preview}", check.var),
            None => println!("❌ {}: no configurada ({})", check.var, check.description),
        }
    }
    let missing = checks.iter().filter(|check| !check.is_set()).count();
    if missing > 0 {
        anyhow::bail!("{missing} required environment variable(s) missing");
    }
    println!("\nConfiguración completa.");
    Ok(())
}

async fn run_analyze(
    profile_path: &Path,
    insights_path: Option<&Path>,
    score_only: bool,
) -> anyhow::Result<()> {
    let profile: BusinessProfile = read_json(profile_path)?;
    let insights: Vec<MetricEntry> = match insights_path {
        Some(path) => read_json(path)?,
        None => Vec::new(),
    };

    let report = score_profile(&profile);
    println!("{}", messages::format_completeness(&report));
    if score_only {
        return Ok(());
    }

    let config = gbp_core::load_app_config_from_env()?;
    init_tracing(&config.log_level)?;
    let analyzer = Analyzer::new(
        AnthropicClient::new(&config.claude_api_key, config.analysis_timeout_secs)?,
        AnalyzerSettings::from_app_config(&config),
    );
    let metrics = gbp_analysis::normalize_metrics(&insights);
    let result = analyzer.analyze(&profile, &metrics).await;
    println!("\n{}", display_text(&result));
    if result.is_err() {
        anyhow::bail!("analysis failed");
    }
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid JSON in {}", path.display()))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, stopping");
}
