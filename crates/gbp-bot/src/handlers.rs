//! Update routing: turns incoming Telegram messages into replies.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use gbp_analysis::{display_text, score_profile, Analyzer, AnthropicClient};
use gbp_google::{BusinessProfileClient, GoogleCredentials, GoogleError, OAuthClient};
use tokio::task::{JoinError, JoinSet};

use crate::commands::Command;
use crate::messages;
use crate::store::{auth_window_open, CredentialStore};
use crate::telegram::{TelegramClient, Update};

const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// How long shutdown waits for in-flight updates before abandoning them.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(60);

/// Everything a handler needs; shared by all in-flight updates.
pub struct BotContext {
    pub telegram: TelegramClient,
    pub oauth: OAuthClient,
    pub google: BusinessProfileClient,
    pub analyzer: Analyzer<AnthropicClient>,
    pub store: CredentialStore,
    pub poll_timeout_secs: u64,
}

/// Long-polls Telegram until `shutdown` resolves, handling each update in
/// its own task. Updates already being handled get up to `grace` to finish
/// before this returns.
pub async fn run_polling(
    ctx: Arc<BotContext>,
    shutdown: impl Future<Output = ()>,
    grace: Duration,
) {
    tokio::pin!(shutdown);
    let mut offset = 0_i64;
    let mut in_flight = JoinSet::new();
    tracing::info!("bot started, polling for updates");

    loop {
        while let Some(joined) = in_flight.try_join_next() {
            log_join_failure(&joined);
        }

        let result = tokio::select! {
            () = &mut shutdown => break,
            result = ctx.telegram.get_updates(offset, ctx.poll_timeout_secs) => result,
        };

        match result {
            Ok(updates) => {
                for update in updates {
                    offset = offset.max(update.update_id + 1);
                    let ctx = Arc::clone(&ctx);
                    in_flight.spawn(async move { handle_update(&ctx, update).await });
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Telegram poll failed");
                tokio::select! {
                    () = &mut shutdown => break,
                    () = tokio::time::sleep(POLL_ERROR_BACKOFF) => {}
                }
            }
        }
    }

    if !in_flight.is_empty() {
        tracing::info!(pending = in_flight.len(), "waiting for in-flight updates");
        let drained = tokio::time::timeout(grace, async {
            while let Some(joined) = in_flight.join_next().await {
                log_join_failure(&joined);
            }
        })
        .await;
        if drained.is_err() {
            tracing::warn!(
                abandoned = in_flight.len(),
                "shutdown grace period elapsed, aborting remaining updates"
            );
            in_flight.shutdown().await;
        }
    }

    tracing::info!("polling stopped");
}

fn log_join_failure(joined: &Result<(), JoinError>) {
    if let Err(e) = joined {
        tracing::error!(error = %e, "update handler panicked or was cancelled");
    }
}

/// Handles one update. Failures are logged and reported to the user; they
/// never propagate.
pub async fn handle_update(ctx: &BotContext, update: Update) {
    let Some(message) = update.message else {
        return;
    };
    let Some(text) = message.text.as_deref() else {
        return;
    };
    let chat_id = message.chat.id;
    let (user_id, username) = message
        .from
        .as_ref()
        .map_or((chat_id, None), |user| (user.id, user.username.as_deref()));

    let command = Command::parse(text);
    tracing::debug!(update_id = update.update_id, user_id, ?username, ?command, "handling update");

    if let Err(e) = dispatch(ctx, chat_id, user_id, command).await {
        tracing::error!(user_id, error = %e, "command failed");
        if let Err(send_err) = ctx.telegram.send_message(chat_id, messages::INTERNAL_ERROR).await {
            tracing::warn!(chat_id, error = %send_err, "could not report failure to user");
        }
    }
}

async fn dispatch(
    ctx: &BotContext,
    chat_id: i64,
    user_id: i64,
    command: Option<Command>,
) -> anyhow::Result<()> {
    let reply = match command {
        Some(Command::Start) => messages::welcome(),
        Some(Command::Help) => messages::HELP.to_owned(),
        Some(Command::Connect) => connect(ctx, user_id).await?,
        Some(Command::Code(code)) => complete_connection(ctx, user_id, &code).await?,
        Some(Command::Analyze) => return analyze(ctx, chat_id, user_id, true).await,
        Some(Command::Score) => return analyze(ctx, chat_id, user_id, false).await,
        Some(Command::Disconnect) => {
            if ctx.store.remove(user_id).await? {
                tracing::info!(user_id, "user disconnected");
                messages::DISCONNECTED.to_owned()
            } else {
                messages::NOT_CONNECTED.to_owned()
            }
        }
        Some(Command::Unknown(name)) => {
            tracing::debug!(user_id, command = %name, "unknown command");
            messages::NOT_A_COMMAND.to_owned()
        }
        None => messages::NOT_A_COMMAND.to_owned(),
    };
    ctx.telegram.send_message(chat_id, &reply).await?;
    Ok(())
}

async fn connect(ctx: &BotContext, user_id: i64) -> anyhow::Result<String> {
    ctx.store.begin_auth(user_id, Utc::now()).await?;
    tracing::info!(user_id, "authorization started");
    Ok(messages::connect_instructions(
        ctx.oauth.authorization_url().as_str(),
    ))
}

async fn complete_connection(ctx: &BotContext, user_id: i64, code: &str) -> anyhow::Result<String> {
    if code.is_empty() {
        return Ok(messages::CODE_USAGE.to_owned());
    }
    let pending = ctx.store.pending_since(user_id).await;
    if !pending.is_some_and(|since| auth_window_open(since, Utc::now())) {
        return Ok(messages::NO_PENDING_AUTH.to_owned());
    }

    match ctx.oauth.exchange_code(code).await {
        Ok(credentials) => {
            ctx.store.put(user_id, credentials).await?;
            tracing::info!(user_id, "Google account connected");
            Ok(messages::CONNECTED.to_owned())
        }
        Err(GoogleError::OAuth(reason)) => {
            tracing::warn!(user_id, %reason, "authorization code rejected");
            Ok(messages::code_rejected(&reason))
        }
        Err(e) => Err(e.into()),
    }
}

/// Runs `/analyze` (`with_report`) or `/score`.
async fn analyze(
    ctx: &BotContext,
    chat_id: i64,
    user_id: i64,
    with_report: bool,
) -> anyhow::Result<()> {
    let Some(credentials) = fresh_credentials(ctx, user_id).await? else {
        let text = if ctx.store.get(user_id).await.is_some() {
            messages::SESSION_EXPIRED
        } else {
            messages::NOT_CONNECTED
        };
        ctx.telegram.send_message(chat_id, text).await?;
        return Ok(());
    };

    if with_report {
        ctx.telegram.send_message(chat_id, messages::ANALYZING).await?;
    }

    let Some(data) = ctx.google.fetch_business_data(&credentials).await? else {
        ctx.telegram
            .send_message(chat_id, messages::NO_BUSINESS)
            .await?;
        return Ok(());
    };

    let summary = messages::format_completeness(&score_profile(&data.profile));
    let reply = if with_report {
        let result = ctx.analyzer.analyze_payload(&data).await;
        format!("{summary}\n\n{}", display_text(&result))
    } else {
        summary
    };
    ctx.telegram.send_message(chat_id, &reply).await?;
    Ok(())
}

/// Returns usable credentials for `user_id`, refreshing them when expired.
///
/// `None` means the user must run `/connect`: either nothing is stored or
/// Google refused to refresh. In the refusal case the stored credentials are
/// kept so the caller can tell the two apart.
async fn fresh_credentials(
    ctx: &BotContext,
    user_id: i64,
) -> anyhow::Result<Option<GoogleCredentials>> {
    let Some(credentials) = ctx.store.get(user_id).await else {
        return Ok(None);
    };
    if !credentials.is_expired(Utc::now()) {
        return Ok(Some(credentials));
    }

    match ctx.oauth.refresh(&credentials).await {
        Ok(renewed) => {
            ctx.store.put(user_id, renewed.clone()).await?;
            Ok(Some(renewed))
        }
        Err(e @ (GoogleError::OAuth(_) | GoogleError::MissingRefreshToken)) => {
            tracing::warn!(user_id, error = %e, "token refresh refused");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}
