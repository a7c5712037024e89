//! Minimal Telegram Bot API transport: long-poll `getUpdates` and
//! `sendMessage`.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

const DEFAULT_BASE_URL: &str = "https://api.telegram.org";

/// Telegram rejects messages longer than this.
pub const MAX_MESSAGE_CHARS: usize = 4096;

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The Bot API answered `"ok": false`.
    #[error("Telegram API error in {method}: {description}")]
    Api {
        method: &'static str,
        description: String,
    },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

pub struct TelegramClient {
    client: Client,
    base_url: String,
    token: String,
}

impl TelegramClient {
    /// `timeout_secs` bounds every request, so it must exceed the long-poll
    /// timeout passed to [`TelegramClient::get_updates`].
    ///
    /// # Errors
    ///
    /// Returns [`TelegramError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(token: &str, timeout_secs: u64) -> Result<Self, TelegramError> {
        Self::with_base_url(token, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom API host (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`TelegramError::Http`] if the `reqwest::Client` cannot be built.
    pub fn with_base_url(
        token: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, TelegramError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            token: token.to_owned(),
        })
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.base_url, self.token)
    }

    /// Long-polls for updates with id `>= offset`.
    ///
    /// # Errors
    ///
    /// Returns [`TelegramError`] on transport failure, an `"ok": false`
    /// envelope, or an unparseable body.
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TelegramError> {
        let body = json!({
            "offset": offset,
            "timeout": timeout_secs,
            "allowed_updates": ["message"],
        });
        self.call("getUpdates", &body).await
    }

    /// Sends `text` to `chat_id`, split into as many messages as needed.
    ///
    /// Each chunk is sent as Markdown first; if Telegram cannot parse the
    /// entities the chunk is re-sent as plain text.
    ///
    /// # Errors
    ///
    /// Returns the first [`TelegramError`] that is not a Markdown rejection.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TelegramError> {
        for chunk in split_message(text, MAX_MESSAGE_CHARS) {
            let markdown = json!({
                "chat_id": chat_id,
                "text": chunk,
                "parse_mode": "Markdown",
            });
            match self.call::<serde_json::Value>("sendMessage", &markdown).await {
                Ok(_) => {}
                Err(TelegramError::Api { description, .. }) => {
                    tracing::warn!(chat_id, %description, "markdown rejected, resending as plain text");
                    let plain = json!({ "chat_id": chat_id, "text": chunk });
                    self.call::<serde_json::Value>("sendMessage", &plain).await?;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        body: &serde_json::Value,
    ) -> Result<T, TelegramError> {
        let response = self.client.post(self.api_url(method)).json(body).send().await?;
        let bytes = response.bytes().await?;
        let envelope: Envelope<T> =
            serde_json::from_slice(&bytes).map_err(|e| TelegramError::Deserialize {
                context: method,
                source: e,
            })?;

        match envelope {
            Envelope {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            Envelope { description, .. } => Err(TelegramError::Api {
                method,
                description: description.unwrap_or_else(|| "no result".to_owned()),
            }),
        }
    }
}

/// Splits `text` into chunks of at most `limit` characters, breaking on line
/// boundaries where possible. Lines longer than `limit` are cut mid-line.
/// Blank chunks are dropped.
#[must_use]
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();
        if current_len + line_len > limit {
            flush(&mut chunks, &mut current);
            current_len = 0;
        }
        if line_len > limit {
            for ch in line.chars() {
                if current_len == limit {
                    flush(&mut chunks, &mut current);
                    current_len = 0;
                }
                current.push(ch);
                current_len += 1;
            }
        } else {
            current.push_str(line);
            current_len += line_len;
        }
    }
    flush(&mut chunks, &mut current);
    chunks
}

fn flush(chunks: &mut Vec<String>, current: &mut String) {
    let chunk = std::mem::take(current);
    let trimmed = chunk.trim_end_matches('\n');
    if !trimmed.trim().is_empty() {
        chunks.push(trimmed.to_owned());
    }
}
