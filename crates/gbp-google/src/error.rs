use thiserror::Error;

/// Errors returned by the Google OAuth and Business Profile clients.
#[derive(Debug, Error)]
pub enum GoogleError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A Google API answered with a non-2xx status.
    #[error("Google API returned status {status} for {url}: {body}")]
    Api {
        status: u16,
        url: String,
        body: String,
    },

    /// The token endpoint rejected the grant (e.g. `invalid_grant`).
    #[error("OAuth error: {0}")]
    OAuth(String),

    /// Stored credentials cannot be refreshed because Google never issued a refresh token.
    #[error("credentials have no refresh token; reconnect the account")]
    MissingRefreshToken,

    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}
