//! OAuth 2.0 authorization-code flow for installed applications.
//!
//! The user opens [`OAuthClient::authorization_url`], grants access, and
//! pastes the resulting code back; [`OAuthClient::exchange_code`] trades it
//! for tokens and [`OAuthClient::refresh`] renews an expired access token.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::error::GoogleError;
use crate::types::{TokenErrorResponse, TokenResponse};

pub const BUSINESS_MANAGE_SCOPE: &str = "https://www.googleapis.com/auth/business.manage";

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Access tokens this close to expiry are treated as already expired.
const EXPIRY_SKEW_SECS: i64 = 60;

/// Tokens held for one connected user.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleCredentials {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub scope: Option<String>,
}

impl GoogleCredentials {
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|at| now + TimeDelta::seconds(EXPIRY_SKEW_SECS) >= at)
    }
}

impl std::fmt::Debug for GoogleCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleCredentials")
            .field("access_token", &"[redacted]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[redacted]"),
            )
            .field("expires_at", &self.expires_at)
            .field("scope", &self.scope)
            .finish()
    }
}

/// OAuth client registration.
#[derive(Clone)]
pub struct OAuthSettings {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

pub struct OAuthClient {
    client: Client,
    settings: OAuthSettings,
    auth_uri: Url,
    token_uri: String,
}

impl OAuthClient {
    /// Creates a client against Google's production OAuth endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`GoogleError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(settings: OAuthSettings, timeout_secs: u64) -> Result<Self, GoogleError> {
        Self::with_endpoints(settings, timeout_secs, DEFAULT_AUTH_URI, DEFAULT_TOKEN_URI)
    }

    /// Creates a client with custom endpoints (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`GoogleError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`GoogleError::InvalidUrl`] if `auth_uri` does not parse.
    pub fn with_endpoints(
        settings: OAuthSettings,
        timeout_secs: u64,
        auth_uri: &str,
        token_uri: &str,
    ) -> Result<Self, GoogleError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        let auth_uri = Url::parse(auth_uri).map_err(|e| GoogleError::InvalidUrl {
            url: auth_uri.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            settings,
            auth_uri,
            token_uri: token_uri.to_owned(),
        })
    }

    /// URL the user opens to grant the bot access to their Business Profile.
    #[must_use]
    pub fn authorization_url(&self) -> Url {
        let mut url = self.auth_uri.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.settings.client_id)
            .append_pair("redirect_uri", &self.settings.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", BUSINESS_MANAGE_SCOPE)
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent");
        url
    }

    /// Trades an authorization code for tokens.
    ///
    /// # Errors
    ///
    /// - [`GoogleError::OAuth`] if Google rejects the code.
    /// - [`GoogleError::Http`] / [`GoogleError::Api`] on transport or unexpected status.
    /// - [`GoogleError::Deserialize`] if the token response is malformed.
    pub async fn exchange_code(&self, code: &str) -> Result<GoogleCredentials, GoogleError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code.trim()),
            ("client_id", self.settings.client_id.as_str()),
            ("client_secret", self.settings.client_secret.as_str()),
            ("redirect_uri", self.settings.redirect_uri.as_str()),
        ];
        let token = self.request_token(&params).await?;
        Ok(credentials_from(token, None, Utc::now()))
    }

    /// Obtains a fresh access token, keeping the old refresh token when
    /// Google does not rotate it.
    ///
    /// # Errors
    ///
    /// - [`GoogleError::MissingRefreshToken`] if `credentials` cannot be refreshed.
    /// - Otherwise as [`OAuthClient::exchange_code`].
    pub async fn refresh(
        &self,
        credentials: &GoogleCredentials,
    ) -> Result<GoogleCredentials, GoogleError> {
        let refresh_token = credentials
            .refresh_token
            .as_deref()
            .ok_or(GoogleError::MissingRefreshToken)?;
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.settings.client_id.as_str()),
            ("client_secret", self.settings.client_secret.as_str()),
        ];
        let token = self.request_token(&params).await?;
        tracing::debug!("refreshed Google access token");
        Ok(credentials_from(
            token,
            credentials.refresh_token.clone(),
            Utc::now(),
        ))
    }

    async fn request_token(&self, params: &[(&str, &str)]) -> Result<TokenResponse, GoogleError> {
        let response = self
            .client
            .post(&self.token_uri)
            .form(params)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            if let Ok(err) = serde_json::from_str::<TokenErrorResponse>(&body) {
                let message = match err.error_description {
                    Some(description) => format!("{}: {description}", err.error),
                    None => err.error,
                };
                return Err(GoogleError::OAuth(message));
            }
            return Err(GoogleError::Api {
                status: status.as_u16(),
                url: self.token_uri.clone(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| GoogleError::Deserialize {
            context: "token response".to_owned(),
            source: e,
        })
    }
}

fn credentials_from(
    token: TokenResponse,
    previous_refresh_token: Option<String>,
    now: DateTime<Utc>,
) -> GoogleCredentials {
    GoogleCredentials {
        access_token: token.access_token,
        refresh_token: token.refresh_token.or(previous_refresh_token),
        expires_at: token.expires_in.map(|secs| now + TimeDelta::seconds(secs)),
        scope: token.scope,
    }
}
