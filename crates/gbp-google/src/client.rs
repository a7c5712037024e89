//! HTTP client for the Business Profile APIs.
//!
//! Three Google services are involved: the v4 account management API
//! (accounts and locations), the v1 business information API (the location
//! profile itself), and the v1 performance API (insight counters). Every
//! request is authenticated with the user's bearer token and retried on
//! transient failures.

use std::time::Duration;

use chrono::{Datelike, Days, NaiveDate, Utc};
use gbp_core::{BusinessData, BusinessProfile, MetricEntry, MetricKind};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::GoogleError;
use crate::oauth::GoogleCredentials;
use crate::retry::RetryPolicy;
use crate::types::{
    Account, AccountsResponse, ApiDate, DateRange, InsightsRequest, InsightsResponse, Location,
    LocationsResponse,
};

const DEFAULT_ACCOUNTS_API: &str = "https://mybusiness.googleapis.com";
const DEFAULT_INFORMATION_API: &str = "https://mybusinessbusinessinformation.googleapis.com";
const DEFAULT_PERFORMANCE_API: &str = "https://mybusinessperformance.googleapis.com";

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BACKOFF_BASE_MS: u64 = 1_000;
const DEFAULT_WINDOW_DAYS: u32 = 30;

/// Base URLs of the three Google services, without trailing slash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleEndpoints {
    pub accounts_api: String,
    pub information_api: String,
    pub performance_api: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            accounts_api: DEFAULT_ACCOUNTS_API.to_owned(),
            information_api: DEFAULT_INFORMATION_API.to_owned(),
            performance_api: DEFAULT_PERFORMANCE_API.to_owned(),
        }
    }
}

impl GoogleEndpoints {
    /// Routes every service to one host; used to point at a mock server.
    #[must_use]
    pub fn uniform(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/').to_owned();
        Self {
            accounts_api: base.clone(),
            information_api: base.clone(),
            performance_api: base,
        }
    }
}

/// Fetches the profile and insights of the first location of the first
/// account the user manages.
///
/// Use [`BusinessProfileClient::new`] for production or
/// [`BusinessProfileClient::with_endpoints`] to point at a mock server.
pub struct BusinessProfileClient {
    client: Client,
    endpoints: GoogleEndpoints,
    retry: RetryPolicy,
    window_days: u32,
}

impl BusinessProfileClient {
    /// # Errors
    ///
    /// Returns [`GoogleError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64) -> Result<Self, GoogleError> {
        Self::with_endpoints(timeout_secs, GoogleEndpoints::default())
    }

    /// # Errors
    ///
    /// Returns [`GoogleError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn with_endpoints(
        timeout_secs: u64,
        endpoints: GoogleEndpoints,
    ) -> Result<Self, GoogleError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("gbp-bot/0.1 (profile-analysis)")
            .build()?;

        Ok(Self {
            client,
            endpoints,
            retry: RetryPolicy::new(DEFAULT_MAX_RETRIES, DEFAULT_BACKOFF_BASE_MS),
            window_days: DEFAULT_WINDOW_DAYS,
        })
    }

    #[must_use]
    pub fn with_retry_policy(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.retry = RetryPolicy::new(max_retries, backoff_base_ms);
        self
    }

    /// Number of days, ending today, covered by the insights report.
    #[must_use]
    pub fn with_window_days(mut self, window_days: u32) -> Self {
        self.window_days = window_days;
        self
    }

    /// Collects everything the analysis needs for one user.
    ///
    /// Returns `Ok(None)` when the user manages no accounts or the first
    /// account has no locations. A failing insights report is logged and
    /// replaced by an empty list, so the profile can still be analyzed.
    ///
    /// # Errors
    ///
    /// - [`GoogleError::Api`] if an accounts, locations, or profile request
    ///   returns a non-2xx status.
    /// - [`GoogleError::Http`] on network failure after retries.
    /// - [`GoogleError::Deserialize`] if a response does not match the
    ///   expected shape.
    pub async fn fetch_business_data(
        &self,
        credentials: &GoogleCredentials,
    ) -> Result<Option<BusinessData>, GoogleError> {
        let token = credentials.access_token.as_str();

        let Some(account) = self.list_accounts(token).await?.into_iter().next() else {
            tracing::warn!("no Business Profile accounts found");
            return Ok(None);
        };
        let Some(location) = self
            .list_locations(token, &account.name)
            .await?
            .into_iter()
            .next()
        else {
            tracing::warn!(account = %account.name, "no locations found for account");
            return Ok(None);
        };

        let profile = self.get_profile(token, &location.name).await?;
        let insights = match self.report_insights(token, &location.name).await {
            Ok(insights) => insights,
            Err(e) => {
                tracing::warn!(
                    location = %location.name,
                    error = %e,
                    "performance insights unavailable, continuing without metrics"
                );
                Vec::new()
            }
        };

        tracing::info!(
            account = %account.name,
            location = %location.name,
            insights = insights.len(),
            "fetched business data"
        );

        Ok(Some(BusinessData {
            account_name: account.name,
            location_name: location.name,
            profile,
            insights,
        }))
    }

    /// Lists the accounts the token can manage.
    ///
    /// # Errors
    ///
    /// Same as [`BusinessProfileClient::fetch_business_data`].
    pub async fn list_accounts(&self, token: &str) -> Result<Vec<Account>, GoogleError> {
        let url = format!("{}/v4/accounts", self.endpoints.accounts_api);
        let response: AccountsResponse = self.get_json(&url, token, "accounts.list").await?;
        Ok(response.accounts)
    }

    /// Lists the locations of `account` (`accounts/{id}`).
    ///
    /// # Errors
    ///
    /// Same as [`BusinessProfileClient::fetch_business_data`].
    pub async fn list_locations(
        &self,
        token: &str,
        account: &str,
    ) -> Result<Vec<Location>, GoogleError> {
        let url = format!("{}/v4/{account}/locations", self.endpoints.accounts_api);
        let response: LocationsResponse = self
            .get_json(&url, token, &format!("locations.list({account})"))
            .await?;
        Ok(response.locations)
    }

    /// Fetches the public profile of `location`.
    ///
    /// # Errors
    ///
    /// Same as [`BusinessProfileClient::fetch_business_data`].
    pub async fn get_profile(
        &self,
        token: &str,
        location: &str,
    ) -> Result<BusinessProfile, GoogleError> {
        let url = format!("{}/v1/{location}", self.endpoints.information_api);
        self.get_json(&url, token, &format!("locations.get({location})"))
            .await
    }

    /// Requests the six insight counters for the configured window.
    ///
    /// # Errors
    ///
    /// Same as [`BusinessProfileClient::fetch_business_data`].
    pub async fn report_insights(
        &self,
        token: &str,
        location: &str,
    ) -> Result<Vec<MetricEntry>, GoogleError> {
        let url = format!(
            "{}/v1/{location}:reportInsights",
            self.endpoints.performance_api
        );
        let body = insights_request(Utc::now().date_naive(), self.window_days);
        let response: InsightsResponse = self
            .post_json(&url, token, &body, &format!("reportInsights({location})"))
            .await?;
        Ok(response.insights)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        token: &str,
        context: &str,
    ) -> Result<T, GoogleError> {
        self.retry.run(move || async move {
            let response = self.client.get(url).bearer_auth(token).send().await?;
            decode(response, url, context).await
        })
        .await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: &str,
        token: &str,
        body: &B,
        context: &str,
    ) -> Result<T, GoogleError> {
        self.retry.run(move || async move {
            let response = self
                .client
                .post(url)
                .bearer_auth(token)
                .json(body)
                .send()
                .await?;
            decode(response, url, context).await
        })
        .await
    }
}

/// Checks for a 2xx status and parses the body as `T`.
async fn decode<T: DeserializeOwned>(
    response: Response,
    url: &str,
    context: &str,
) -> Result<T, GoogleError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(GoogleError::Api {
            status: status.as_u16(),
            url: url.to_owned(),
            body,
        });
    }
    serde_json::from_str(&body).map_err(|e| GoogleError::Deserialize {
        context: context.to_owned(),
        source: e,
    })
}

fn insights_request(end: NaiveDate, window_days: u32) -> InsightsRequest {
    let start = end
        .checked_sub_days(Days::new(u64::from(window_days)))
        .unwrap_or(NaiveDate::MIN);
    InsightsRequest {
        date_range: DateRange {
            start_date: api_date(start),
            end_date: api_date(end),
        },
        dimensions: vec!["METRIC_TYPE"],
        metrics: MetricKind::ALL.into_iter().map(MetricKind::as_str).collect(),
    }
}

fn api_date(date: NaiveDate) -> ApiDate {
    ApiDate {
        year: date.year(),
        month: date.month(),
        day: date.day(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insights_window_spans_month_boundary() {
        let end = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let request = insights_request(end, 30);
        assert_eq!(
            request.date_range.start_date,
            ApiDate {
                year: 2024,
                month: 2,
                day: 9
            }
        );
        assert_eq!(
            request.date_range.end_date,
            ApiDate {
                year: 2024,
                month: 3,
                day: 10
            }
        );
    }

    #[test]
    fn insights_request_names_all_six_metrics() {
        let request = insights_request(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(), 7);
        assert_eq!(request.dimensions, vec!["METRIC_TYPE"]);
        assert_eq!(request.metrics.len(), 6);
        assert!(request.metrics.contains(&"ACTIONS_WEBSITE"));
        assert!(request.metrics.contains(&"QUERIES_INDIRECT"));
    }

    #[test]
    fn insights_request_serializes_camel_case() {
        let request = insights_request(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(), 1);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["dateRange"]["startDate"]["day"], 30);
        assert_eq!(json["dateRange"]["endDate"]["month"], 1);
    }

    #[test]
    fn uniform_endpoints_strip_trailing_slash() {
        let endpoints = GoogleEndpoints::uniform("http://127.0.0.1:9999/");
        assert_eq!(endpoints.accounts_api, "http://127.0.0.1:9999");
        assert_eq!(endpoints.performance_api, "http://127.0.0.1:9999");
    }
}
