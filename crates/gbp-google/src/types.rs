//! Wire types for the Business Profile APIs and the OAuth token endpoint.

use gbp_core::MetricEntry;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Resource name, `accounts/{id}`.
    pub name: String,
    #[serde(default)]
    pub account_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AccountsResponse {
    #[serde(default)]
    pub accounts: Vec<Account>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Resource name, `accounts/{id}/locations/{id}`.
    pub name: String,
    #[serde(default)]
    pub location_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct LocationsResponse {
    #[serde(default)]
    pub locations: Vec<Location>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct ApiDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DateRange {
    pub start_date: ApiDate,
    pub end_date: ApiDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InsightsRequest {
    pub date_range: DateRange,
    pub dimensions: Vec<&'static str>,
    pub metrics: Vec<&'static str>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct InsightsResponse {
    #[serde(default)]
    pub insights: Vec<MetricEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}
