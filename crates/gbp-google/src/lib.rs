//! Google collaborators: OAuth token exchange and the Business Profile
//! data fetcher (accounts, locations, profile, performance insights).

pub mod client;
pub mod error;
pub mod oauth;
pub mod types;

mod retry;

pub use client::{BusinessProfileClient, GoogleEndpoints};
pub use error::GoogleError;
pub use oauth::{GoogleCredentials, OAuthClient, OAuthSettings, BUSINESS_MANAGE_SCOPE};
