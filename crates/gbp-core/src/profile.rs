//! Business profile record as returned by the Business Information API.

use serde::{Deserialize, Serialize};

use crate::metrics::MetricEntry;

/// Public-facing attributes of one business location.
///
/// Every field is optional: an absent field is a meaningful state (the
/// profile is incomplete), not a decoding error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessProfile {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub category: Option<String>,
    pub phone_number: Option<String>,
    pub website_url: Option<String>,
    pub description: Option<String>,
    pub address: Option<PostalAddress>,
    /// Opaque: either free text or the API's structured period list.
    pub business_hours: Option<serde_json::Value>,
    pub photos: Option<Vec<serde_json::Value>>,
}

impl BusinessProfile {
    #[must_use]
    pub fn photo_count(&self) -> usize {
        self.photos.as_ref().map_or(0, Vec::len)
    }

    /// First populated line of the postal address, if any. An address with
    /// no street lines falls back to its first populated locality-level part,
    /// so any address that is not [`PostalAddress::is_blank`] yields a line.
    #[must_use]
    pub fn first_address_line(&self) -> Option<&str> {
        let address = self.address.as_ref()?;
        address
            .address_lines
            .iter()
            .map(String::as_str)
            .chain(
                [
                    &address.locality,
                    &address.administrative_area,
                    &address.postal_code,
                    &address.region_code,
                ]
                .into_iter()
                .filter_map(Option::as_deref),
            )
            .find(|part| !part.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostalAddress {
    pub address_lines: Vec<String>,
    pub locality: Option<String>,
    pub administrative_area: Option<String>,
    pub postal_code: Option<String>,
    pub region_code: Option<String>,
}

impl PostalAddress {
    /// `true` when no part of the address carries any text.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        let empty = |v: &Option<String>| v.as_deref().is_none_or(str::is_empty);
        self.address_lines.iter().all(String::is_empty)
            && empty(&self.locality)
            && empty(&self.administrative_area)
            && empty(&self.postal_code)
            && empty(&self.region_code)
    }
}

/// Everything the profile-data fetcher returns for the first location of an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessData {
    pub account_name: String,
    pub location_name: String,
    pub profile: BusinessProfile,
    pub insights: Vec<MetricEntry>,
}
