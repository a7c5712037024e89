//! Performance counters reported for a business location.

use serde::{Deserialize, Serialize};

/// The six insight metrics requested from the performance API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Views,
    QueriesDirect,
    QueriesIndirect,
    ActionsPhone,
    ActionsDirections,
    ActionsWebsite,
}

impl MetricKind {
    pub const ALL: [MetricKind; 6] = [
        MetricKind::QueriesDirect,
        MetricKind::QueriesIndirect,
        MetricKind::Views,
        MetricKind::ActionsPhone,
        MetricKind::ActionsDirections,
        MetricKind::ActionsWebsite,
    ];

    /// Wire name used by the performance API.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Views => "VIEWS",
            MetricKind::QueriesDirect => "QUERIES_DIRECT",
            MetricKind::QueriesIndirect => "QUERIES_INDIRECT",
            MetricKind::ActionsPhone => "ACTIONS_PHONE",
            MetricKind::ActionsDirections => "ACTIONS_DIRECTIONS",
            MetricKind::ActionsWebsite => "ACTIONS_WEBSITE",
        }
    }

    /// Exact, case-sensitive lookup by wire name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

/// One `(metric, value)` pair as returned by the performance collaborator.
///
/// `value` is left untyped: the API encodes int64 counters as JSON strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricEntry {
    pub metric: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

impl MetricEntry {
    pub fn new(metric: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            metric: metric.into(),
            value: value.into(),
        }
    }
}

/// Aggregate counters over the trailing performance window. Absent metrics are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceMetrics {
    pub views: u64,
    pub queries_direct: u64,
    pub queries_indirect: u64,
    pub calls: u64,
    pub directions: u64,
    pub website_clicks: u64,
}

impl PerformanceMetrics {
    /// Mutable handle to the counter a metric kind feeds.
    pub fn counter_mut(&mut self, kind: MetricKind) -> &mut u64 {
        match kind {
            MetricKind::Views => &mut self.views,
            MetricKind::QueriesDirect => &mut self.queries_direct,
            MetricKind::QueriesIndirect => &mut self.queries_indirect,
            MetricKind::ActionsPhone => &mut self.calls,
            MetricKind::ActionsDirections => &mut self.directions,
            MetricKind::ActionsWebsite => &mut self.website_clicks,
        }
    }
}
