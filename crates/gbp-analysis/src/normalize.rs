//! Normalization of raw performance insights into [`PerformanceMetrics`].

use gbp_core::{MetricEntry, MetricKind, PerformanceMetrics};
use serde_json::Value;

/// Maps `(metric, value)` entries onto the six fixed counters.
///
/// Unrecognized metric names are ignored and later entries for the same
/// metric overwrite earlier ones. Values that cannot be read as a
/// non-negative integer count as zero, so this never fails.
#[must_use]
pub fn normalize_metrics(entries: &[MetricEntry]) -> PerformanceMetrics {
    let mut metrics = PerformanceMetrics::default();
    for entry in entries {
        if let Some(kind) = MetricKind::from_name(&entry.metric) {
            *metrics.counter_mut(kind) = coerce_count(&entry.value);
        }
    }
    metrics
}

/// Best-effort integer coercion. Negative, fractional-text, and non-numeric
/// values become `0`; non-negative floats are truncated.
pub(crate) fn coerce_count(value: &Value) -> u64 {
    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                v
            } else if n.is_i64() {
                0
            } else {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0)
                    // Saturating float-to-int conversion; fraction dropped.
                    .map_or(0, |f| {
                        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                        let truncated = f as u64;
                        truncated
                    })
            }
        }
        Value::String(s) => s.trim().parse::<u64>().unwrap_or(0),
        _ => 0,
    }
}
