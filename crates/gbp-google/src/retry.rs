//! Back-off policy for Google API calls.
//!
//! Only transient failures are retried: network errors, 429 and 5xx.
//! Token and permission problems surface on the first attempt.

use std::future::Future;
use std::time::Duration;

use crate::error::GoogleError;

const DELAY_CEILING: Duration = Duration::from_secs(30);

/// How many times a request is repeated and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RetryPolicy {
    pub(crate) max_retries: u32,
    pub(crate) base_delay: Duration,
}

impl RetryPolicy {
    pub(crate) fn new(max_retries: u32, base_delay_ms: u64) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_millis(base_delay_ms),
        }
    }

    /// Delay before retry number `retry` (1-based), before jitter.
    ///
    /// Doubles per retry and never exceeds thirty seconds.
    pub(crate) fn nominal_delay(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1).min(16));
        self.base_delay
            .checked_mul(factor)
            .map_or(DELAY_CEILING, |delay| delay.min(DELAY_CEILING))
    }

    /// Runs `request` until it succeeds, fails permanently, or the retry budget is spent.
    pub(crate) async fn run<T, F, Fut>(&self, mut request: F) -> Result<T, GoogleError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GoogleError>>,
    {
        let mut retries_used = 0;
        let err = loop {
            let err = match request().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            if retries_used == self.max_retries || !err.is_transient() {
                break err;
            }
            retries_used += 1;

            // Spread concurrent callers over 75%..125% of the nominal delay.
            let delay = self
                .nominal_delay(retries_used)
                .mul_f64(0.75 + rand::random::<f64>() / 2.0);
            tracing::warn!(
                retry = retries_used,
                of = self.max_retries,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                "transient Google API failure"
            );
            tokio::time::sleep(delay).await;
        };
        Err(err)
    }
}

impl GoogleError {
    /// Whether repeating the same request might succeed.
    pub(crate) fn is_transient(&self) -> bool {
        match self {
            Self::Http(source) => {
                source.is_timeout()
                    || source.is_connect()
                    || source.status().is_some_and(|s| s.is_server_error())
            }
            Self::Api { status, .. } => matches!(*status, 429 | 500..),
            Self::OAuth(_)
            | Self::MissingRefreshToken
            | Self::InvalidUrl { .. }
            | Self::Deserialize { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn status(code: u16) -> GoogleError {
        GoogleError::Api {
            status: code,
            url: "https://example.test".to_owned(),
            body: String::new(),
        }
    }

    /// Fails with `failures` in order, then yields `Ok(attempt count)`.
    async fn scripted(policy: RetryPolicy, failures: &[u16]) -> (Result<u32, GoogleError>, u32) {
        let attempts = AtomicU32::new(0);
        let result = policy
            .run(|| {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                let outcome = match failures.get(n as usize) {
                    Some(&code) => Err(status(code)),
                    None => Ok(n + 1),
                };
                async move { outcome }
            })
            .await;
        (result, attempts.load(Ordering::SeqCst))
    }

    #[test]
    fn transient_statuses() {
        for code in [429, 500, 502, 503] {
            assert!(status(code).is_transient(), "{code}");
        }
        for code in [400, 401, 403, 404] {
            assert!(!status(code).is_transient(), "{code}");
        }
        assert!(!GoogleError::OAuth("invalid_grant".to_owned()).is_transient());
        assert!(!GoogleError::MissingRefreshToken.is_transient());
    }

    #[test]
    fn nominal_delay_doubles_up_to_ceiling() {
        let policy = RetryPolicy::new(5, 1_000);
        assert_eq!(policy.nominal_delay(1), Duration::from_secs(1));
        assert_eq!(policy.nominal_delay(2), Duration::from_secs(2));
        assert_eq!(policy.nominal_delay(3), Duration::from_secs(4));
        assert_eq!(policy.nominal_delay(6), Duration::from_secs(30));
        assert_eq!(policy.nominal_delay(40), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn first_success_is_returned_without_retrying() {
        let (result, attempts) = scripted(RetryPolicy::new(3, 0), &[]).await;
        assert_eq!(result.unwrap(), 1);
        assert_eq!(attempts, 1);
    }

    #[tokio::test]
    async fn recovers_after_transient_failures() {
        let (result, attempts) = scripted(RetryPolicy::new(3, 0), &[503, 429]).await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn unauthorized_fails_on_first_attempt() {
        let (result, attempts) = scripted(RetryPolicy::new(3, 0), &[401, 401]).await;
        assert_eq!(attempts, 1);
        assert!(matches!(result, Err(GoogleError::Api { status: 401, .. })));
    }

    #[tokio::test]
    async fn stops_when_budget_is_spent() {
        let (result, attempts) = scripted(RetryPolicy::new(2, 0), &[500, 500, 500, 500]).await;
        assert_eq!(attempts, 3);
        assert!(matches!(result, Err(GoogleError::Api { status: 500, .. })));
    }
}
