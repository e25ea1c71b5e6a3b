//! Retrying wrapper around the analysis provider.
//!
//! One logical "fetch current analysis" call with bounded retries and
//! exponential backoff. Transient failures are retried; permanent ones
//! abort immediately without consuming the remaining attempts.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::IndicatorSet;
use crate::tradingview::ProviderError;

/// Remote source of technical-analysis snapshots.
/// Mockable for testing via mockall.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    /// Fetch the current indicator values for one symbol.
    async fn fetch_analysis(
        &self,
        symbol: &str,
        screener: &str,
        timeframe: &str,
    ) -> Result<IndicatorSet, ProviderError>;
}

/// Retry schedule: `max_attempts` tries with `base_delay * 2^(attempt-1)`
/// waits in between. A `max_attempts` of zero is treated as one.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

/// Terminal fetch failure: a permanent provider error, or transient ones
/// that survived every attempt.
#[derive(Debug, Error)]
#[error("Analysis fetch failed after {attempts} attempt(s): {source}")]
pub struct FetchFailed {
    pub attempts: u32,
    #[source]
    pub source: ProviderError,
}

/// Fetch with retry and exponential backoff.
///
/// The caller is expected to hold a cooldown reservation already; a
/// failure here does not roll that reservation back.
pub async fn fetch_with_retry<P>(
    provider: &P,
    symbol: &str,
    screener: &str,
    timeframe: &str,
    policy: &RetryPolicy,
) -> Result<IndicatorSet, FetchFailed>
where
    P: AnalysisProvider + ?Sized,
{
    let mut delay = policy.base_delay;
    // At least one attempt regardless of how the policy was built.
    let max_attempts = policy.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        debug!(
            "Fetching analysis for {} (attempt {}/{})",
            symbol, attempt, max_attempts
        );

        match provider.fetch_analysis(symbol, screener, timeframe).await {
            Ok(set) => {
                debug!("Fetch succeeded on attempt {}", attempt);
                return Ok(set);
            }
            Err(e) if e.is_transient() && attempt < max_attempts => {
                warn!(
                    "Transient fetch error on attempt {} ({}), retrying in {:?}",
                    attempt, e, delay
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            Err(e) => {
                warn!("Fetch failed terminally on attempt {}: {}", attempt, e);
                return Err(FetchFailed {
                    attempts: attempt,
                    source: e,
                });
            }
        }
    }

    unreachable!("loop returns on the final attempt")
}
