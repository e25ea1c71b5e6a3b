//! Analysis service: cooldown gate + result cache + retrying fetch.
//!
//! The single entry point the UI boundary calls. Every failure below
//! here is folded into the closed [`RunOutcome`] set; nothing escapes to
//! the presentation layer as an unhandled fault except I/O trouble with
//! the cooldown record itself.

use std::time::Duration;

use tracing::{info, warn};

use crate::cache::{CacheEntry, ResultCache};
use crate::cooldown::{Acquire, CooldownError, CooldownGate};
use crate::fetch::{fetch_with_retry, AnalysisProvider, FetchFailed, RetryPolicy};
use crate::models::AnalysisSnapshot;
use crate::Config;

/// User-facing outcome of one "run analysis" request.
#[derive(Debug)]
pub enum RunOutcome {
    /// Granted and fetched: a fresh snapshot.
    Completed(AnalysisSnapshot),
    /// Granted but the fetch failed terminally. The reservation stands,
    /// so the full window must pass before the next attempt.
    Failed {
        error: FetchFailed,
        retry_after: Duration,
    },
    /// Denied: still inside the window. `cached` carries the last
    /// successful snapshot when one exists.
    CoolingDown {
        remaining: Duration,
        cached: Option<CacheEntry>,
    },
}

/// Composes the cooldown gate, the single-slot cache and the provider.
pub struct AnalysisService<P> {
    gate: CooldownGate,
    cache: ResultCache,
    provider: P,
    retry: RetryPolicy,
    symbol: String,
    screener: String,
    timeframe: String,
}

impl<P: AnalysisProvider> AnalysisService<P> {
    pub fn new(config: &Config, provider: P) -> Result<Self, CooldownError> {
        let gate = CooldownGate::new(&config.state_file, config.cooldown_secs)?;
        Ok(Self {
            gate,
            cache: ResultCache::new(),
            provider,
            retry: RetryPolicy::default(),
            symbol: config.symbol.clone(),
            screener: config.screener.clone(),
            timeframe: config.timeframe.clone(),
        })
    }

    pub fn gate(&self) -> &CooldownGate {
        &self.gate
    }

    /// Run one analysis request at `now` (seconds since epoch).
    ///
    /// The reservation is persisted before the fetch starts, so a second
    /// caller is denied while this one is still on the wire. The fetch
    /// itself runs with no lock held on the cooldown record.
    pub async fn run_analysis(&mut self, now: f64) -> Result<RunOutcome, CooldownError> {
        match self.gate.try_acquire(now)? {
            Acquire::Denied { remaining } => {
                info!(
                    "Analysis denied, {:.0}s left in cooldown window",
                    remaining.as_secs_f64()
                );
                Ok(RunOutcome::CoolingDown {
                    remaining,
                    cached: self.cache.peek().cloned(),
                })
            }
            Acquire::Granted => {
                info!("Cooldown granted, fetching analysis for {}", self.symbol);
                match fetch_with_retry(
                    &self.provider,
                    &self.symbol,
                    &self.screener,
                    &self.timeframe,
                    &self.retry,
                )
                .await
                {
                    Ok(indicators) => {
                        let snapshot =
                            AnalysisSnapshot::from_indicators(self.symbol.clone(), indicators);
                        self.cache.store(snapshot.clone(), now);
                        Ok(RunOutcome::Completed(snapshot))
                    }
                    Err(error) => {
                        // The window was consumed by the reservation; no
                        // partial credit for a failed fetch.
                        warn!("Analysis fetch failed: {}", error);
                        Ok(RunOutcome::Failed {
                            error,
                            retry_after: self.gate.window(),
                        })
                    }
                }
            }
        }
    }

    /// Time left in the window at `now`. Safe to poll every second for a
    /// countdown display.
    pub fn remaining(&self, now: f64) -> Duration {
        self.gate.remaining(now)
    }

    /// Last successful snapshot held by this process, if any.
    pub fn peek_cached(&self) -> Option<&CacheEntry> {
        self.cache.peek()
    }
}
