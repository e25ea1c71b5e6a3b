//! Common library for the btc-dash services.
//!
//! Provides shared functionality:
//! - Configuration loading from .env
//! - File-persisted cooldown gate for remote analysis calls
//! - Single-slot cache for the most recent analysis snapshot
//! - TradingView scanner client and retrying fetch wrapper
//! - Snapshot assembly (signal tally, recommendation, trade levels)
//! - Strategy template evaluation against a snapshot
//! - CoinGecko top movers client

pub mod cache;
pub mod config;
pub mod cooldown;
pub mod coingecko;
pub mod fetch;
pub mod levels;
pub mod models;
pub mod service;
pub mod signals;
pub mod strategies;
pub mod tradingview;

pub use cache::{CacheEntry, ResultCache};
pub use config::Config;
pub use cooldown::{unix_now, Acquire, CooldownError, CooldownGate};
pub use coingecko::{CoinGeckoClient, CoinMarket, MoverBoard};
pub use fetch::{fetch_with_retry, AnalysisProvider, FetchFailed, RetryPolicy};
pub use models::{
    AnalysisSnapshot, IndicatorSet, MarketBias, Recommendation, TradeAction,
};
pub use service::{AnalysisService, RunOutcome};
pub use strategies::{StrategyKind, StrategyReport};
pub use tradingview::{ProviderError, TradingViewClient};
