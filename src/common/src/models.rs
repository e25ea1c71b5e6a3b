//! Shared data models for analysis snapshots.

use serde::{Deserialize, Serialize};

use crate::levels::{self, TradeLevels};
use crate::signals::{self, SignalTally};

/// Raw indicator values for one symbol, as returned by the scanner.
///
/// The provider owns all indicator math; these are stored verbatim.
/// Missing numeric cells default to 0, matching the upstream behavior;
/// ATR stays optional since not every exchange reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct IndicatorSet {
    pub close: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub volume: f64,
    /// 24h change in percent
    pub change: f64,
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub adx: f64,
    pub stoch_k: f64,
    pub stoch_d: f64,
    pub sma20: f64,
    pub ema50: f64,
    pub ema200: f64,
    pub bb_upper: f64,
    pub bb_lower: f64,
    pub atr: Option<f64>,
}

/// Overall recommendation derived from the signal tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    StrongBuy,
    Buy,
    Neutral,
    Sell,
    StrongSell,
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Recommendation::StrongBuy => "STRONG BUY",
            Recommendation::Buy => "BUY",
            Recommendation::Neutral => "NEUTRAL/HOLD",
            Recommendation::Sell => "SELL",
            Recommendation::StrongSell => "STRONG SELL",
        };
        write!(f, "{s}")
    }
}

/// Position type implied by the recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeAction {
    Long,
    Short,
    Wait,
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TradeAction::Long => "LONG",
            TradeAction::Short => "SHORT",
            TradeAction::Wait => "WAIT",
        };
        write!(f, "{s}")
    }
}

/// Directional bias used by the trade-level planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketBias {
    Bullish,
    Bearish,
    Neutral,
}

impl std::fmt::Display for MarketBias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MarketBias::Bullish => "BULLISH",
            MarketBias::Bearish => "BEARISH",
            MarketBias::Neutral => "NEUTRAL",
        };
        write!(f, "{s}")
    }
}

/// One complete analysis result. Immutable once built; the cache and the
/// UI only store and hand it back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSnapshot {
    pub symbol: String,
    pub indicators: IndicatorSet,
    /// Bollinger position rating, -3..=3
    pub rating: i8,
    /// Bollinger band width relative to SMA20
    pub bbw: f64,
    pub recommendation: Recommendation,
    pub action: TradeAction,
    pub bullish_signals: u8,
    pub bearish_signals: u8,
    pub signal_details: Vec<String>,
    pub levels: TradeLevels,
}

impl AnalysisSnapshot {
    /// Assemble a snapshot from raw indicator values.
    pub fn from_indicators(symbol: impl Into<String>, indicators: IndicatorSet) -> Self {
        let rating = signals::bollinger_rating(&indicators);
        let bbw = signals::band_width(&indicators);
        let SignalTally {
            bullish,
            bearish,
            details,
        } = signals::tally_signals(&indicators, rating);
        let (recommendation, action) = signals::recommend(bullish, bearish);
        let levels = levels::compute_levels(&indicators, rating);

        Self {
            symbol: symbol.into(),
            indicators,
            rating,
            bbw,
            recommendation,
            action,
            bullish_signals: bullish,
            bearish_signals: bearish,
            signal_details: details,
            levels,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// An indicator set describing a mildly bullish daily candle.
    pub fn sample_indicators(close: f64) -> IndicatorSet {
        IndicatorSet {
            close,
            open: close * 0.99,
            high: close * 1.01,
            low: close * 0.98,
            volume: 12_000.0,
            change: 1.2,
            rsi: 55.0,
            macd: 120.0,
            macd_signal: 80.0,
            adx: 28.0,
            stoch_k: 60.0,
            stoch_d: 55.0,
            sma20: close * 0.97,
            ema50: close * 0.95,
            ema200: close * 0.90,
            bb_upper: close * 1.04,
            bb_lower: close * 0.92,
            atr: Some(close * 0.02),
        }
    }

    pub fn sample_snapshot(close: f64) -> AnalysisSnapshot {
        AnalysisSnapshot::from_indicators("COINBASE:BTCUSD", sample_indicators(close))
    }
}
