//! Signal derivation from raw indicator values.
//!
//! No indicator math happens here; the provider computes RSI, MACD,
//! Bollinger Bands and friends. This module only scores the values it
//! is handed: a Bollinger position rating, a four-signal tally, and an
//! overall recommendation.

use crate::models::{IndicatorSet, Recommendation, TradeAction};

/// RSI thresholds for oversold/overbought.
const RSI_OVERSOLD: f64 = 30.0;
const RSI_OVERBOUGHT: f64 = 70.0;

/// Outcome of scoring the four directional signals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalTally {
    pub bullish: u8,
    pub bearish: u8,
    pub details: Vec<String>,
}

/// Rate the close position against the Bollinger Bands, -3..=3.
///
/// +3 above the upper band, +2 in the upper half between midline and
/// upper band, +1 above the midline, 0 at the midline, mirrored on the
/// downside. Returns 0 when the band values are degenerate.
pub fn bollinger_rating(ind: &IndicatorSet) -> i8 {
    let (close, upper, lower, mid) = (ind.close, ind.bb_upper, ind.bb_lower, ind.sma20);
    if upper <= 0.0 || lower <= 0.0 || mid <= 0.0 || upper <= lower {
        return 0;
    }

    if close > upper {
        3
    } else if close < lower {
        -3
    } else if close > mid {
        if close > (mid + upper) / 2.0 {
            2
        } else {
            1
        }
    } else if close < mid {
        if close < (mid + lower) / 2.0 {
            -2
        } else {
            -1
        }
    } else {
        0
    }
}

/// Bollinger band width relative to the midline (SMA20).
pub fn band_width(ind: &IndicatorSet) -> f64 {
    if ind.sma20 <= 0.0 {
        return 0.0;
    }
    (ind.bb_upper - ind.bb_lower) / ind.sma20
}

/// Score the four directional signals: Bollinger rating, RSI extremes,
/// MACD vs its signal line, and close vs EMA50.
pub fn tally_signals(ind: &IndicatorSet, rating: i8) -> SignalTally {
    let mut bullish = 0;
    let mut bearish = 0;
    let mut details = Vec::new();

    if rating >= 2 {
        bullish += 1;
        details.push("Strong Bollinger Band buy signal".to_string());
    } else if rating <= -2 {
        bearish += 1;
        details.push("Strong Bollinger Band sell signal".to_string());
    }

    if ind.rsi < RSI_OVERSOLD {
        bullish += 1;
        details.push("RSI oversold - potential bounce".to_string());
    } else if ind.rsi > RSI_OVERBOUGHT {
        bearish += 1;
        details.push("RSI overbought - potential correction".to_string());
    }

    if ind.macd - ind.macd_signal > 0.0 {
        bullish += 1;
        details.push("MACD bullish crossover".to_string());
    } else {
        bearish += 1;
        details.push("MACD bearish crossover".to_string());
    }

    if ind.close > ind.ema50 {
        bullish += 1;
        details.push("Price above EMA50 (bullish)".to_string());
    } else {
        bearish += 1;
        details.push("Price below EMA50 (bearish)".to_string());
    }

    SignalTally {
        bullish,
        bearish,
        details,
    }
}

/// Map the signal tally onto a recommendation and position type.
pub fn recommend(bullish: u8, bearish: u8) -> (Recommendation, TradeAction) {
    if bullish > bearish + 1 {
        (Recommendation::StrongBuy, TradeAction::Long)
    } else if bullish > bearish {
        (Recommendation::Buy, TradeAction::Long)
    } else if bearish > bullish + 1 {
        (Recommendation::StrongSell, TradeAction::Short)
    } else if bearish > bullish {
        (Recommendation::Sell, TradeAction::Short)
    } else {
        (Recommendation::Neutral, TradeAction::Wait)
    }
}
