//! Entry/exit level planning from indicator values.
//!
//! Derives support/resistance lists, a directional bias score, and an
//! entry, stop-loss and take-profit plan for the daily timeframe.

use serde::{Deserialize, Serialize};

use crate::models::{IndicatorSet, MarketBias};

/// Entry is only delayed for a level within this distance (percent).
const NEAR_LEVEL_PCT: f64 = 2.0;
/// Beyond this distance a level is not worth waiting for at all.
const FAR_LEVEL_PCT: f64 = 5.0;

/// A named support or resistance price level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub name: String,
    pub price: f64,
}

impl Level {
    fn new(name: &str, price: f64) -> Self {
        Self {
            name: name.to_string(),
            price,
        }
    }
}

/// A price with a short human-readable placement note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub price: f64,
    pub description: String,
}

impl PricePoint {
    fn new(price: f64, description: impl Into<String>) -> Self {
        Self {
            price,
            description: description.into(),
        }
    }
}

/// Trading plan for one snapshot. Entry/stop/targets are only present
/// when the bias is directional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeLevels {
    pub current_price: f64,
    pub bias: MarketBias,
    /// Nearest-first support levels below price
    pub support: Vec<Level>,
    /// Nearest-first resistance levels above price
    pub resistance: Vec<Level>,
    pub entry: Option<PricePoint>,
    pub stop_loss: Option<PricePoint>,
    /// Target 1 first, then target 2 when one exists
    pub targets: Vec<PricePoint>,
}

/// Compute the trading plan for the given indicator values and
/// Bollinger rating.
pub fn compute_levels(ind: &IndicatorSet, rating: i8) -> TradeLevels {
    let close = ind.close;

    let mut support = Vec::new();
    if ind.bb_lower > 0.0 {
        support.push(Level::new("Bollinger Lower Band", ind.bb_lower));
    }
    if ind.sma20 > 0.0 && ind.sma20 < close {
        support.push(Level::new("SMA20", ind.sma20));
    }
    if ind.ema50 > 0.0 && ind.ema50 < close {
        support.push(Level::new("EMA50", ind.ema50));
    }
    if ind.ema200 > 0.0 && ind.ema200 < close {
        support.push(Level::new("EMA200", ind.ema200));
    }

    let mut resistance = Vec::new();
    if ind.bb_upper > 0.0 {
        resistance.push(Level::new("Bollinger Upper Band", ind.bb_upper));
    }
    if ind.sma20 > 0.0 && ind.sma20 > close {
        resistance.push(Level::new("SMA20", ind.sma20));
    }
    if ind.ema50 > 0.0 && ind.ema50 > close {
        resistance.push(Level::new("EMA50", ind.ema50));
    }

    // Nearest level first on both sides.
    support.sort_by(|a, b| {
        (close - a.price)
            .partial_cmp(&(close - b.price))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    resistance.sort_by(|a, b| {
        (a.price - close)
            .partial_cmp(&(b.price - close))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let bias = score_bias(ind, rating);

    let mut levels = TradeLevels {
        current_price: close,
        bias,
        support,
        resistance,
        entry: None,
        stop_loss: None,
        targets: Vec::new(),
    };

    match bias {
        MarketBias::Bullish => plan_long(ind, &mut levels),
        MarketBias::Bearish => plan_short(ind, &mut levels),
        MarketBias::Neutral => {}
    }

    validate(&mut levels);
    levels
}

/// Score directional bias from the Bollinger rating, RSI zone, and the
/// EMA50/EMA200 stack.
fn score_bias(ind: &IndicatorSet, rating: i8) -> MarketBias {
    let mut bullish = 0u8;
    let mut bearish = 0u8;

    match rating {
        r if r >= 2 => bullish += 2,
        r if r <= -2 => bearish += 2,
        r if r > 0 => bullish += 1,
        r if r < 0 => bearish += 1,
        _ => {}
    }

    if ind.rsi < 30.0 {
        bullish += 2;
    } else if ind.rsi < 40.0 {
        bullish += 1;
    } else if ind.rsi > 70.0 {
        bearish += 2;
    } else if ind.rsi > 60.0 {
        bearish += 1;
    }

    if ind.close > ind.ema50 && ind.close > ind.ema200 {
        bullish += 2;
    } else if ind.close > ind.ema50 {
        bullish += 1;
    } else if ind.close < ind.ema50 && ind.close < ind.ema200 {
        bearish += 2;
    } else if ind.close < ind.ema50 {
        bearish += 1;
    }

    if bullish > bearish {
        MarketBias::Bullish
    } else if bearish > bullish {
        MarketBias::Bearish
    } else {
        MarketBias::Neutral
    }
}

fn plan_long(ind: &IndicatorSet, levels: &mut TradeLevels) {
    let close = ind.close;

    // Best support below price: SMA20 preferred, then the nearest listed
    // support, then the lower Bollinger band.
    let best_support = if ind.sma20 > 0.0 && ind.sma20 < close {
        Some(Level::new("SMA20", ind.sma20))
    } else if let Some(first) = levels.support.first().filter(|l| l.price < close) {
        Some(first.clone())
    } else if ind.bb_lower > 0.0 && ind.bb_lower < close {
        Some(Level::new("Bollinger Lower Band", ind.bb_lower))
    } else {
        None
    };

    let entry = match &best_support {
        Some(sup) => {
            let distance_pct = (close / sup.price - 1.0) * 100.0;
            if distance_pct <= NEAR_LEVEL_PCT {
                // Support is close enough to wait for; enter just above it.
                PricePoint::new(
                    sup.price * 1.002,
                    format!("Enter near {} (only {:.1}% away)", sup.name, distance_pct),
                )
            } else if distance_pct <= FAR_LEVEL_PCT {
                PricePoint::new(
                    close,
                    format!(
                        "Enter at current price (or wait for dip to {} at -{:.1}%)",
                        sup.name, distance_pct
                    ),
                )
            } else {
                PricePoint::new(close, "Enter long at current price - don't wait for big dip")
            }
        }
        None => PricePoint::new(close, "Enter long at current price"),
    };

    let stop = match levels.support.first() {
        Some(nearest) => PricePoint::new(nearest.price * 0.97, format!("Below {}", nearest.name)),
        None => PricePoint::new(entry.price * 0.95, "5% below entry level"),
    };

    let mut targets = Vec::new();
    if let Some(first_res) = levels.resistance.first() {
        let mut t1 = first_res.price * 0.99;
        // Target 1 must be meaningfully above entry.
        if t1 < entry.price * 1.03 {
            t1 = entry.price * 1.05;
            targets.push(PricePoint::new(t1, "5% above entry (resistance too close)"));
        } else {
            targets.push(PricePoint::new(t1, format!("Near {}", first_res.name)));
        }

        if let Some(second_res) = levels.resistance.get(1) {
            targets.push(PricePoint::new(
                second_res.price * 0.99,
                format!("Near {}", second_res.name),
            ));
        } else {
            targets.push(PricePoint::new(entry.price * 1.10, "10% above entry"));
        }
    } else {
        targets.push(PricePoint::new(entry.price * 1.06, "6% above entry level"));
        targets.push(PricePoint::new(entry.price * 1.12, "12% above entry level"));
    }

    levels.entry = Some(entry);
    levels.stop_loss = Some(stop);
    levels.targets = targets;
}

fn plan_short(ind: &IndicatorSet, levels: &mut TradeLevels) {
    let close = ind.close;

    let best_resistance = if ind.sma20 > 0.0 && ind.sma20 > close {
        Some(Level::new("SMA20", ind.sma20))
    } else if let Some(first) = levels.resistance.first().filter(|l| l.price > close) {
        Some(first.clone())
    } else if ind.bb_upper > 0.0 && ind.bb_upper > close {
        Some(Level::new("Bollinger Upper Band", ind.bb_upper))
    } else {
        None
    };

    let entry = match &best_resistance {
        Some(res) => {
            let distance_pct = (res.price / close - 1.0) * 100.0;
            if distance_pct <= NEAR_LEVEL_PCT {
                // Resistance close enough to wait for; enter just below it.
                PricePoint::new(
                    res.price * 0.998,
                    format!("Enter near {} (only {:.1}% away)", res.name, distance_pct),
                )
            } else if distance_pct <= FAR_LEVEL_PCT {
                PricePoint::new(
                    close,
                    format!(
                        "Enter at current price (or wait for bounce to {} at +{:.1}%)",
                        res.name, distance_pct
                    ),
                )
            } else {
                PricePoint::new(close, "Enter short at current price - don't wait for rally")
            }
        }
        None => PricePoint::new(close, "Enter short at current price"),
    };

    let stop = match levels.resistance.first() {
        Some(nearest) => PricePoint::new(nearest.price * 1.03, format!("Above {}", nearest.name)),
        None => PricePoint::new(entry.price * 1.05, "5% above entry level"),
    };

    let mut targets = Vec::new();
    if let Some(first_sup) = levels.support.first() {
        let mut t1 = first_sup.price * 1.01;
        // Target 1 must be meaningfully below entry.
        if t1 > entry.price * 0.97 {
            t1 = entry.price * 0.95;
            targets.push(PricePoint::new(t1, "5% below entry (support too close)"));
        } else {
            targets.push(PricePoint::new(t1, format!("Near {}", first_sup.name)));
        }

        if let Some(second_sup) = levels.support.get(1) {
            targets.push(PricePoint::new(
                second_sup.price * 1.01,
                format!("Near {}", second_sup.name),
            ));
        } else {
            targets.push(PricePoint::new(entry.price * 0.90, "10% below entry"));
        }
    } else {
        targets.push(PricePoint::new(entry.price * 0.94, "6% below entry level"));
        targets.push(PricePoint::new(entry.price * 0.88, "12% below entry level"));
    }

    levels.entry = Some(entry);
    levels.stop_loss = Some(stop);
    levels.targets = targets;
}

/// Sanity clamps: a long's first target must sit above entry and entry at
/// or below price (within 1% tolerance); mirrored for shorts.
fn validate(levels: &mut TradeLevels) {
    let close = levels.current_price;

    match levels.bias {
        MarketBias::Bullish => {
            if let (Some(entry), Some(t1)) = (levels.entry.clone(), levels.targets.first_mut()) {
                if t1.price <= entry.price {
                    t1.price = entry.price * 1.06;
                    t1.description = "6% above entry (auto-corrected)".to_string();
                }
            }
            if let Some(entry) = levels.entry.as_mut() {
                if entry.price > close * 1.01 {
                    entry.price = close * 0.99;
                    entry.description =
                        "Enter at current price or slight pullback (auto-corrected)".to_string();
                }
            }
        }
        MarketBias::Bearish => {
            if let (Some(entry), Some(t1)) = (levels.entry.clone(), levels.targets.first_mut()) {
                if t1.price >= entry.price {
                    t1.price = entry.price * 0.94;
                    t1.description = "6% below entry (auto-corrected)".to_string();
                }
            }
            if let Some(entry) = levels.entry.as_mut() {
                if entry.price < close * 0.99 {
                    entry.price = close * 1.01;
                    entry.description =
                        "Enter at current price or slight bounce (auto-corrected)".to_string();
                }
            }
        }
        MarketBias::Neutral => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::sample_indicators;
    use crate::signals::bollinger_rating;

    fn bullish_indicators() -> IndicatorSet {
        // Price above both EMAs, RSI recovering from oversold territory.
        let mut ind = sample_indicators(100_000.0);
        ind.rsi = 35.0;
        ind
    }

    fn bearish_indicators() -> IndicatorSet {
        let mut ind = sample_indicators(100_000.0);
        ind.rsi = 75.0;
        ind.ema50 = 105_000.0;
        ind.ema200 = 110_000.0;
        ind.sma20 = 103_000.0;
        ind.bb_upper = 106_000.0;
        ind.bb_lower = 98_000.0;
        ind
    }

    #[test]
    fn support_and_resistance_sorted_nearest_first() {
        let ind = bullish_indicators();
        let levels = compute_levels(&ind, bollinger_rating(&ind));

        for pair in levels.support.windows(2) {
            assert!(pair[0].price >= pair[1].price, "support not nearest-first");
        }
        for pair in levels.resistance.windows(2) {
            assert!(
                pair[0].price <= pair[1].price,
                "resistance not nearest-first"
            );
        }
        for level in &levels.support {
            assert!(level.price < ind.close);
        }
    }

    #[test]
    fn bullish_plan_orders_stop_entry_target() {
        let ind = bullish_indicators();
        let levels = compute_levels(&ind, bollinger_rating(&ind));

        assert_eq!(levels.bias, MarketBias::Bullish);
        let entry = levels.entry.as_ref().unwrap();
        let stop = levels.stop_loss.as_ref().unwrap();
        let t1 = &levels.targets[0];

        assert!(stop.price < entry.price, "stop must sit below entry");
        assert!(t1.price > entry.price, "target must sit above entry");
        assert!(entry.price <= ind.close * 1.01, "entry within tolerance of price");
    }

    #[test]
    fn bearish_plan_orders_target_entry_stop() {
        let ind = bearish_indicators();
        let levels = compute_levels(&ind, bollinger_rating(&ind));

        assert_eq!(levels.bias, MarketBias::Bearish);
        let entry = levels.entry.as_ref().unwrap();
        let stop = levels.stop_loss.as_ref().unwrap();
        let t1 = &levels.targets[0];

        assert!(stop.price > entry.price, "stop must sit above entry");
        assert!(t1.price < entry.price, "target must sit below entry");
        assert!(entry.price >= ind.close * 0.99, "entry within tolerance of price");
    }

    #[test]
    fn neutral_market_has_no_plan() {
        // Flat everything: rating 0, RSI mid-zone, price pinned to EMAs.
        let mut ind = sample_indicators(100.0);
        ind.rsi = 50.0;
        ind.ema50 = 100.0;
        ind.ema200 = 100.0;
        ind.sma20 = 100.0;
        ind.bb_upper = 105.0;
        ind.bb_lower = 95.0;

        let levels = compute_levels(&ind, 0);
        assert_eq!(levels.bias, MarketBias::Neutral);
        assert!(levels.entry.is_none());
        assert!(levels.stop_loss.is_none());
        assert!(levels.targets.is_empty());
    }

    #[test]
    fn near_support_moves_entry_to_level() {
        let mut ind = bullish_indicators();
        // SMA20 within 2% of price.
        ind.sma20 = 99_000.0;

        let levels = compute_levels(&ind, bollinger_rating(&ind));
        let entry = levels.entry.as_ref().unwrap();
        assert!((entry.price - 99_000.0 * 1.002).abs() < 1e-6);
        assert!(entry.description.contains("SMA20"));
    }

    #[test]
    fn target_clamped_when_resistance_hugs_entry() {
        let mut ind = bullish_indicators();
        // Resistance barely above price: raw target would undercut the
        // 3% minimum and must be pushed to 5% above entry.
        ind.bb_upper = 100_500.0;
        ind.sma20 = 97_000.0;

        let levels = compute_levels(&ind, bollinger_rating(&ind));
        let entry = levels.entry.as_ref().unwrap();
        let t1 = &levels.targets[0];
        assert!(t1.price >= entry.price * 1.03);
    }

    #[test]
    fn two_targets_are_always_planned_for_directional_bias() {
        let ind = bullish_indicators();
        let levels = compute_levels(&ind, bollinger_rating(&ind));
        assert_eq!(levels.targets.len(), 2);
    }
}
