//! Named strategy templates evaluated against a snapshot.
//!
//! Each template checks its own entry conditions (EMA cross, RSI
//! extremes, band touches, momentum alignment) against the fetched
//! indicator values and reports which held and which did not, next to
//! the template's suggested entry/stop/target for comparison with the
//! main trading plan.

use serde::{Deserialize, Serialize};

use crate::levels::TradeLevels;
use crate::models::{IndicatorSet, TradeAction};

/// ADX threshold separating a tradeable trend from chop.
const ADX_TREND: f64 = 25.0;
/// A band "touch" is a close within this fraction of price.
const BAND_TOUCH_PCT: f64 = 0.01;

/// The available strategy templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Golden/death cross on EMA50 vs EMA200, filtered by ADX
    TrendFollowing,
    /// RSI extremes at the Bollinger Bands
    MeanReversion,
    /// Close beyond the outer Bollinger Bands
    Breakout,
    /// MACD crossover confirmed by the stochastic
    Momentum,
}

impl StrategyKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            StrategyKind::TrendFollowing => "Trend Following (Golden Cross)",
            StrategyKind::MeanReversion => "Mean Reversion (RSI + Bollinger Bands)",
            StrategyKind::Breakout => "Breakout Trading (Volume Confirmation)",
            StrategyKind::Momentum => "Momentum Trading (MACD + Stochastic)",
        }
    }
}

/// One checked entry condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub label: String,
    pub met: bool,
}

impl Condition {
    fn new(label: impl Into<String>, met: bool) -> Self {
        Self {
            label: label.into(),
            met,
        }
    }
}

/// Template levels next to the main plan's, for side-by-side display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyPlan {
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
}

/// Result of evaluating one template against a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyReport {
    pub kind: StrategyKind,
    pub signal: TradeAction,
    /// True only when every entry condition for the signal held.
    pub conditions_met: bool,
    pub conditions: Vec<Condition>,
    pub plan: StrategyPlan,
}

/// Evaluate a strategy template against the fetched indicators and the
/// plan levels already computed for the snapshot.
pub fn evaluate(kind: StrategyKind, ind: &IndicatorSet, levels: &TradeLevels) -> StrategyReport {
    let (signal, conditions_met, conditions) = match kind {
        StrategyKind::TrendFollowing => trend_following(ind),
        StrategyKind::MeanReversion => mean_reversion(ind),
        StrategyKind::Breakout => breakout(ind),
        StrategyKind::Momentum => momentum(ind),
    };

    let plan = plan_for(kind, signal, ind, levels);

    StrategyReport {
        kind,
        signal,
        conditions_met,
        conditions,
        plan,
    }
}

fn trend_following(ind: &IndicatorSet) -> (TradeAction, bool, Vec<Condition>) {
    let ema_cross = ind.ema50 > ind.ema200;
    let price_above = ind.close > ind.ema50;
    let trend_strong = ind.adx > ADX_TREND;

    let conditions = vec![
        Condition::new("Golden Cross: EMA50 above EMA200", ema_cross),
        Condition::new("Price above EMA50", price_above),
        Condition::new("Strong trend (ADX > 25)", trend_strong),
    ];

    if ema_cross && price_above && trend_strong {
        (TradeAction::Long, true, conditions)
    } else if !ema_cross && !price_above {
        // Death cross with price below the fast EMA; trend strength is
        // not required on the downside.
        (TradeAction::Short, false, conditions)
    } else {
        (TradeAction::Wait, false, conditions)
    }
}

fn mean_reversion(ind: &IndicatorSet) -> (TradeAction, bool, Vec<Condition>) {
    let touch = ind.close * BAND_TOUCH_PCT;
    let oversold = ind.rsi < 30.0;
    let overbought = ind.rsi > 70.0;
    let at_lower = (ind.close - ind.bb_lower).abs() < touch;
    let at_upper = (ind.close - ind.bb_upper).abs() < touch;

    let conditions = vec![
        Condition::new("RSI oversold (< 30)", oversold),
        Condition::new("Price at lower Bollinger Band", at_lower),
        Condition::new("RSI overbought (> 70)", overbought),
        Condition::new("Price at upper Bollinger Band", at_upper),
    ];

    if oversold && at_lower {
        (TradeAction::Long, true, conditions)
    } else if overbought && at_upper {
        (TradeAction::Short, true, conditions)
    } else {
        (TradeAction::Wait, false, conditions)
    }
}

fn breakout(ind: &IndicatorSet) -> (TradeAction, bool, Vec<Condition>) {
    let above = ind.close > ind.bb_upper;
    let below = ind.close < ind.bb_lower;

    let conditions = vec![
        Condition::new("Price above resistance (upper band)", above),
        Condition::new("Price below support (lower band)", below),
        Condition::new("Volume confirmation required", false),
    ];

    // A breakout signal is never "conditions met": volume confirmation
    // needs a volume average this snapshot does not carry.
    if above {
        (TradeAction::Long, false, conditions)
    } else if below {
        (TradeAction::Short, false, conditions)
    } else {
        (TradeAction::Wait, false, conditions)
    }
}

fn momentum(ind: &IndicatorSet) -> (TradeAction, bool, Vec<Condition>) {
    let macd_bullish = ind.macd > ind.macd_signal;
    let stoch_oversold = ind.stoch_k < 20.0;
    let stoch_overbought = ind.stoch_k > 80.0;

    let conditions = vec![
        Condition::new("MACD above signal line", macd_bullish),
        Condition::new("Stochastic rising from oversold (< 20)", stoch_oversold),
        Condition::new("Stochastic falling from overbought (> 80)", stoch_overbought),
    ];

    if macd_bullish && stoch_oversold {
        (TradeAction::Long, true, conditions)
    } else if !macd_bullish && stoch_overbought {
        (TradeAction::Short, true, conditions)
    } else {
        (TradeAction::Wait, false, conditions)
    }
}

/// Template levels: start from the main plan, then override where the
/// template dictates its own placement.
fn plan_for(
    kind: StrategyKind,
    signal: TradeAction,
    ind: &IndicatorSet,
    levels: &TradeLevels,
) -> StrategyPlan {
    let close = ind.close;
    let mut plan = StrategyPlan {
        entry: close,
        stop_loss: levels
            .stop_loss
            .as_ref()
            .map(|p| p.price)
            .unwrap_or(close * 0.95),
        take_profit: levels
            .targets
            .first()
            .map(|p| p.price)
            .unwrap_or(close * 1.05),
    };

    if signal == TradeAction::Long {
        match kind {
            StrategyKind::TrendFollowing if ind.ema50 > 0.0 => {
                plan.entry = ind.ema50;
                plan.stop_loss = ind.ema50 * 0.97;
            }
            StrategyKind::MeanReversion if ind.bb_lower > 0.0 => {
                plan.entry = ind.bb_lower * 1.002;
                plan.stop_loss = ind.bb_lower * 0.98;
                plan.take_profit = ind.sma20;
            }
            _ => {}
        }
    }

    plan
}
