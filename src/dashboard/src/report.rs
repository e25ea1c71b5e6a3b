//! Plain-text rendering of analysis snapshots and the movers board.

use common::{AnalysisSnapshot, CacheEntry, MarketBias, MoverBoard, StrategyReport};

const RULE: &str = "----------------------------------------------------------------------";

/// Print a full analysis report for one snapshot.
pub fn print_snapshot(snapshot: &AnalysisSnapshot) {
    let ind = &snapshot.indicators;

    println!("\n  {} DAILY ANALYSIS", snapshot.symbol);
    println!("{RULE}");

    println!("PRICE DATA");
    println!("  Current Price:     ${:>12.2}", ind.close);
    println!("  Open:              ${:>12.2}", ind.open);
    println!("  High:              ${:>12.2}", ind.high);
    println!("  Low:               ${:>12.2}", ind.low);
    println!("  24h Change:        {:>+.2}%", ind.change);
    println!("  Volume:            {:.0}", ind.volume);

    println!("\nBOLLINGER BANDS");
    println!("  Rating:            {}/3", snapshot.rating);
    println!("  Band Width:        {:.4}", snapshot.bbw);
    println!("  Upper Band:        ${:>12.2}", ind.bb_upper);
    println!("  Middle (SMA20):    ${:>12.2}", ind.sma20);
    println!("  Lower Band:        ${:>12.2}", ind.bb_lower);
    println!("  Position:          {}", band_position(ind.close, ind.bb_upper, ind.bb_lower));
    println!("  Volatility:        {}", volatility_label(snapshot.bbw));

    println!("\nTECHNICAL INDICATORS");
    println!("  RSI(14):           {:.2}  ({})", ind.rsi, rsi_label(ind.rsi));
    println!("  MACD:              {:.2} / signal {:.2}", ind.macd, ind.macd_signal);
    println!("  ADX:               {:.2}  ({})", ind.adx, adx_label(ind.adx));
    println!("  Stochastic K/D:    {:.2} / {:.2}", ind.stoch_k, ind.stoch_d);
    println!("  EMA50:             ${:>12.2}", ind.ema50);
    println!("  EMA200:            ${:>12.2}", ind.ema200);

    println!("\nTRADING SIGNALS");
    println!(
        "  Bullish {}/4, bearish {}/4",
        snapshot.bullish_signals, snapshot.bearish_signals
    );
    for detail in &snapshot.signal_details {
        println!("  - {detail}");
    }
    if snapshot.bbw < 0.03 {
        println!("  Bollinger squeeze detected - prepare for breakout");
    }
    println!("  Recommendation:    {}", snapshot.recommendation);
    println!("  Action:            {}", snapshot.action);

    print_plan(snapshot);
    println!("{RULE}");
}

fn print_plan(snapshot: &AnalysisSnapshot) {
    let levels = &snapshot.levels;

    println!("\nTRADING PLAN ({})", levels.bias);
    if levels.bias == MarketBias::Neutral {
        println!("  No clear setup - conflicting signals, stay on the sidelines.");
        println!("  Wait for 3+ signals to align in one direction.");
        return;
    }

    if let Some(entry) = &levels.entry {
        println!(
            "  Entry:             ${:>12.2}  {}",
            entry.price, entry.description
        );
    }
    if let Some(stop) = &levels.stop_loss {
        println!(
            "  Stop Loss:         ${:>12.2}  {}",
            stop.price, stop.description
        );
    }
    for (i, target) in levels.targets.iter().enumerate() {
        println!(
            "  Target {}:          ${:>12.2}  {}",
            i + 1,
            target.price,
            target.description
        );
    }

    if !levels.support.is_empty() {
        println!("  Support:");
        for (i, level) in levels.support.iter().take(3).enumerate() {
            let distance = (level.price / levels.current_price - 1.0) * 100.0;
            println!(
                "    S{}: ${:>12.2} ({:+.2}%) - {}",
                i + 1,
                level.price,
                distance,
                level.name
            );
        }
    }
    if !levels.resistance.is_empty() {
        println!("  Resistance:");
        for (i, level) in levels.resistance.iter().take(3).enumerate() {
            let distance = (level.price / levels.current_price - 1.0) * 100.0;
            println!(
                "    R{}: ${:>12.2} ({:+.2}%) - {}",
                i + 1,
                level.price,
                distance,
                level.name
            );
        }
    }
}

/// Print a strategy template evaluation next to the snapshot's own plan.
pub fn print_strategy(report: &StrategyReport, snapshot: &AnalysisSnapshot) {
    println!("\nSTRATEGY TEMPLATE: {}", report.kind.display_name());
    println!("  Signal:            {}", report.signal);
    println!(
        "  Conditions met:    {}",
        if report.conditions_met { "YES" } else { "NO" }
    );
    for condition in &report.conditions {
        let mark = if condition.met { "[x]" } else { "[ ]" };
        println!("    {mark} {}", condition.label);
    }

    println!("  Template levels:");
    println!("    Entry:           ${:>12.2}", report.plan.entry);
    println!("    Stop Loss:       ${:>12.2}", report.plan.stop_loss);
    println!("    Take Profit:     ${:>12.2}", report.plan.take_profit);

    let levels = &snapshot.levels;
    if let (Some(entry), Some(stop)) = (&levels.entry, &levels.stop_loss) {
        println!("  Your plan:");
        println!("    Entry:           ${:>12.2}", entry.price);
        println!("    Stop Loss:       ${:>12.2}", stop.price);
        if let Some(t1) = levels.targets.first() {
            println!("    Take Profit:     ${:>12.2}", t1.price);
        }
    }
}

/// Print a cached snapshot with its fetch time.
pub fn print_cached(entry: &CacheEntry) {
    let when = chrono::DateTime::from_timestamp(entry.fetched_at as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| format!("{}", entry.fetched_at));

    println!("Showing cached analysis from {when}:");
    print_snapshot(&entry.snapshot);
}

/// Print the gainers/losers board.
pub fn print_movers(board: &MoverBoard) {
    println!("\nTOP GAINERS (24h)");
    println!("{RULE}");
    for coin in &board.gainers {
        print_mover(coin);
    }

    println!("\nTOP LOSERS (24h)");
    println!("{RULE}");
    for coin in &board.losers {
        print_mover(coin);
    }
}

fn print_mover(coin: &common::CoinMarket) {
    println!(
        "  #{:<4} {:<8} {:<24} ${:<14} {:+.2}%",
        coin.market_cap_rank.unwrap_or(0),
        coin.symbol.to_uppercase(),
        coin.name,
        coin.current_price.unwrap_or(0.0),
        coin.price_change_percentage_24h.unwrap_or(0.0)
    );
}

fn band_position(close: f64, upper: f64, lower: f64) -> &'static str {
    if close > upper {
        "ABOVE UPPER BAND (overbought)"
    } else if close < lower {
        "BELOW LOWER BAND (oversold)"
    } else {
        "WITHIN BANDS"
    }
}

fn volatility_label(bbw: f64) -> &'static str {
    if bbw < 0.02 {
        "VERY LOW - strong squeeze, major move coming"
    } else if bbw < 0.04 {
        "LOW - consolidation phase"
    } else if bbw < 0.06 {
        "MEDIUM - normal daily volatility"
    } else {
        "HIGH - elevated volatility, wide moves expected"
    }
}

fn rsi_label(rsi: f64) -> &'static str {
    if rsi > 70.0 {
        "overbought"
    } else if rsi < 30.0 {
        "oversold"
    } else if rsi > 50.0 {
        "bullish momentum"
    } else {
        "bearish momentum"
    }
}

fn adx_label(adx: f64) -> &'static str {
    if adx > 25.0 {
        "strong trend"
    } else if adx > 20.0 {
        "moderate trend"
    } else {
        "weak trend / ranging"
    }
}
