//! TradingView scanner client for fetching technical-analysis snapshots.
//!
//! POSTs to the /{screener}/scan endpoint with a fixed column list and
//! maps the returned row into an [`IndicatorSet`]. All indicator math is
//! done server-side; this client only transports values.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::fetch::AnalysisProvider;
use crate::models::IndicatorSet;
use crate::Config;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Columns requested from the scanner, in the order they are parsed.
const COLUMNS: &[&str] = &[
    "close",
    "open",
    "high",
    "low",
    "volume",
    "change",
    "RSI",
    "MACD.macd",
    "MACD.signal",
    "ADX",
    "Stoch.K",
    "Stoch.D",
    "SMA20",
    "EMA50",
    "EMA200",
    "BB.upper",
    "BB.lower",
    "ATR",
];

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Provider returned status {0}")]
    Status(StatusCode),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("No data returned for symbol {0}")]
    UnknownSymbol(String),
}

impl ProviderError {
    /// Whether retrying this failure can help. Rate limits, server errors,
    /// network hiccups and malformed bodies are worth another attempt;
    /// client errors and unknown symbols are not.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Request(e) => !e.is_builder(),
            ProviderError::Status(status) => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            ProviderError::Parse(_) => true,
            ProviderError::UnknownSymbol(_) => false,
        }
    }
}

/// Scanner response shape: one row per requested ticker.
#[derive(Debug, Deserialize)]
struct ScanResponse {
    #[serde(default)]
    data: Vec<ScanRow>,
}

#[derive(Debug, Deserialize)]
struct ScanRow {
    /// Exchange-qualified symbol
    s: String,
    /// Values in column order; null for indicators the exchange lacks
    d: Vec<Option<f64>>,
}

/// TradingView scanner API client.
pub struct TradingViewClient {
    client: Client,
    base_url: String,
}

impl TradingViewClient {
    /// Create a new scanner client.
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: config.tradingview_api_url.clone(),
        }
    }
}

#[async_trait]
impl AnalysisProvider for TradingViewClient {
    async fn fetch_analysis(
        &self,
        symbol: &str,
        screener: &str,
        timeframe: &str,
    ) -> Result<IndicatorSet, ProviderError> {
        let url = format!("{}/{}/scan", self.base_url, screener);
        let columns = column_names(timeframe);

        debug!("Fetching scanner row for {} from {}", symbol, url);

        let body = serde_json::json!({
            "symbols": { "tickers": [symbol], "query": { "types": [] } },
            "columns": columns,
        });

        let response = self
            .client
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status));
        }

        let scan: ScanResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        let row = scan
            .data
            .into_iter()
            .find(|r| r.s == symbol)
            .ok_or_else(|| ProviderError::UnknownSymbol(symbol.to_string()))?;

        debug!("Scanner returned {} values for {}", row.d.len(), row.s);
        Ok(indicator_set_from_row(&row.d))
    }
}

/// Column names for the requested timeframe. The daily interval is the
/// scanner default and carries no suffix; every other interval does.
fn column_names(timeframe: &str) -> Vec<String> {
    COLUMNS
        .iter()
        .map(|c| {
            if timeframe == "1D" {
                (*c).to_string()
            } else {
                format!("{c}|{timeframe}")
            }
        })
        .collect()
}

/// Map a scanner row onto the indicator set. Missing cells default to 0,
/// matching the upstream library; ATR stays optional.
fn indicator_set_from_row(d: &[Option<f64>]) -> IndicatorSet {
    let get = |i: usize| d.get(i).copied().flatten().unwrap_or(0.0);

    IndicatorSet {
        close: get(0),
        open: get(1),
        high: get(2),
        low: get(3),
        volume: get(4),
        change: get(5),
        rsi: get(6),
        macd: get(7),
        macd_signal: get(8),
        adx: get(9),
        stoch_k: get(10),
        stoch_d: get(11),
        sma20: get(12),
        ema50: get(13),
        ema200: get(14),
        bb_upper: get(15),
        bb_lower: get(16),
        atr: d.get(17).copied().flatten(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daily_columns_carry_no_suffix() {
        let columns = column_names("1D");
        assert_eq!(columns[0], "close");
        assert_eq!(columns[6], "RSI");
        assert_eq!(columns.len(), COLUMNS.len());
    }

    #[test]
    fn non_daily_columns_are_suffixed() {
        let columns = column_names("4h");
        assert_eq!(columns[0], "close|4h");
        assert_eq!(columns[7], "MACD.macd|4h");
    }

    #[test]
    fn parses_scanner_row() {
        let raw = r#"{
            "totalCount": 1,
            "data": [{
                "s": "COINBASE:BTCUSD",
                "d": [60000.0, 59500.0, 60500.0, 59000.0, 12000.0, 1.5,
                      55.0, 120.0, 80.0, 28.0, 60.0, 55.0,
                      58000.0, 57000.0, 54000.0, 62000.0, 55000.0, 1200.0]
            }]
        }"#;

        let scan: ScanResponse = serde_json::from_str(raw).unwrap();
        let set = indicator_set_from_row(&scan.data[0].d);

        assert_eq!(set.close, 60_000.0);
        assert_eq!(set.change, 1.5);
        assert_eq!(set.rsi, 55.0);
        assert_eq!(set.bb_upper, 62_000.0);
        assert_eq!(set.atr, Some(1_200.0));
    }

    #[test]
    fn missing_cells_default_to_zero() {
        let d = vec![Some(60_000.0), None, Some(60_500.0)];
        let set = indicator_set_from_row(&d);

        assert_eq!(set.close, 60_000.0);
        assert_eq!(set.open, 0.0);
        assert_eq!(set.rsi, 0.0);
        assert_eq!(set.atr, None);
    }

    #[test]
    fn transient_and_permanent_classification() {
        assert!(ProviderError::Status(StatusCode::TOO_MANY_REQUESTS).is_transient());
        assert!(ProviderError::Status(StatusCode::BAD_GATEWAY).is_transient());
        assert!(!ProviderError::Status(StatusCode::UNAUTHORIZED).is_transient());
        assert!(!ProviderError::Status(StatusCode::NOT_FOUND).is_transient());
        assert!(ProviderError::Parse("truncated body".to_string()).is_transient());
        assert!(!ProviderError::UnknownSymbol("COINBASE:NOPE".to_string()).is_transient());
    }
}
