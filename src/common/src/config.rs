//! Configuration loading from environment variables.

use std::env;
use std::path::PathBuf;

use thiserror::Error;

use crate::cooldown;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: String, value: String },
}

/// Application configuration loaded from environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the persisted cooldown record
    pub state_file: PathBuf,

    /// Cooldown window in seconds (60 or 120)
    pub cooldown_secs: u64,

    /// TradingView scanner base URL
    pub tradingview_api_url: String,

    /// CoinGecko API base URL
    pub coingecko_api_url: String,

    /// Symbol to analyze, exchange-qualified
    pub symbol: String,

    /// TradingView screener type
    pub screener: String,

    /// Analysis timeframe
    pub timeframe: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// All variables are optional and fall back to defaults:
    /// - STATE_FILE: cooldown record path (default: .rate_limit_state.json)
    /// - COOLDOWN_SECS: cooldown window, must be 60 or 120 (default: 60)
    /// - TRADINGVIEW_API_URL: scanner base URL
    /// - COINGECKO_API_URL: CoinGecko base URL
    /// - SYMBOL: exchange-qualified symbol (default: COINBASE:BTCUSD)
    /// - SCREENER: screener type (default: crypto)
    /// - TIMEFRAME: analysis interval (default: 1D)
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present
        dotenvy::dotenv().ok();
        Self::from_env_only()
    }

    /// Load configuration from environment variables only (no .env file).
    /// Useful for testing.
    pub fn from_env_only() -> Result<Self, ConfigError> {
        let state_file = env::var("STATE_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".rate_limit_state.json"));

        let cooldown_raw =
            env::var("COOLDOWN_SECS").unwrap_or_else(|_| "60".to_string());
        let cooldown_secs: u64 = cooldown_raw.parse().map_err(|_| {
            ConfigError::InvalidValue {
                var: "COOLDOWN_SECS".to_string(),
                value: cooldown_raw.clone(),
            }
        })?;
        if !cooldown::ALLOWED_WINDOWS.contains(&cooldown_secs) {
            return Err(ConfigError::InvalidValue {
                var: "COOLDOWN_SECS".to_string(),
                value: cooldown_raw,
            });
        }

        let tradingview_api_url = env::var("TRADINGVIEW_API_URL")
            .unwrap_or_else(|_| "https://scanner.tradingview.com".to_string());

        let coingecko_api_url = env::var("COINGECKO_API_URL")
            .unwrap_or_else(|_| "https://api.coingecko.com/api/v3".to_string());

        let symbol =
            env::var("SYMBOL").unwrap_or_else(|_| "COINBASE:BTCUSD".to_string());

        let screener = env::var("SCREENER").unwrap_or_else(|_| "crypto".to_string());

        let timeframe = env::var("TIMEFRAME").unwrap_or_else(|_| "1D".to_string());

        Ok(Self {
            state_file,
            cooldown_secs,
            tradingview_api_url,
            coingecko_api_url,
            symbol,
            screener,
            timeframe,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_vars() {
        for var in [
            "STATE_FILE",
            "COOLDOWN_SECS",
            "TRADINGVIEW_API_URL",
            "COINGECKO_API_URL",
            "SYMBOL",
            "SCREENER",
            "TIMEFRAME",
        ] {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_config_with_defaults() {
        clear_vars();

        let config = Config::from_env_only().unwrap();

        assert_eq!(config.state_file, PathBuf::from(".rate_limit_state.json"));
        assert_eq!(config.cooldown_secs, 60);
        assert_eq!(config.tradingview_api_url, "https://scanner.tradingview.com");
        assert_eq!(config.coingecko_api_url, "https://api.coingecko.com/api/v3");
        assert_eq!(config.symbol, "COINBASE:BTCUSD");
        assert_eq!(config.screener, "crypto");
        assert_eq!(config.timeframe, "1D");
    }

    #[test]
    #[serial]
    fn test_config_accepts_long_window() {
        clear_vars();
        env::set_var("COOLDOWN_SECS", "120");

        let config = Config::from_env_only().unwrap();
        assert_eq!(config.cooldown_secs, 120);

        env::remove_var("COOLDOWN_SECS");
    }

    #[test]
    #[serial]
    fn test_config_rejects_unsupported_window() {
        clear_vars();
        env::set_var("COOLDOWN_SECS", "90");

        let result = Config::from_env_only();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref var, .. }) if var == "COOLDOWN_SECS"
        ));

        env::remove_var("COOLDOWN_SECS");
    }

    #[test]
    #[serial]
    fn test_config_rejects_non_numeric_window() {
        clear_vars();
        env::set_var("COOLDOWN_SECS", "fast");

        assert!(Config::from_env_only().is_err());

        env::remove_var("COOLDOWN_SECS");
    }
}
