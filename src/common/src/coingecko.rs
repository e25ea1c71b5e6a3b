//! CoinGecko API client for the top gainers/losers board.
//!
//! Free tier, no API key. The top 500 coins by market cap come in two
//! pages of 250, with a short pause in between to stay friendly to the
//! rate limit.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::Config;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const PAGE_SIZE: u32 = 250;
const PAGES: u32 = 2;
const PAGE_PAUSE: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum CoinGeckoError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API returned status {0}")]
    ApiError(reqwest::StatusCode),
}

/// One coin row from /coins/markets.
#[derive(Debug, Clone, Deserialize)]
pub struct CoinMarket {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub current_price: Option<f64>,
    pub market_cap_rank: Option<u32>,
    pub price_change_percentage_24h: Option<f64>,
}

/// Top gainers and losers over 24h, strongest move first.
#[derive(Debug, Clone, Default)]
pub struct MoverBoard {
    pub gainers: Vec<CoinMarket>,
    pub losers: Vec<CoinMarket>,
}

/// CoinGecko API client.
pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
}

impl CoinGeckoClient {
    /// Create a new CoinGecko client.
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: config.coingecko_api_url.clone(),
        }
    }

    /// Fetch the top 500 coins by market cap.
    pub async fn fetch_top_coins(&self) -> Result<Vec<CoinMarket>, CoinGeckoError> {
        let url = format!("{}/coins/markets", self.base_url);
        let mut all_coins = Vec::new();

        for page in 1..=PAGES {
            debug!("Fetching CoinGecko page {}/{}", page, PAGES);

            let response = self
                .client
                .get(&url)
                .timeout(REQUEST_TIMEOUT)
                .query(&[
                    ("vs_currency", "usd"),
                    ("order", "market_cap_desc"),
                    ("per_page", &PAGE_SIZE.to_string()),
                    ("page", &page.to_string()),
                    ("sparkline", "false"),
                    ("price_change_percentage", "24h"),
                ])
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(CoinGeckoError::ApiError(response.status()));
            }

            let coins: Vec<CoinMarket> = response.json().await?;
            debug!("Got {} coins from page {}", coins.len(), page);
            all_coins.extend(coins);

            if page < PAGES {
                tokio::time::sleep(PAGE_PAUSE).await;
            }
        }

        info!("Fetched {} coins from CoinGecko", all_coins.len());
        Ok(all_coins)
    }

    /// Fetch the board of top-N gainers and losers by 24h change.
    pub async fn fetch_top_movers(&self, count: usize) -> Result<MoverBoard, CoinGeckoError> {
        let coins = self.fetch_top_coins().await?;
        Ok(top_movers(coins, count))
    }
}

/// Split coins into the top-N gainers and losers by 24h change. Coins
/// without a 24h figure are ignored.
pub fn top_movers(coins: Vec<CoinMarket>, count: usize) -> MoverBoard {
    let mut ranked: Vec<CoinMarket> = coins
        .into_iter()
        .filter(|c| c.price_change_percentage_24h.is_some())
        .collect();

    ranked.sort_by(|a, b| {
        b.price_change_percentage_24h
            .partial_cmp(&a.price_change_percentage_24h)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let gainers = ranked.iter().take(count).cloned().collect();
    let losers = ranked.iter().rev().take(count).cloned().collect();

    MoverBoard { gainers, losers }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coin(id: &str, change: Option<f64>) -> CoinMarket {
        CoinMarket {
            id: id.to_string(),
            symbol: id.to_string(),
            name: id.to_string(),
            current_price: Some(1.0),
            market_cap_rank: Some(1),
            price_change_percentage_24h: change,
        }
    }

    #[test]
    fn movers_sorted_strongest_first() {
        let coins = vec![
            coin("a", Some(2.0)),
            coin("b", Some(-8.0)),
            coin("c", Some(11.0)),
            coin("d", Some(-1.0)),
            coin("e", Some(5.0)),
        ];

        let board = top_movers(coins, 2);

        let gainer_ids: Vec<&str> = board.gainers.iter().map(|c| c.id.as_str()).collect();
        let loser_ids: Vec<&str> = board.losers.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(gainer_ids, vec!["c", "e"]);
        assert_eq!(loser_ids, vec!["b", "d"]);
    }

    #[test]
    fn coins_without_change_are_skipped() {
        let coins = vec![coin("a", Some(2.0)), coin("b", None)];
        let board = top_movers(coins, 5);

        assert_eq!(board.gainers.len(), 1);
        assert_eq!(board.losers.len(), 1);
    }

    #[test]
    fn parses_market_row() {
        let raw = r#"[{
            "id": "bitcoin",
            "symbol": "btc",
            "name": "Bitcoin",
            "current_price": 60000.0,
            "market_cap_rank": 1,
            "price_change_percentage_24h": 1.25
        }]"#;

        let coins: Vec<CoinMarket> = serde_json::from_str(raw).unwrap();
        assert_eq!(coins[0].id, "bitcoin");
        assert_eq!(coins[0].price_change_percentage_24h, Some(1.25));
    }
}
