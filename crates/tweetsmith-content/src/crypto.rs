//! Crypto "next week" predictions built from CoinGecko trending data, with a
//! manual coin list when the market API is unavailable.

use std::collections::HashMap;
use std::time::Duration;

use rand::seq::IndexedRandom;
use rand::Rng;
use reqwest::Client;
use serde::Deserialize;

use crate::error::ContentError;
use crate::retry::{retry_with_backoff, RetryPolicy};

const DEFAULT_BASE_URL: &str = "https://api.coingecko.com";

/// Only the head of the trending list is considered.
const TRENDING_TOP: usize = 7;

/// Predictions longer than this switch to the compact template.
const COMPACT_THRESHOLD: usize = 270;

const MARKET_REASONS: &[&str] = &[
    "strong technical breakout pattern forming",
    "increased whale accumulation detected",
    "major partnership announcements expected",
    "ecosystem development accelerating",
    "regulatory clarity improving sentiment",
    "institutional adoption growing",
    "network upgrade coming soon",
    "DeFi integration expanding",
    "NFT marketplace integration planned",
    "cross-chain compatibility improving",
];

const MANUAL_REASONS: &[&str] = &[
    "technical analysis shows bullish patterns",
    "whale accumulation increasing",
    "ecosystem growth accelerating",
    "partnership rumors circulating",
    "network upgrades approaching",
    "institutional interest growing",
    "DeFi adoption expanding",
    "market sentiment turning positive",
    "key resistance levels breaking",
    "trading volume surging",
];

/// `(symbol, name, emoji)` for the manual prediction list.
const MANUAL_COINS: &[(&str, &str, &str)] = &[
    ("BTC", "Bitcoin", "₿"),
    ("ETH", "Ethereum", "⟐"),
    ("BNB", "Binance Coin", "🟡"),
    ("XRP", "Ripple", "💧"),
    ("ADA", "Cardano", "🔷"),
    ("DOGE", "Dogecoin", "🐕"),
    ("MATIC", "Polygon", "🟣"),
    ("SOL", "Solana", "☀️"),
    ("DOT", "Polkadot", "⭕"),
    ("SHIB", "Shiba Inu", "🚀"),
    ("AVAX", "Avalanche", "🏔️"),
    ("LINK", "Chainlink", "🔗"),
    ("UNI", "Uniswap", "🦄"),
    ("LTC", "Litecoin", "🥈"),
    ("ATOM", "Cosmos", "⚛️"),
];

#[derive(Debug, Deserialize)]
struct TrendingResponse {
    #[serde(default)]
    coins: Vec<TrendingEntry>,
}

#[derive(Debug, Deserialize)]
struct TrendingEntry {
    item: TrendingCoin,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrendingCoin {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoinDetails {
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub market_data: Option<MarketData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarketData {
    #[serde(default)]
    pub current_price: HashMap<String, f64>,
}

impl CoinDetails {
    #[must_use]
    pub fn usd_price(&self) -> Option<f64> {
        self.market_data
            .as_ref()
            .and_then(|m| m.current_price.get("usd"))
            .copied()
    }
}

/// Client for the public CoinGecko v3 API.
pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl CoinGeckoClient {
    /// Creates a client pointed at the public CoinGecko API.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64, retry: RetryPolicy) -> Result<Self, ContentError> {
        Self::with_base_url(timeout_secs, retry, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn with_base_url(
        timeout_secs: u64,
        retry: RetryPolicy,
        base_url: &str,
    ) -> Result<Self, ContentError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("tweetsmith/0.1")
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            retry,
        })
    }

    /// Currently trending coins, in CoinGecko's order.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError`] on network failure or an unexpected body.
    pub async fn trending(&self) -> Result<Vec<TrendingCoin>, ContentError> {
        let url = format!("{}/api/v3/search/trending", self.base_url);
        let body = retry_with_backoff(self.retry, "coingecko trending", || self.get_text(&url))
            .await?;
        let parsed: TrendingResponse =
            serde_json::from_str(&body).map_err(|e| ContentError::Deserialize {
                context: "search/trending".to_string(),
                source: e,
            })?;
        Ok(parsed.coins.into_iter().map(|c| c.item).collect())
    }

    /// Name, symbol and market data for one coin.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError`] on network failure or an unexpected body.
    pub async fn coin_details(&self, coin_id: &str) -> Result<CoinDetails, ContentError> {
        let url = format!("{}/api/v3/coins/{coin_id}", self.base_url);
        let body =
            retry_with_backoff(self.retry, "coingecko coin", || self.get_text(&url)).await?;
        serde_json::from_str(&body).map_err(|e| ContentError::Deserialize {
            context: format!("coins/{coin_id}"),
            source: e,
        })
    }

    async fn get_text(&self, url: &str) -> Result<String, ContentError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

/// Produces prediction posts from live market data or the manual coin list.
pub struct CryptoPredictor {
    market: CoinGeckoClient,
}

impl CryptoPredictor {
    #[must_use]
    pub fn new(market: CoinGeckoClient) -> Self {
        Self { market }
    }

    /// A prediction for a randomly chosen top-trending coin.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError`] if the trending list is empty or either
    /// market call fails.
    pub async fn market_prediction(&self) -> Result<String, ContentError> {
        let trending = self.market.trending().await?;
        let picked = {
            let head = &trending[..trending.len().min(TRENDING_TOP)];
            head.choose(&mut rand::rng()).cloned()
        };
        let coin = picked.ok_or_else(|| ContentError::EmptyResponse("coingecko trending".to_string()))?;

        let details = self.market.coin_details(&coin.id).await?;
        if details.name.trim().is_empty() || details.symbol.trim().is_empty() {
            return Err(ContentError::EmptyResponse(format!("coingecko coin {}", coin.id)));
        }

        let (percent, reason) = {
            let mut rng = rand::rng();
            let reason = MARKET_REASONS.choose(&mut rng).copied().unwrap_or(MARKET_REASONS[0]);
            (rng.random_range(5..=35), reason)
        };

        tracing::info!(
            coin = %details.name,
            symbol = %details.symbol.to_uppercase(),
            percent,
            "crypto: market prediction"
        );
        Ok(format_market_prediction(
            &details.name,
            &details.symbol,
            details.usd_price(),
            percent,
            reason,
        ))
    }
}

/// A prediction for a random coin from the fixed manual list.
#[must_use]
pub fn manual_prediction() -> String {
    let mut rng = rand::rng();
    let (symbol, name, emoji) = MANUAL_COINS.choose(&mut rng).copied().unwrap_or(MANUAL_COINS[0]);
    let reason = MANUAL_REASONS.choose(&mut rng).copied().unwrap_or(MANUAL_REASONS[0]);
    let percent = rng.random_range(8..=30);
    tracing::info!(coin = name, symbol, percent, "crypto: manual prediction");
    format_manual_prediction(symbol, name, emoji, percent, reason)
}

#[must_use]
pub fn format_market_prediction(
    name: &str,
    symbol: &str,
    usd_price: Option<f64>,
    percent: u32,
    reason: &str,
) -> String {
    let symbol = symbol.to_uppercase();
    let mut text = format!("🚀 {name} ({symbol}) looking bullish for next week! ");
    if let Some(price) = usd_price.filter(|p| *p > 0.01) {
        text.push_str(&format!("Currently at {}, ", format_usd(price)));
    }
    text.push_str(&format!(
        "predicting {percent}% gains as {reason}. Perfect entry opportunity! #{symbol} #Crypto #Prediction"
    ));

    if text.chars().count() > COMPACT_THRESHOLD {
        text = format!(
            "🚀 {name} ({symbol}) could pump {percent}% next week! {}. #{symbol} #Crypto #Prediction",
            capitalize(reason)
        );
    }
    text
}

#[must_use]
pub fn format_manual_prediction(
    symbol: &str,
    name: &str,
    emoji: &str,
    percent: u32,
    reason: &str,
) -> String {
    format!(
        "{emoji} {name} ({symbol}) prediction: {percent}% pump next week! {}. \
         Great accumulation opportunity! #{symbol} #Crypto #Prediction",
        capitalize(reason)
    )
}

/// `$1.23` below 100, `$12,345` from 100 up.
fn format_usd(price: f64) -> String {
    if price < 100.0 {
        return format!("${price:.2}");
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let whole = price.round() as u64;
    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("${grouped}")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
