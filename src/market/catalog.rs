//! Standard queries against the supported providers
//!
//! Every coin query lists CoinGecko first, then CoinCap, then CoinPaprika.
//! Gas comes from the Etherscan oracle alone. Cache keys follow
//! `<request>_<provider>` so each provider's raw payload is cached separately;
//! coin ids in keys are always CoinGecko ids.

use chrono::{DateTime, Duration, Utc};

use super::ids::{coincap_id, paprika_id};
use super::{ProviderKind, ResponseShape};
use crate::source::{Query, SourceDescriptor};

/// Base URL for the CoinGecko API
pub const COINGECKO_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Base URL for the CoinCap API
pub const COINCAP_BASE_URL: &str = "https://api.coincap.io/v2";

/// Base URL for the CoinPaprika API
pub const COINPAPRIKA_BASE_URL: &str = "https://api.coinpaprika.com/v1";

/// Base URL for the Etherscan API
pub const ETHERSCAN_BASE_URL: &str = "https://api.etherscan.io/api";

/// Builds queries for the standard market-data requests
#[derive(Debug, Clone)]
pub struct Catalog {
    coingecko: String,
    coincap: String,
    coinpaprika: String,
    etherscan: String,
    etherscan_key: Option<String>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    /// Catalog pointing at the public provider endpoints
    pub fn new() -> Self {
        Self {
            coingecko: COINGECKO_BASE_URL.to_string(),
            coincap: COINCAP_BASE_URL.to_string(),
            coinpaprika: COINPAPRIKA_BASE_URL.to_string(),
            etherscan: ETHERSCAN_BASE_URL.to_string(),
            etherscan_key: None,
        }
    }

    /// Overrides one provider's base URL (for mirrors and tests)
    pub fn with_base_url(mut self, provider: ProviderKind, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        match provider {
            ProviderKind::CoinGecko => self.coingecko = base_url,
            ProviderKind::CoinCap => self.coincap = base_url,
            ProviderKind::CoinPaprika => self.coinpaprika = base_url,
            ProviderKind::Etherscan => self.etherscan = base_url,
            ProviderKind::Other(_) => {}
        }
        self
    }

    /// Sets the Etherscan API key sent with gas queries
    pub fn with_etherscan_key(mut self, key: impl Into<String>) -> Self {
        self.etherscan_key = Some(key.into());
        self
    }

    /// Top coins by market cap
    pub fn coins(&self, limit: usize) -> Query {
        let shape = ResponseShape::Coins;
        Query::new(vec![
            SourceDescriptor::new(
                format!(
                    "{}/coins/markets?vs_currency=usd&order=market_cap_desc&per_page={}&page=1",
                    self.coingecko, limit
                ),
                shape,
                ProviderKind::CoinGecko,
            )
            .with_cache_key(format!("coins_{limit}_coingecko")),
            SourceDescriptor::new(
                format!("{}/assets?limit={}", self.coincap, limit),
                shape,
                ProviderKind::CoinCap,
            )
            .with_cache_key(format!("coins_{limit}_coincap")),
            SourceDescriptor::new(
                format!("{}/tickers", self.coinpaprika),
                shape,
                ProviderKind::CoinPaprika,
            )
            .with_cache_key("coins_coinpaprika"),
        ])
    }

    /// USD price for one coin (CoinGecko id)
    ///
    /// The CoinPaprika source is only included for coins with a known Paprika id.
    pub fn simple_price(&self, coin_id: &str) -> Query {
        let shape = ResponseShape::SimplePrice;
        Query::from_candidates([
            Some(
                SourceDescriptor::new(
                    format!(
                        "{}/simple/price?ids={}&vs_currencies=usd",
                        self.coingecko, coin_id
                    ),
                    shape,
                    ProviderKind::CoinGecko,
                )
                .with_cache_key(format!("price_{coin_id}_coingecko")),
            ),
            Some(
                SourceDescriptor::new(
                    format!("{}/assets/{}", self.coincap, coincap_id(coin_id)),
                    shape,
                    ProviderKind::CoinCap,
                )
                .with_cache_key(format!("price_{coin_id}_coincap")),
            ),
            paprika_id(coin_id).map(|pid| {
                SourceDescriptor::new(
                    format!("{}/tickers/{}", self.coinpaprika, pid),
                    shape,
                    ProviderKind::CoinPaprika,
                )
                .with_cache_key(format!("price_{coin_id}_coinpaprika"))
            }),
        ])
    }

    /// Daily USD price history for the last `days` days
    pub fn market_chart(&self, coin_id: &str, days: u32) -> Query {
        self.market_chart_at(coin_id, days, Utc::now())
    }

    /// Like `market_chart`, with an explicit "now" for the windowed backups
    pub fn market_chart_at(&self, coin_id: &str, days: u32, now: DateTime<Utc>) -> Query {
        let shape = ResponseShape::MarketChart;
        let start = now - Duration::days(i64::from(days));
        Query::from_candidates([
            Some(
                SourceDescriptor::new(
                    format!(
                        "{}/coins/{}/market_chart?vs_currency=usd&days={}",
                        self.coingecko, coin_id, days
                    ),
                    shape,
                    ProviderKind::CoinGecko,
                )
                .with_cache_key(format!("chart_{coin_id}_{days}_coingecko")),
            ),
            Some(
                SourceDescriptor::new(
                    format!(
                        "{}/assets/{}/history?interval=d1&start={}&end={}",
                        self.coincap,
                        coincap_id(coin_id),
                        start.timestamp_millis(),
                        now.timestamp_millis()
                    ),
                    shape,
                    ProviderKind::CoinCap,
                )
                .with_cache_key(format!("chart_{coin_id}_{days}_coincap")),
            ),
            paprika_id(coin_id).map(|pid| {
                SourceDescriptor::new(
                    format!(
                        "{}/coins/{}/ohlcv/historical?start={}&end={}",
                        self.coinpaprika,
                        pid,
                        start.format("%Y-%m-%d"),
                        now.format("%Y-%m-%d")
                    ),
                    shape,
                    ProviderKind::CoinPaprika,
                )
                .with_cache_key(format!("chart_{coin_id}_{days}_coinpaprika"))
            }),
        ])
    }

    /// Whole-market statistics
    pub fn global(&self) -> Query {
        let shape = ResponseShape::Global;
        Query::new(vec![
            SourceDescriptor::new(
                format!("{}/global", self.coingecko),
                shape,
                ProviderKind::CoinGecko,
            )
            .with_cache_key("global_coingecko"),
            SourceDescriptor::new(
                format!("{}/global", self.coincap),
                shape,
                ProviderKind::CoinCap,
            )
            .with_cache_key("global_coincap"),
            SourceDescriptor::new(
                format!("{}/global", self.coinpaprika),
                shape,
                ProviderKind::CoinPaprika,
            )
            .with_cache_key("global_coinpaprika"),
        ])
    }

    /// Ethereum gas price tiers
    pub fn gas(&self) -> Query {
        let mut endpoint = format!("{}?module=gastracker&action=gasoracle", self.etherscan);
        if let Some(key) = &self.etherscan_key {
            endpoint.push_str("&apikey=");
            endpoint.push_str(key);
        }
        Query::new(vec![SourceDescriptor::new(
            endpoint,
            ResponseShape::Gas,
            ProviderKind::Etherscan,
        )
        .with_cache_key("gas_etherscan")])
    }
}
