//! Canonical market data models
//!
//! Every provider response is normalized into one of the shapes defined here.
//! Their serialized form matches CoinGecko's native JSON, so a CoinGecko
//! payload decodes into them directly and normalized data from any other
//! provider can be fed back through the same decoder unchanged.

pub mod catalog;
pub mod coincap;
pub mod coinpaprika;
pub mod etherscan;
pub mod ids;
pub mod normalize;

pub use catalog::Catalog;
pub use normalize::{NormalizeFn, Normalizers};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::FetchError;
use normalize::{de_f64_lenient, de_opt_f64};

/// Which canonical structure a source is normalized into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseShape {
    /// Ranked list of coins with price and market cap
    Coins,
    /// Coin id to USD price
    SimplePrice,
    /// Historical `[timestamp, price]` series
    MarketChart,
    /// Whole-market statistics
    Global,
    /// Ethereum gas price tiers
    Gas,
}

impl ResponseShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseShape::Coins => "coins",
            ResponseShape::SimplePrice => "simple_price",
            ResponseShape::MarketChart => "market_chart",
            ResponseShape::Global => "global",
            ResponseShape::Gas => "gas",
        }
    }
}

impl fmt::Display for ResponseShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseShape {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "coins" => Ok(ResponseShape::Coins),
            "simple_price" => Ok(ResponseShape::SimplePrice),
            "market_chart" => Ok(ResponseShape::MarketChart),
            "global" => Ok(ResponseShape::Global),
            "gas" => Ok(ResponseShape::Gas),
            other => Err(FetchError::Parse(format!("unknown response shape: {other}"))),
        }
    }
}

/// Upstream market-data provider
///
/// Providers without registered normalizers are treated as already speaking
/// the canonical format.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    CoinGecko,
    CoinCap,
    CoinPaprika,
    Etherscan,
    Other(String),
}

impl ProviderKind {
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "coingecko" => ProviderKind::CoinGecko,
            "coincap" => ProviderKind::CoinCap,
            "coinpaprika" => ProviderKind::CoinPaprika,
            "etherscan" => ProviderKind::Etherscan,
            _ => ProviderKind::Other(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ProviderKind::CoinGecko => "coingecko",
            ProviderKind::CoinCap => "coincap",
            ProviderKind::CoinPaprika => "coinpaprika",
            ProviderKind::Etherscan => "etherscan",
            ProviderKind::Other(name) => name,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of a coin ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coin {
    pub id: String,
    pub symbol: String,
    pub name: String,
    /// Logo URL; empty when the provider has none
    #[serde(rename = "image", default)]
    pub image_url: String,
    #[serde(default, deserialize_with = "de_f64_lenient")]
    pub current_price: f64,
    #[serde(default, deserialize_with = "de_f64_lenient")]
    pub market_cap: f64,
    #[serde(
        rename = "price_change_percentage_24h",
        default,
        deserialize_with = "de_opt_f64"
    )]
    pub change_24h_percent: Option<f64>,
}

/// USD quote for a single coin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UsdQuote {
    #[serde(deserialize_with = "de_f64_lenient")]
    pub usd: f64,
}

/// Coin id to USD quote
pub type SimplePrice = BTreeMap<String, UsdQuote>;

/// A `[timestamp_millis, price]` pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint(pub i64, pub f64);

impl PricePoint {
    pub fn timestamp_millis(&self) -> i64 {
        self.0
    }

    pub fn price(&self) -> f64 {
        self.1
    }
}

/// Chronological price history
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MarketChart {
    #[serde(default)]
    pub prices: Vec<PricePoint>,
}

impl MarketChart {
    /// Builds a chart, ordering points by timestamp
    pub fn from_points(mut prices: Vec<PricePoint>) -> Self {
        prices.sort_by_key(|p| p.0);
        Self { prices }
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Prices only, oldest first
    pub fn price_series(&self) -> Vec<f64> {
        self.prices.iter().map(PricePoint::price).collect()
    }
}

/// Whole-market statistics
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "GlobalEnvelope", into = "GlobalEnvelope")]
pub struct GlobalStats {
    pub active_crypto_count: u64,
    pub total_market_cap_usd: f64,
    pub total_volume_usd: f64,
    pub btc_dominance_percent: f64,
}

impl GlobalStats {
    /// True when no statistic carries a value
    pub fn is_empty(&self) -> bool {
        self.active_crypto_count == 0
            && self.total_market_cap_usd == 0.0
            && self.total_volume_usd == 0.0
            && self.btc_dominance_percent == 0.0
    }
}

/// CoinGecko `/global` wire form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct GlobalEnvelope {
    #[serde(default)]
    data: GlobalData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct GlobalData {
    #[serde(default)]
    active_cryptocurrencies: u64,
    #[serde(default)]
    total_market_cap: UsdAmount,
    #[serde(default)]
    total_volume: UsdAmount,
    #[serde(default)]
    market_cap_percentage: BtcShare,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct UsdAmount {
    #[serde(default, deserialize_with = "de_f64_lenient")]
    usd: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct BtcShare {
    #[serde(default, deserialize_with = "de_f64_lenient")]
    btc: f64,
}

impl From<GlobalEnvelope> for GlobalStats {
    fn from(envelope: GlobalEnvelope) -> Self {
        let data = envelope.data;
        Self {
            active_crypto_count: data.active_cryptocurrencies,
            total_market_cap_usd: data.total_market_cap.usd,
            total_volume_usd: data.total_volume.usd,
            btc_dominance_percent: data.market_cap_percentage.btc,
        }
    }
}

impl From<GlobalStats> for GlobalEnvelope {
    fn from(stats: GlobalStats) -> Self {
        Self {
            data: GlobalData {
                active_cryptocurrencies: stats.active_crypto_count,
                total_market_cap: UsdAmount {
                    usd: stats.total_market_cap_usd,
                },
                total_volume: UsdAmount {
                    usd: stats.total_volume_usd,
                },
                market_cap_percentage: BtcShare {
                    btc: stats.btc_dominance_percent,
                },
            },
        }
    }
}

/// Gas price tiers in gwei
///
/// There is no CoinGecko equivalent, so this flat form is canonical.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GasPrices {
    #[serde(default, deserialize_with = "de_f64_lenient")]
    pub low: f64,
    #[serde(default, deserialize_with = "de_f64_lenient")]
    pub average: f64,
    #[serde(default, deserialize_with = "de_f64_lenient")]
    pub fast: f64,
}

impl GasPrices {
    /// True when no tier carries a positive price
    pub fn is_empty(&self) -> bool {
        ![self.low, self.average, self.fast]
            .iter()
            .any(|gwei| gwei.is_finite() && *gwei > 0.0)
    }
}

/// A normalized response for any shape
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MarketData {
    Coins(Vec<Coin>),
    SimplePrice(SimplePrice),
    MarketChart(MarketChart),
    Global(GlobalStats),
    Gas(GasPrices),
}

impl MarketData {
    /// Decodes a payload that is already in the canonical wire form
    pub fn decode(shape: ResponseShape, payload: &Value) -> Result<Self, FetchError> {
        let data = match shape {
            ResponseShape::Coins => MarketData::Coins(Vec::<Coin>::deserialize(payload)?),
            ResponseShape::SimplePrice => {
                MarketData::SimplePrice(SimplePrice::deserialize(payload)?)
            }
            ResponseShape::MarketChart => {
                let chart = MarketChart::deserialize(payload)?;
                MarketData::MarketChart(MarketChart::from_points(chart.prices))
            }
            ResponseShape::Global => MarketData::Global(GlobalStats::deserialize(payload)?),
            ResponseShape::Gas => MarketData::Gas(GasPrices::deserialize(payload)?),
        };
        Ok(data)
    }

    pub fn shape(&self) -> ResponseShape {
        match self {
            MarketData::Coins(_) => ResponseShape::Coins,
            MarketData::SimplePrice(_) => ResponseShape::SimplePrice,
            MarketData::MarketChart(_) => ResponseShape::MarketChart,
            MarketData::Global(_) => ResponseShape::Global,
            MarketData::Gas(_) => ResponseShape::Gas,
        }
    }

    /// Whether the data is semantically vacuous
    ///
    /// Providers often answer 200 with a valid but useless body, e.g. a chart
    /// with no points for an unsupported coin. A simple-price map counts as
    /// empty unless at least one coin has a positive, finite price.
    pub fn is_empty(&self) -> bool {
        match self {
            MarketData::Coins(coins) => coins.is_empty(),
            MarketData::SimplePrice(prices) => !prices
                .values()
                .any(|quote| quote.usd.is_finite() && quote.usd > 0.0),
            MarketData::MarketChart(chart) => chart.is_empty(),
            MarketData::Global(stats) => stats.is_empty(),
            MarketData::Gas(gas) => gas.is_empty(),
        }
    }

    /// Canonical JSON form
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn into_coins(self) -> Option<Vec<Coin>> {
        match self {
            MarketData::Coins(coins) => Some(coins),
            _ => None,
        }
    }

    pub fn into_simple_price(self) -> Option<SimplePrice> {
        match self {
            MarketData::SimplePrice(prices) => Some(prices),
            _ => None,
        }
    }

    pub fn into_market_chart(self) -> Option<MarketChart> {
        match self {
            MarketData::MarketChart(chart) => Some(chart),
            _ => None,
        }
    }

    pub fn into_global(self) -> Option<GlobalStats> {
        match self {
            MarketData::Global(stats) => Some(stats),
            _ => None,
        }
    }

    pub fn into_gas(self) -> Option<GasPrices> {
        match self {
            MarketData::Gas(gas) => Some(gas),
            _ => None,
        }
    }
}
