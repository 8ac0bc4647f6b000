//! CoinCap response schemas and normalizers
//!
//! CoinCap wraps every body in a `data` envelope and encodes numbers as
//! strings. Coin rows have no logo, so `image_url` is left empty. Asset ids
//! are mapped back to CoinGecko ids where the two differ.

use chrono::DateTime;
use serde::Deserialize;
use serde_json::Value;

use super::ids::coin_id_from_coincap;
use super::normalize::{de_opt_f64, Normalizers};
use super::{
    Coin, GlobalStats, MarketChart, MarketData, PricePoint, ProviderKind, ResponseShape,
    SimplePrice, UsdQuote,
};
use crate::error::FetchError;

/// Maximum number of rows kept from a backup coin listing
pub const BACKUP_COIN_LIMIT: usize = 10;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// Entry from `/assets` or `/assets/{id}`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Asset {
    id: String,
    #[serde(default)]
    symbol: String,
    #[serde(default)]
    name: String,
    #[serde(default, deserialize_with = "de_opt_f64")]
    price_usd: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    market_cap_usd: Option<f64>,
    #[serde(rename = "changePercent24Hr", default, deserialize_with = "de_opt_f64")]
    change_percent_24h: Option<f64>,
}

/// Entry from `/assets/{id}/history`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryPoint {
    #[serde(default, deserialize_with = "de_opt_f64")]
    price_usd: Option<f64>,
    /// Unix millis
    #[serde(default)]
    time: Option<i64>,
    /// ISO 8601
    #[serde(default)]
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Global {
    #[serde(default)]
    active_cryptocurrencies: Option<u64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    total_market_cap_usd: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    total_volume_usd: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    bitcoin_percentage_of_market_cap: Option<f64>,
}

/// Adds the CoinCap entries to a normalizer table
pub fn register(normalizers: &mut Normalizers) {
    normalizers.register(ProviderKind::CoinCap, ResponseShape::Coins, normalize_coins);
    normalizers.register(
        ProviderKind::CoinCap,
        ResponseShape::SimplePrice,
        normalize_simple_price,
    );
    normalizers.register(
        ProviderKind::CoinCap,
        ResponseShape::MarketChart,
        normalize_market_chart,
    );
    normalizers.register(ProviderKind::CoinCap, ResponseShape::Global, normalize_global);
}

/// `/assets` to a coin list; rows without a price are dropped
pub fn normalize_coins(payload: &Value) -> Result<MarketData, FetchError> {
    let envelope = Envelope::<Vec<Asset>>::deserialize(payload)?;
    let coins = envelope
        .data
        .into_iter()
        .filter_map(|asset| {
            let current_price = asset.price_usd?;
            Some(Coin {
                id: coin_id_from_coincap(&asset.id).to_string(),
                symbol: asset.symbol,
                name: asset.name,
                image_url: String::new(),
                current_price,
                market_cap: asset.market_cap_usd.unwrap_or(0.0),
                change_24h_percent: asset.change_percent_24h,
            })
        })
        .take(BACKUP_COIN_LIMIT)
        .collect();
    Ok(MarketData::Coins(coins))
}

/// `/assets/{id}` to a single-entry price map
pub fn normalize_simple_price(payload: &Value) -> Result<MarketData, FetchError> {
    let asset = Envelope::<Asset>::deserialize(payload)?.data;
    let usd = asset
        .price_usd
        .ok_or_else(|| FetchError::Parse(format!("asset {} has no priceUsd", asset.id)))?;

    let mut prices = SimplePrice::new();
    prices.insert(coin_id_from_coincap(&asset.id).to_string(), UsdQuote { usd });
    Ok(MarketData::SimplePrice(prices))
}

/// `/assets/{id}/history` to a chart
pub fn normalize_market_chart(payload: &Value) -> Result<MarketData, FetchError> {
    let history = Envelope::<Vec<HistoryPoint>>::deserialize(payload)?.data;
    let points = history
        .into_iter()
        .map(|point| {
            let price = point
                .price_usd
                .ok_or_else(|| FetchError::Parse("history point has no priceUsd".into()))?;
            Ok(PricePoint(history_timestamp(&point)?, price))
        })
        .collect::<Result<Vec<_>, FetchError>>()?;
    Ok(MarketData::MarketChart(MarketChart::from_points(points)))
}

fn history_timestamp(point: &HistoryPoint) -> Result<i64, FetchError> {
    if let Some(date) = &point.date {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(date) {
            return Ok(parsed.timestamp_millis());
        }
    }
    point.time.ok_or_else(|| {
        FetchError::Parse(format!(
            "history point has no usable timestamp (date: {:?})",
            point.date
        ))
    })
}

/// `/global` to market statistics
pub fn normalize_global(payload: &Value) -> Result<MarketData, FetchError> {
    let global = Envelope::<Global>::deserialize(payload)?.data;
    Ok(MarketData::Global(GlobalStats {
        active_crypto_count: global.active_cryptocurrencies.unwrap_or(0),
        total_market_cap_usd: global.total_market_cap_usd.unwrap_or(0.0),
        total_volume_usd: global.total_volume_usd.unwrap_or(0.0),
        btc_dominance_percent: global.bitcoin_percentage_of_market_cap.unwrap_or(0.0),
    }))
}
