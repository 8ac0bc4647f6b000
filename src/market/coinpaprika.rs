//! CoinPaprika response schemas and normalizers
//!
//! Paprika ids carry the ticker symbol as a prefix (`bnb-binance-coin`).
//! Results are keyed by the CoinGecko id from the shared id table.

use chrono::DateTime;
use serde::Deserialize;
use serde_json::Value;

use super::coincap::BACKUP_COIN_LIMIT;
use super::ids::coin_id_from_paprika;
use super::normalize::{de_opt_f64, Normalizers};
use super::{
    Coin, GlobalStats, MarketChart, MarketData, PricePoint, ProviderKind, ResponseShape,
    SimplePrice, UsdQuote,
};
use crate::error::FetchError;

/// Entry from `/tickers` or `/tickers/{id}`
#[derive(Debug, Deserialize)]
struct Ticker {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    symbol: String,
    quotes: Quotes,
}

#[derive(Debug, Deserialize)]
struct Quotes {
    #[serde(rename = "USD")]
    usd: UsdTickerQuote,
}

#[derive(Debug, Deserialize)]
struct UsdTickerQuote {
    #[serde(default, deserialize_with = "de_opt_f64")]
    price: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    market_cap: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    percent_change_24h: Option<f64>,
}

/// Row from `/coins/{id}/ohlcv/historical` or `/tickers/{id}/historical`
#[derive(Debug, Deserialize)]
struct HistoryRow {
    #[serde(alias = "time_open")]
    timestamp: String,
    #[serde(alias = "price", default, deserialize_with = "de_opt_f64")]
    close: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Global {
    #[serde(default)]
    cryptocurrencies_number: Option<u64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    market_cap_usd: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    volume_24h_usd: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    bitcoin_dominance_percentage: Option<f64>,
}

/// Adds the CoinPaprika entries to a normalizer table
pub fn register(normalizers: &mut Normalizers) {
    normalizers.register(ProviderKind::CoinPaprika, ResponseShape::Coins, normalize_coins);
    normalizers.register(
        ProviderKind::CoinPaprika,
        ResponseShape::SimplePrice,
        normalize_simple_price,
    );
    normalizers.register(
        ProviderKind::CoinPaprika,
        ResponseShape::MarketChart,
        normalize_market_chart,
    );
    normalizers.register(
        ProviderKind::CoinPaprika,
        ResponseShape::Global,
        normalize_global,
    );
}

/// `/tickers` to a coin list; rows without a price are dropped
pub fn normalize_coins(payload: &Value) -> Result<MarketData, FetchError> {
    let tickers = Vec::<Ticker>::deserialize(payload)?;
    let coins = tickers
        .into_iter()
        .filter_map(|ticker| {
            let quote = ticker.quotes.usd;
            let current_price = quote.price?;
            Some(Coin {
                id: coin_id_from_paprika(&ticker.id).to_string(),
                symbol: ticker.symbol,
                name: ticker.name,
                image_url: String::new(),
                current_price,
                market_cap: quote.market_cap.unwrap_or(0.0),
                change_24h_percent: quote.percent_change_24h,
            })
        })
        .take(BACKUP_COIN_LIMIT)
        .collect();
    Ok(MarketData::Coins(coins))
}

/// `/tickers/{id}` to a single-entry price map
pub fn normalize_simple_price(payload: &Value) -> Result<MarketData, FetchError> {
    let ticker = Ticker::deserialize(payload)?;
    let usd = ticker
        .quotes
        .usd
        .price
        .ok_or_else(|| FetchError::Parse(format!("ticker {} has no USD price", ticker.id)))?;

    let mut prices = SimplePrice::new();
    prices.insert(coin_id_from_paprika(&ticker.id).to_string(), UsdQuote { usd });
    Ok(MarketData::SimplePrice(prices))
}

/// OHLCV rows to a chart of closing prices
pub fn normalize_market_chart(payload: &Value) -> Result<MarketData, FetchError> {
    let rows = Vec::<HistoryRow>::deserialize(payload)?;
    let points = rows
        .into_iter()
        .map(|row| {
            let timestamp = DateTime::parse_from_rfc3339(&row.timestamp)
                .map_err(|e| FetchError::Parse(format!("bad timestamp {}: {e}", row.timestamp)))?
                .timestamp_millis();
            let close = row
                .close
                .ok_or_else(|| FetchError::Parse(format!("no close price at {}", row.timestamp)))?;
            Ok(PricePoint(timestamp, close))
        })
        .collect::<Result<Vec<_>, FetchError>>()?;
    Ok(MarketData::MarketChart(MarketChart::from_points(points)))
}

/// `/global` to market statistics
pub fn normalize_global(payload: &Value) -> Result<MarketData, FetchError> {
    let global = Global::deserialize(payload)?;
    Ok(MarketData::Global(GlobalStats {
        active_crypto_count: global.cryptocurrencies_number.unwrap_or(0),
        total_market_cap_usd: global.market_cap_usd.unwrap_or(0.0),
        total_volume_usd: global.volume_24h_usd.unwrap_or(0.0),
        btc_dominance_percent: global.bitcoin_dominance_percentage.unwrap_or(0.0),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ticker(id: &str, price: f64) -> Value {
        json!({
            "id": id,
            "name": "Ethereum",
            "symbol": "ETH",
            "rank": 2,
            "quotes": {"USD": {
                "price": price,
                "volume_24h": 1.0e10,
                "market_cap": 3.7e11,
                "percent_change_24h": 1.75
            }}
        })
    }

    #[test]
    fn test_simple_price_keyed_by_coingecko_id() {
        let prices = normalize_simple_price(&ticker("bnb-binance-coin", 580.0))
            .unwrap()
            .into_simple_price()
            .unwrap();

        assert_eq!(prices.keys().collect::<Vec<_>>(), vec!["binancecoin"]);
        assert!((prices["binancecoin"].usd - 580.0).abs() < 1e-9);
    }

    #[test]
    fn test_untracked_ticker_keeps_paprika_id() {
        let prices = normalize_simple_price(&ticker("xyz-some-token", 0.5))
            .unwrap()
            .into_simple_price()
            .unwrap();

        assert!(prices.contains_key("xyz-some-token"));
    }

    #[test]
    fn test_coins_maps_usd_quotes() {
        let payload = json!([ticker("eth-ethereum", 3100.0)]);

        let coins = normalize_coins(&payload).unwrap().into_coins().unwrap();

        assert_eq!(coins.len(), 1);
        assert_eq!(coins[0].id, "ethereum");
        assert_eq!(coins[0].symbol, "ETH");
        assert!(coins[0].image_url.is_empty());
        assert!((coins[0].market_cap - 3.7e11).abs() < 1.0);
        assert_eq!(coins[0].change_24h_percent, Some(1.75));
    }

    #[test]
    fn test_coins_truncated_to_backup_limit() {
        let rows: Vec<Value> = (0..40).map(|i| ticker(&format!("t{i}-coin{i}"), 1.0)).collect();

        let coins = normalize_coins(&Value::Array(rows)).unwrap().into_coins().unwrap();

        assert_eq!(coins.len(), BACKUP_COIN_LIMIT);
        assert_eq!(coins[9].id, "t9-coin9");
    }

    #[test]
    fn test_simple_price_from_ticker() {
        let prices = normalize_simple_price(&ticker("eth-ethereum", 3100.25))
            .unwrap()
            .into_simple_price()
            .unwrap();

        assert!((prices["ethereum"].usd - 3100.25).abs() < 1e-9);
    }

    #[test]
    fn test_market_chart_from_ohlcv_rows() {
        let payload = json!([
            {"time_open": "2024-01-02T00:00:00Z", "time_close": "2024-01-02T23:59:59Z",
             "open": 2.0, "high": 2.5, "low": 1.5, "close": 2.2, "volume": 1, "market_cap": 1},
            {"time_open": "2024-01-01T00:00:00Z", "time_close": "2024-01-01T23:59:59Z",
             "open": 1.0, "high": 1.5, "low": 0.5, "close": 1.1, "volume": 1, "market_cap": 1}
        ]);

        let chart = normalize_market_chart(&payload)
            .unwrap()
            .into_market_chart()
            .unwrap();

        assert_eq!(
            chart.prices,
            vec![
                PricePoint(1_704_067_200_000, 1.1),
                PricePoint(1_704_153_600_000, 2.2)
            ]
        );
    }

    #[test]
    fn test_market_chart_from_historical_ticks() {
        let payload = json!([{"timestamp": "2024-01-01T00:00:00Z", "price": 42.0}]);

        let chart = normalize_market_chart(&payload)
            .unwrap()
            .into_market_chart()
            .unwrap();

        assert_eq!(chart.prices, vec![PricePoint(1_704_067_200_000, 42.0)]);
    }

    #[test]
    fn test_empty_history_is_empty() {
        assert!(normalize_market_chart(&json!([])).unwrap().is_empty());
    }

    #[test]
    fn test_global_maps_fields() {
        let payload = json!({
            "market_cap_usd": 2.3e12,
            "volume_24h_usd": 9.0e10,
            "bitcoin_dominance_percentage": 53.1,
            "cryptocurrencies_number": 11000,
            "last_updated": 1704067200
        });

        let stats = normalize_global(&payload).unwrap().into_global().unwrap();

        assert_eq!(stats.active_crypto_count, 11000);
        assert!((stats.total_market_cap_usd - 2.3e12).abs() < 1.0);
        assert!((stats.btc_dominance_percent - 53.1).abs() < 1e-9);
    }
}
