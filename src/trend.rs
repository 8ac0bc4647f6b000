//! Naive trend prediction and portfolio valuation
//!
//! Entertainment-grade analytics over resolved market data: a least-squares
//! trend line through a price history, and USD valuation of token holdings.

use serde::Serialize;

use crate::market::{MarketChart, SimplePrice};

/// Relative slope below which a trend is reported as flat
const FLAT_THRESHOLD: f64 = 1e-4;

/// Direction of a fitted trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Flat,
}

/// Summary of a linear fit over a chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSummary {
    /// Price change per sample
    pub slope: f64,
    /// Fitted value at the first sample
    pub start: f64,
    /// Fitted value at the last sample
    pub end: f64,
    pub direction: TrendDirection,
    /// Number of samples fitted
    pub samples: usize,
}

/// Fits y = slope * x + intercept over x = 1..=n and returns the fitted values
///
/// Fewer than two prices cannot define a line, so they are returned as-is.
pub fn linear_trend(prices: &[f64]) -> Vec<f64> {
    match fit(prices) {
        Some((slope, intercept)) => (1..=prices.len())
            .map(|x| slope * x as f64 + intercept)
            .collect(),
        None => prices.to_vec(),
    }
}

fn fit(prices: &[f64]) -> Option<(f64, f64)> {
    let n = prices.len();
    if n < 2 {
        return None;
    }
    let n_f = n as f64;
    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_xx) = (0.0, 0.0, 0.0, 0.0);
    for (i, &y) in prices.iter().enumerate() {
        let x = (i + 1) as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_xx += x * x;
    }
    let slope = (n_f * sum_xy - sum_x * sum_y) / (n_f * sum_xx - sum_x * sum_x);
    let intercept = (sum_y - slope * sum_x) / n_f;
    Some((slope, intercept))
}

/// Fits a trend through a chart's prices
pub fn summarize(chart: &MarketChart) -> Option<TrendSummary> {
    let prices = chart.price_series();
    let (slope, intercept) = fit(&prices)?;
    let start = slope + intercept;
    let end = slope * prices.len() as f64 + intercept;

    let scale = start.abs().max(f64::EPSILON);
    let direction = if (slope / scale).abs() < FLAT_THRESHOLD {
        TrendDirection::Flat
    } else if slope > 0.0 {
        TrendDirection::Up
    } else {
        TrendDirection::Down
    };

    Some(TrendSummary {
        slope,
        start,
        end,
        direction,
        samples: prices.len(),
    })
}

/// A holding with its USD value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuedHolding {
    pub coin_id: String,
    pub amount: f64,
    pub price_usd: f64,
    pub value_usd: f64,
}

/// Result of valuing a set of holdings
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Valuation {
    pub total_usd: f64,
    pub holdings: Vec<ValuedHolding>,
    /// Coins with no usable price; not counted in the total
    pub unpriced: Vec<String>,
}

/// Values `holdings` (coin id, amount) at the given prices
pub fn portfolio_value(holdings: &[(String, f64)], prices: &SimplePrice) -> Valuation {
    let mut valuation = Valuation::default();
    for (coin_id, amount) in holdings {
        match prices.get(coin_id).map(|q| q.usd).filter(|p| p.is_finite()) {
            Some(price_usd) => {
                let value_usd = price_usd * amount;
                valuation.total_usd += value_usd;
                valuation.holdings.push(ValuedHolding {
                    coin_id: coin_id.clone(),
                    amount: *amount,
                    price_usd,
                    value_usd,
                });
            }
            None => valuation.unpriced.push(coin_id.clone()),
        }
    }
    valuation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::{PricePoint, UsdQuote};

    fn chart(prices: &[f64]) -> MarketChart {
        MarketChart::from_points(
            prices
                .iter()
                .enumerate()
                .map(|(i, &p)| PricePoint(i as i64 * 86_400_000, p))
                .collect(),
        )
    }

    #[test]
    fn test_linear_trend_on_a_line_is_exact() {
        let fitted = linear_trend(&[2.0, 4.0, 6.0, 8.0]);
        for (got, want) in fitted.iter().zip([2.0, 4.0, 6.0, 8.0]) {
            assert!((got - want).abs() < 1e-9);
        }
    }

    #[test]
    fn test_linear_trend_short_input_unchanged() {
        assert_eq!(linear_trend(&[]), Vec::<f64>::new());
        assert_eq!(linear_trend(&[5.0]), vec![5.0]);
    }

    #[test]
    fn test_linear_trend_smooths_noise() {
        let fitted = linear_trend(&[1.0, 3.0, 2.0, 4.0]);
        // slope 0.8, intercept 0.5
        assert!((fitted[0] - 1.3).abs() < 1e-9);
        assert!((fitted[3] - 3.7).abs() < 1e-9);
    }

    #[test]
    fn test_summarize_directions() {
        let up = summarize(&chart(&[100.0, 110.0, 120.0])).unwrap();
        assert_eq!(up.direction, TrendDirection::Up);
        assert!((up.slope - 10.0).abs() < 1e-9);
        assert!((up.end - 120.0).abs() < 1e-9);
        assert_eq!(up.samples, 3);

        let down = summarize(&chart(&[3.0, 2.0, 1.0])).unwrap();
        assert_eq!(down.direction, TrendDirection::Down);

        let flat = summarize(&chart(&[1.0, 1.0, 1.0, 1.0])).unwrap();
        assert_eq!(flat.direction, TrendDirection::Flat);

        assert!(summarize(&chart(&[1.0])).is_none());
    }

    #[test]
    fn test_portfolio_value() {
        let mut prices = SimplePrice::new();
        prices.insert("ethereum".into(), UsdQuote { usd: 3000.0 });
        prices.insert("tether".into(), UsdQuote { usd: 1.0 });

        let holdings = vec![
            ("ethereum".to_string(), 1.5),
            ("tether".to_string(), 250.0),
            ("mystery".to_string(), 10.0),
        ];

        let valuation = portfolio_value(&holdings, &prices);

        assert!((valuation.total_usd - 4750.0).abs() < 1e-9);
        assert_eq!(valuation.holdings.len(), 2);
        assert!((valuation.holdings[0].value_usd - 4500.0).abs() < 1e-9);
        assert_eq!(valuation.unpriced, vec!["mystery".to_string()]);
    }
}
