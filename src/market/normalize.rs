//! Provider-to-canonical normalization table
//!
//! Each `(ProviderKind, ResponseShape)` pair maps to one pure function from the
//! provider's native JSON to a canonical `MarketData`. Pairs without an entry
//! are decoded as canonical JSON unchanged, which is how CoinGecko (the
//! reference provider) and unknown providers are handled.

use serde::{de, Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;

use super::{coincap, coinpaprika, etherscan, MarketData, ProviderKind, ResponseShape};
use crate::error::FetchError;

/// A pure transform from a provider payload to canonical data
pub type NormalizeFn = fn(&Value) -> Result<MarketData, FetchError>;

/// Lookup table of normalizers
#[derive(Debug, Clone)]
pub struct Normalizers {
    table: HashMap<(ProviderKind, ResponseShape), NormalizeFn>,
}

impl Default for Normalizers {
    /// Table with the CoinCap, CoinPaprika and Etherscan normalizers registered
    fn default() -> Self {
        let mut normalizers = Self::empty();
        coincap::register(&mut normalizers);
        coinpaprika::register(&mut normalizers);
        etherscan::register(&mut normalizers);
        normalizers
    }
}

impl Normalizers {
    /// Table with no entries; every payload passes through as canonical
    pub fn empty() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    /// Adds or replaces the normalizer for a provider and shape
    pub fn register(&mut self, provider: ProviderKind, shape: ResponseShape, f: NormalizeFn) {
        self.table.insert((provider, shape), f);
    }

    pub fn contains(&self, provider: &ProviderKind, shape: ResponseShape) -> bool {
        self.table.contains_key(&(provider.clone(), shape))
    }

    /// Normalizes `payload` into the canonical form of `shape`
    pub fn normalize(
        &self,
        provider: &ProviderKind,
        shape: ResponseShape,
        payload: &Value,
    ) -> Result<MarketData, FetchError> {
        match self.table.get(&(provider.clone(), shape)) {
            Some(normalize) => normalize(payload),
            None => MarketData::decode(shape, payload),
        }
    }
}

/// Accepts a number, a numeric string, or null/empty (as `None`)
pub(crate) fn de_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(deserializer)?;
    match v {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) => {
            if s.trim().is_empty() {
                Ok(None)
            } else {
                s.trim().parse::<f64>().map(Some).map_err(|_| {
                    de::Error::custom(format!("could not parse f64 from string: {s}"))
                })
            }
        }
        Some(other) => Err(de::Error::custom(format!(
            "expected number or string, got: {other}"
        ))),
    }
}

/// Like `de_opt_f64`, with missing values read as zero
pub(crate) fn de_f64_lenient<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    de_opt_f64(deserializer).map(|v| v.unwrap_or(0.0))
}
