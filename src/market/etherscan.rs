//! Etherscan gas oracle normalizer
//!
//! `?module=gastracker&action=gasoracle` answers 200 even when it refuses a
//! request; success is signalled by `"status": "1"` and failures carry the
//! reason in `result` instead of the price tiers.

use serde::Deserialize;
use serde_json::Value;

use super::normalize::{de_opt_f64, Normalizers};
use super::{GasPrices, MarketData, ProviderKind, ResponseShape};
use crate::error::FetchError;

#[derive(Debug, Deserialize)]
struct Envelope {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: Value,
}

/// Prices are strings in gwei
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GasOracle {
    #[serde(default, deserialize_with = "de_opt_f64")]
    safe_gas_price: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    propose_gas_price: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    fast_gas_price: Option<f64>,
}

/// Adds the Etherscan entries to a normalizer table
pub fn register(normalizers: &mut Normalizers) {
    normalizers.register(ProviderKind::Etherscan, ResponseShape::Gas, normalize_gas);
}

/// Gas oracle to low/average/fast tiers
pub fn normalize_gas(payload: &Value) -> Result<MarketData, FetchError> {
    let envelope = Envelope::deserialize(payload)?;
    if envelope.status != "1" {
        let reason = match &envelope.result {
            Value::String(reason) if !reason.is_empty() => reason.clone(),
            _ => envelope.message,
        };
        return Err(FetchError::Rejected(format!("etherscan: {reason}")));
    }

    let oracle = GasOracle::deserialize(&envelope.result)?;
    Ok(MarketData::Gas(GasPrices {
        low: oracle.safe_gas_price.unwrap_or(0.0),
        average: oracle.propose_gas_price.unwrap_or(0.0),
        fast: oracle.fast_gas_price.unwrap_or(0.0),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_gas_oracle_maps_tiers() {
        let payload = json!({
            "status": "1",
            "message": "OK",
            "result": {
                "LastBlock": "19000000",
                "SafeGasPrice": "12",
                "ProposeGasPrice": "13.5",
                "FastGasPrice": "15",
                "suggestBaseFee": "11.9",
                "gasUsedRatio": "0.4,0.6"
            }
        });

        let gas = normalize_gas(&payload).unwrap().into_gas().unwrap();

        assert_eq!(
            gas,
            GasPrices {
                low: 12.0,
                average: 13.5,
                fast: 15.0
            }
        );
    }

    #[test]
    fn test_non_one_status_is_rejected() {
        let payload = json!({
            "status": "0",
            "message": "NOTOK",
            "result": "Max rate limit reached"
        });

        match normalize_gas(&payload) {
            Err(FetchError::Rejected(reason)) => {
                assert!(reason.contains("Max rate limit reached"), "{reason}")
            }
            other => panic!("expected a rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_rejection_without_reason_uses_message() {
        let payload = json!({"status": "0", "message": "NOTOK"});
        let err = normalize_gas(&payload).unwrap_err();
        assert!(err.to_string().contains("NOTOK"));
    }

    #[test]
    fn test_missing_status_is_parse_error() {
        let payload = json!({"SafeGasPrice": "12"});
        assert!(matches!(normalize_gas(&payload), Err(FetchError::Parse(_))));
    }
}
