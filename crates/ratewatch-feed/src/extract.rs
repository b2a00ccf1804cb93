//! Value extraction from raw feed payloads.
//!
//! An extractor maps a parsed JSON body to one numeric observation. `None`
//! means the payload could not be parsed into a meaningful value; zero is a
//! legitimate observation and is reported as `Some(Decimal::ZERO)`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// Extraction function mapping a payload to a numeric value.
pub trait Extract: Send + Sync {
    fn extract(&self, body: &Value) -> Option<Decimal>;
}

impl<F> Extract for F
where
    F: Fn(&Value) -> Option<Decimal> + Send + Sync,
{
    fn extract(&self, body: &Value) -> Option<Decimal> {
        self(body)
    }
}

/// Declarative extractor, configurable from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExtractorSpec {
    /// Follow a JSON Pointer to a numeric field, e.g. `/btc_usd/last`.
    Pointer { path: String },
    /// Scan a top-level array for the entry whose `match_field` equals
    /// `match_value` and take its `take` field. Covers ticker lists such as
    /// the bitcoincharts markets payload.
    ArrayLookup {
        match_field: String,
        match_value: String,
        take: String,
    },
}

impl Extract for ExtractorSpec {
    fn extract(&self, body: &Value) -> Option<Decimal> {
        match self {
            ExtractorSpec::Pointer { path } => body.pointer(path).and_then(decimal_from_value),
            ExtractorSpec::ArrayLookup {
                match_field,
                match_value,
                take,
            } => body
                .as_array()?
                .iter()
                .find(|entry| {
                    entry
                        .get(match_field)
                        .and_then(Value::as_str)
                        .is_some_and(|v| v == match_value)
                })?
                .get(take)
                .and_then(decimal_from_value),
        }
    }
}

/// Parse a JSON number or numeric string into a `Decimal`.
fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_pointer_extracts_number() {
        let spec = ExtractorSpec::Pointer {
            path: "/btc_usd/last".to_string(),
        };
        let body = json!({"btc_usd": {"last": 2513.4}});
        assert_eq!(spec.extract(&body), Some(dec!(2513.4)));
    }

    #[test]
    fn test_pointer_extracts_numeric_string() {
        let spec = ExtractorSpec::Pointer {
            path: "/last".to_string(),
        };
        let body = json!({"last": "2513.40"});
        assert_eq!(spec.extract(&body), Some(dec!(2513.40)));
    }

    #[test]
    fn test_pointer_missing_field_is_none() {
        let spec = ExtractorSpec::Pointer {
            path: "/btc_usd/last".to_string(),
        };
        assert_eq!(spec.extract(&json!({"eur_usd": {"last": 1.1}})), None);
        assert_eq!(spec.extract(&json!("garbage")), None);
    }

    #[test]
    fn test_zero_is_extracted_as_present() {
        let spec = ExtractorSpec::Pointer {
            path: "/last".to_string(),
        };
        assert_eq!(spec.extract(&json!({"last": 0})), Some(Decimal::ZERO));
    }

    #[test]
    fn test_array_lookup() {
        let spec = ExtractorSpec::ArrayLookup {
            match_field: "symbol".to_string(),
            match_value: "localbtcUSD".to_string(),
            take: "avg".to_string(),
        };
        let body = json!([
            {"symbol": "krakenUSD", "avg": 2500.0},
            {"symbol": "localbtcUSD", "avg": 2613.25},
        ]);
        assert_eq!(spec.extract(&body), Some(dec!(2613.25)));
    }

    #[test]
    fn test_array_lookup_no_match_is_none() {
        let spec = ExtractorSpec::ArrayLookup {
            match_field: "symbol".to_string(),
            match_value: "localbtcUSD".to_string(),
            take: "avg".to_string(),
        };
        assert_eq!(spec.extract(&json!([{"symbol": "krakenUSD", "avg": 1.0}])), None);
        assert_eq!(spec.extract(&json!({"symbol": "localbtcUSD"})), None);
    }

    #[test]
    fn test_closure_extractor() {
        let extractor = |body: &Value| body.get("v").and_then(|v| v.as_i64()).map(Decimal::from);
        assert_eq!(extractor.extract(&json!({"v": 7})), Some(dec!(7)));
    }

    #[test]
    fn test_spec_deserializes_from_toml() {
        let spec: ExtractorSpec =
            toml::from_str(r#"type = "pointer"
path = "/btc_usd/last""#)
                .unwrap();
        assert_eq!(
            spec,
            ExtractorSpec::Pointer {
                path: "/btc_usd/last".to_string()
            }
        );
    }
}
