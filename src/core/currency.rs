//! Currency conversion abstractions and the USD-pivot conversion engine

use crate::core::deserialize_opt_timestamp;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;

/// Every conversion pivots through this currency.
pub const BASE_CURRENCY: &str = "USD";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyPreferences {
    pub default_currency: String,
    #[serde(default)]
    pub display_secondary: bool,
    pub secondary_currency: String,
}

impl Default for CurrencyPreferences {
    fn default() -> Self {
        Self {
            default_currency: BASE_CURRENCY.to_string(),
            display_secondary: false,
            secondary_currency: BASE_CURRENCY.to_string(),
        }
    }
}

/// 1 unit of the base currency equals `rate` units of `to_currency`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    pub to_currency: String,
    pub rate: f64,
    #[serde(default, deserialize_with = "deserialize_opt_timestamp")]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableCurrency {
    pub code: String,
    pub name: String,
    pub symbol: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionRequest {
    pub amount: f64,
    pub from_currency: String,
    pub to_currency: String,
}

/// Conversion computed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteConversion {
    pub converted_amount: f64,
    pub exchange_rate: f64,
    #[serde(default, deserialize_with = "deserialize_opt_timestamp")]
    pub conversion_date: Option<DateTime<Utc>>,
}

/// Snapshot of rates quoted against a single base currency.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    pub base: String,
    pub rates: HashMap<String, f64>,
}

impl RateTable {
    /// Builds a table, dropping non-positive and non-finite rates.
    pub fn from_rates(base: &str, rates: &[ExchangeRate]) -> Self {
        let rates = rates
            .iter()
            .filter(|r| r.rate.is_finite() && r.rate > 0.0)
            .map(|r| (normalize_code(&r.to_currency), r.rate))
            .collect();
        Self {
            base: normalize_code(base),
            rates,
        }
    }

    pub fn get(&self, code: &str) -> Option<f64> {
        let code = normalize_code(code);
        if code == self.base {
            return Some(1.0);
        }
        self.rates.get(&code).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnconvertedReason {
    MissingRate(String),
}

impl Display for UnconvertedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnconvertedReason::MissingRate(code) => write!(f, "no exchange rate for {code}"),
        }
    }
}

/// Outcome of a local conversion. A missing rate is not an error: the amount
/// is passed through unchanged and tagged so callers can tell.
#[derive(Debug, Clone, PartialEq)]
pub enum Conversion {
    Converted(f64),
    Unconverted {
        amount: f64,
        reason: UnconvertedReason,
    },
}

impl Conversion {
    pub fn value(&self) -> f64 {
        match self {
            Conversion::Converted(v) => *v,
            Conversion::Unconverted { amount, .. } => *amount,
        }
    }

    pub fn is_converted(&self) -> bool {
        matches!(self, Conversion::Converted(_))
    }
}

pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Converts `amount` between two currencies, always through USD.
pub fn convert(amount: f64, from: &str, to: &str, rates: &RateTable) -> Conversion {
    let from = normalize_code(from);
    let to = normalize_code(to);

    if from == to {
        return Conversion::Converted(amount);
    }

    let missing = |code: &str| Conversion::Unconverted {
        amount,
        reason: UnconvertedReason::MissingRate(code.to_string()),
    };

    if from == BASE_CURRENCY {
        return match rates.get(&to) {
            Some(rate) => Conversion::Converted(amount * rate),
            None => missing(&to),
        };
    }

    let usd_amount = match rates.get(&from) {
        Some(rate) => amount / rate,
        None => return missing(&from),
    };
    if to == BASE_CURRENCY {
        return Conversion::Converted(usd_amount);
    }
    match rates.get(&to) {
        Some(rate) => Conversion::Converted(usd_amount * rate),
        None => missing(&to),
    }
}

/// Server-side currency endpoints.
#[async_trait]
pub trait CurrencyService: Send + Sync {
    async fn get_preferences(&self) -> Result<CurrencyPreferences>;
    async fn update_preferences(&self, prefs: &CurrencyPreferences)
    -> Result<CurrencyPreferences>;
    async fn get_rates(&self, base: &str) -> Result<Vec<ExchangeRate>>;
    async fn convert_remote(&self, request: &ConversionRequest) -> Result<RemoteConversion>;
    async fn available_currencies(&self) -> Result<Vec<AvailableCurrency>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn rate(code: &str, rate: f64) -> ExchangeRate {
        ExchangeRate {
            to_currency: code.to_string(),
            rate,
            valid_from: None,
            source: "test".to_string(),
        }
    }

    fn table() -> RateTable {
        RateTable::from_rates(
            "USD",
            &[rate("EUR", 0.9), rate("JPY", 150.0), rate("INR", 83.0)],
        )
    }

    #[test]
    fn test_identity_conversion() {
        let rates = table();
        for code in ["USD", "EUR", "JPY", "XYZ"] {
            assert_eq!(convert(123.45, code, code, &rates), Conversion::Converted(123.45));
        }
        assert_eq!(
            convert(10.0, "EUR", "EUR", &RateTable::default()),
            Conversion::Converted(10.0)
        );
    }

    #[test]
    fn test_usd_to_other() {
        assert_eq!(convert(100.0, "USD", "EUR", &table()).value(), 90.0);
    }

    #[test]
    fn test_other_to_usd() {
        assert!((convert(150.0, "JPY", "USD", &table()).value() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cross_conversion_pivots_through_usd() {
        let result = convert(90.0, "EUR", "JPY", &table());
        assert!(result.is_converted());
        assert!((result.value() - 15000.0).abs() < 1e-6);
    }

    #[test]
    fn test_round_trip_through_usd() {
        let rates = table();
        for code in ["EUR", "JPY", "INR"] {
            let there = convert(42.5, "USD", code, &rates).value();
            let back = convert(there, code, "USD", &rates).value();
            assert!((back - 42.5).abs() < 1e-9, "round trip via {code}");
        }
    }

    #[test]
    fn test_missing_rate_falls_back_to_amount() {
        let rates = table();

        let result = convert(100.0, "USD", "GBP", &rates);
        assert_eq!(
            result,
            Conversion::Unconverted {
                amount: 100.0,
                reason: UnconvertedReason::MissingRate("GBP".to_string()),
            }
        );

        // Missing source leg
        assert_eq!(convert(100.0, "GBP", "EUR", &rates).value(), 100.0);
        // Missing target leg returns the original amount, not the USD value
        let result = convert(90.0, "EUR", "GBP", &rates);
        assert!(!result.is_converted());
        assert_eq!(result.value(), 90.0);
    }

    #[test]
    fn test_codes_are_case_insensitive() {
        assert_eq!(convert(100.0, "usd", "eur", &table()).value(), 90.0);
        assert_eq!(convert(5.0, "eur", "EUR", &table()), Conversion::Converted(5.0));
    }

    #[test]
    fn test_invalid_rates_are_dropped() {
        let rates = RateTable::from_rates(
            "usd",
            &[rate("EUR", 0.0), rate("GBP", -1.0), rate("CHF", f64::NAN), rate("cad", 1.3)],
        );
        assert_eq!(rates.base, "USD");
        assert_eq!(rates.get("EUR"), None);
        assert_eq!(rates.get("GBP"), None);
        assert_eq!(rates.get("CHF"), None);
        assert_eq!(rates.get("CAD"), Some(1.3));
        assert_eq!(rates.get("USD"), Some(1.0));
    }

    #[test]
    fn test_preferences_wire_format() {
        let json = r#"{"defaultCurrency":"EUR","displaySecondary":true,"secondaryCurrency":"USD"}"#;
        let prefs: CurrencyPreferences = serde_json::from_str(json).unwrap();
        assert_eq!(prefs.default_currency, "EUR");
        assert!(prefs.display_secondary);
        assert_eq!(prefs.secondary_currency, "USD");
    }

    #[test]
    fn test_exchange_rate_wire_format() {
        let json = r#"[{"toCurrency":"EUR","rate":0.92,"validFrom":"2024-05-01T00:00:00Z","source":"ecb"}]"#;
        let rates: Vec<ExchangeRate> = serde_json::from_str(json).unwrap();
        assert_eq!(rates[0].to_currency, "EUR");
        assert_eq!(rates[0].rate, 0.92);
        assert_eq!(rates[0].source, "ecb");
        assert!(rates[0].valid_from.is_some());
    }

    #[test]
    fn test_exchange_rate_lenient_timestamps() {
        let json = r#"[
            {"toCurrency":"EUR","rate":0.92,"validFrom":"2024-05-01T00:00:00"},
            {"toCurrency":"JPY","rate":155.0,"validFrom":null},
            {"toCurrency":"GBP","rate":0.79,"validFrom":"last tuesday"},
            {"toCurrency":"CHF","rate":0.88}
        ]"#;
        let rates: Vec<ExchangeRate> = serde_json::from_str(json).unwrap();
        assert_eq!(rates.len(), 4);
        assert_eq!(
            rates[0].valid_from,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap())
        );
        assert!(rates[1..].iter().all(|r| r.valid_from.is_none()));

        // Cached copies round-trip through serde_json.
        let cached = serde_json::to_string(&rates).unwrap();
        let restored: Vec<ExchangeRate> = serde_json::from_str(&cached).unwrap();
        assert_eq!(restored, rates);
    }

    #[test]
    fn test_remote_conversion_wire_format() {
        let json = r#"{"convertedAmount":92.5,"exchangeRate":0.925,"conversionDate":"2025-06-30T10:00:00"}"#;
        let result: RemoteConversion = serde_json::from_str(json).unwrap();
        assert_eq!(result.converted_amount, 92.5);
        assert_eq!(
            result.conversion_date,
            Some(Utc.with_ymd_and_hms(2025, 6, 30, 10, 0, 0).unwrap())
        );

        let json = r#"{"convertedAmount":1.0,"exchangeRate":1.0}"#;
        let result: RemoteConversion = serde_json::from_str(json).unwrap();
        assert!(result.conversion_date.is_none());
    }
}
