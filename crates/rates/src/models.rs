use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::RateError;

/// Normalizes a token symbol into its cache key form ("usdt " -> "USDT").
pub fn normalize_token(token: &str) -> String {
    token.trim().to_uppercase()
}

/// Fiat price of one unit of a token.
///
/// Immutable once built: a refresh produces a new value that replaces the
/// old one wholesale.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    pub token: String,
    /// Fiat units per 1 token, always > 0.
    pub rate: Decimal,
    pub last_updated: DateTime<Utc>,
    pub source: String,
}

impl ExchangeRate {
    pub fn new(
        token: &str,
        rate: Decimal,
        last_updated: DateTime<Utc>,
        source: impl Into<String>,
    ) -> Result<Self, RateError> {
        let token = normalize_token(token);
        if token.is_empty() {
            return Err(RateError::InvalidPayload("empty token symbol".to_string()));
        }
        if rate <= Decimal::ZERO {
            return Err(RateError::InvalidPayload(format!(
                "non-positive rate {} for {}",
                rate, token
            )));
        }
        Ok(Self {
            token,
            rate,
            last_updated,
            source: source.into(),
        })
    }

    /// Case-insensitive symbol comparison.
    pub fn is_for(&self, token: &str) -> bool {
        self.token == normalize_token(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_normalize_token() {
        assert_eq!(normalize_token("usdt"), "USDT");
        assert_eq!(normalize_token("  cNgN "), "CNGN");
    }

    #[test]
    fn test_new_normalizes_symbol() {
        let rate = ExchangeRate::new("usdc", dec!(1520.5), Utc::now(), "backend").unwrap();
        assert_eq!(rate.token, "USDC");
        assert!(rate.is_for("Usdc"));
        assert!(!rate.is_for("USDT"));
    }

    #[test]
    fn test_new_rejects_non_positive_rate() {
        assert!(ExchangeRate::new("USDT", dec!(0), Utc::now(), "backend").is_err());
        assert!(ExchangeRate::new("USDT", dec!(-3), Utc::now(), "backend").is_err());
    }

    #[test]
    fn test_new_rejects_empty_symbol() {
        assert!(ExchangeRate::new("   ", dec!(850), Utc::now(), "backend").is_err());
    }

    #[test]
    fn test_serializes_camel_case() {
        let rate = ExchangeRate::new("USDT", dec!(850), Utc::now(), "backend").unwrap();
        let json = serde_json::to_value(&rate).unwrap();
        assert!(json.get("lastUpdated").is_some());
        assert_eq!(json["token"], "USDT");
        assert_eq!(json["source"], "backend");
    }
}
