use chrono::{DateTime, Utc};
use onramp_rates::ExchangeRate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::fees::{DisplayCurrency, FeeCalculation, RampDirection};

/// Where an effective rate came from.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RateOrigin {
    Live,
    Fallback,
}

/// The rate actually used for conversion.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveRate {
    pub token: String,
    pub effective_rate: Decimal,
    pub origin: RateOrigin,
    /// The fetched rate, when there is one.
    pub rate: Option<ExchangeRate>,
}

impl EffectiveRate {
    pub fn live(rate: ExchangeRate) -> Self {
        Self {
            token: rate.token.clone(),
            effective_rate: rate.rate,
            origin: RateOrigin::Live,
            rate: Some(rate),
        }
    }

    pub fn fallback(token: String, fallback_rate: Decimal) -> Self {
        Self {
            token,
            effective_rate: fallback_rate,
            origin: RateOrigin::Fallback,
            rate: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub direction: RampDirection,
    /// Defaults to the configured token.
    pub token: Option<String>,
    /// Fiat on on-ramp, tokens on off-ramp.
    pub amount: Decimal,
}

/// What the user pays and receives for one conversion.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RampQuote {
    pub direction: RampDirection,
    pub token: String,
    pub amount: Decimal,
    pub exchange_rate: Decimal,
    pub rate_origin: RateOrigin,
    /// Tokens on on-ramp, fiat on off-ramp; after fees.
    pub receive_amount: Decimal,
    pub receive_currency: DisplayCurrency,
    pub fees: FeeCalculation,
    pub quoted_at: DateTime<Utc>,
}
