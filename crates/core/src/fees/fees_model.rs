use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MINIMUM_FEE, DEFAULT_OFFRAMP_FEE_RATE, DEFAULT_ONRAMP_FEE_RATE};
use crate::errors::{Error, Result, ValidationError};

/// Which way money moves through the ramp.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RampDirection {
    /// Fiat in, token out.
    #[serde(rename = "onramp", alias = "on-ramp")]
    OnRamp,
    /// Token in, fiat out.
    #[serde(rename = "offramp", alias = "off-ramp")]
    OffRamp,
}

impl RampDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnRamp => "onramp",
            Self::OffRamp => "offramp",
        }
    }

    /// Currency the user types the amount in.
    pub fn input_currency(&self) -> DisplayCurrency {
        match self {
            Self::OnRamp => DisplayCurrency::Fiat,
            Self::OffRamp => DisplayCurrency::Token,
        }
    }

    /// Currency the user ends up with.
    pub fn output_currency(&self) -> DisplayCurrency {
        match self {
            Self::OnRamp => DisplayCurrency::Token,
            Self::OffRamp => DisplayCurrency::Fiat,
        }
    }
}

impl fmt::Display for RampDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RampDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "onramp" | "on-ramp" | "buy" => Ok(Self::OnRamp),
            "offramp" | "off-ramp" | "sell" => Ok(Self::OffRamp),
            other => Err(ValidationError::UnknownDirection(other.to_string()).into()),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DisplayCurrency {
    Fiat,
    Token,
}

/// Service fee schedule.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeeConfig {
    /// Fraction of the fiat amount charged on on-ramp (0.005 = 0.5%).
    pub onramp_rate: Decimal,
    /// Fraction of the fiat value charged on off-ramp.
    pub offramp_rate: Decimal,
    /// Floor for the service fee, in fiat units.
    pub minimum_fee: Decimal,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            onramp_rate: DEFAULT_ONRAMP_FEE_RATE,
            offramp_rate: DEFAULT_OFFRAMP_FEE_RATE,
            minimum_fee: DEFAULT_MINIMUM_FEE,
        }
    }
}

impl FeeConfig {
    pub fn rate_for(&self, direction: RampDirection) -> Decimal {
        match direction {
            RampDirection::OnRamp => self.onramp_rate,
            RampDirection::OffRamp => self.offramp_rate,
        }
    }

    /// Fiat amount at which the on-ramp percentage fee equals the minimum fee.
    pub fn onramp_break_even(&self) -> Option<Decimal> {
        self.minimum_fee.checked_div(self.onramp_rate)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, rate) in [
            ("onrampRate", self.onramp_rate),
            ("offrampRate", self.offramp_rate),
        ] {
            if rate.is_sign_negative() || rate >= Decimal::ONE {
                return Err(Error::InvalidConfigValue(format!(
                    "{} must be in [0, 1), got {}",
                    name, rate
                )));
            }
        }
        if self.minimum_fee.is_sign_negative() {
            return Err(Error::InvalidConfigValue(format!(
                "minimumFee must not be negative, got {}",
                self.minimum_fee
            )));
        }
        Ok(())
    }
}

/// Formats a fee rate as a percentage string: 0.005 -> "0.5".
pub fn fee_percentage(rate: Decimal) -> String {
    (rate * Decimal::ONE_HUNDRED).normalize().to_string()
}

/// Result of one fee calculation.
///
/// Units depend on direction: on-ramp fees are fiat, off-ramp fees are token
/// units. `net_amount` is fiat in both directions.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeeCalculation {
    pub service_fee: Decimal,
    pub total_fee: Decimal,
    pub fee_rate: Decimal,
    pub net_amount: Decimal,
    pub percentage: String,
    pub display_amount: Decimal,
    pub display_currency: DisplayCurrency,
    pub crypto_amount: Decimal,
}

impl FeeCalculation {
    /// All-zero result used for non-positive amounts or rates.
    pub fn zero(direction: RampDirection, config: &FeeConfig) -> Self {
        let fee_rate = config.rate_for(direction);
        Self {
            service_fee: Decimal::ZERO,
            total_fee: Decimal::ZERO,
            fee_rate,
            net_amount: Decimal::ZERO,
            percentage: fee_percentage(fee_rate),
            display_amount: Decimal::ZERO,
            display_currency: direction.input_currency(),
            crypto_amount: Decimal::ZERO,
        }
    }
}
