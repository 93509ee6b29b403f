use std::time::Duration;

use onramp_rates::{
    normalize_token, SubscriptionOptions, DEFAULT_FALLBACK_RATE, DEFAULT_REFRESH_INTERVAL,
};
use rust_decimal::Decimal;

use crate::constants::{DEFAULT_TOKEN, DEFAULT_WATCHED_TOKENS};
use crate::errors::{Error, Result};
use crate::fees::FeeConfig;

/// Runtime settings for quoting.
#[derive(Debug, Clone)]
pub struct RampSettings {
    pub fees: FeeConfig,
    /// Fiat per token used when no live rate can be fetched.
    pub fallback_rate: Decimal,
    pub refresh_interval: Duration,
    /// How long a fetched rate is served before refetching.
    pub cache_ttl: Duration,
    pub default_token: String,
    /// Tokens refreshed in the background regardless of traffic.
    pub watched_tokens: Vec<String>,
}

impl Default for RampSettings {
    fn default() -> Self {
        Self {
            fees: FeeConfig::default(),
            fallback_rate: DEFAULT_FALLBACK_RATE,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            cache_ttl: DEFAULT_REFRESH_INTERVAL,
            default_token: DEFAULT_TOKEN.to_string(),
            watched_tokens: DEFAULT_WATCHED_TOKENS
                .iter()
                .map(|t| t.to_string())
                .collect(),
        }
    }
}

impl RampSettings {
    pub fn validate(&self) -> Result<()> {
        self.fees.validate()?;

        if self.fallback_rate <= Decimal::ZERO {
            return Err(Error::InvalidConfigValue(format!(
                "fallback rate must be positive, got {}",
                self.fallback_rate
            )));
        }
        if self.refresh_interval.is_zero() {
            return Err(Error::InvalidConfigValue(
                "refresh interval must be non-zero".to_string(),
            ));
        }
        if normalize_token(&self.default_token).is_empty() {
            return Err(Error::MissingConfigKey("default_token".to_string()));
        }
        Ok(())
    }

    pub fn subscription_options(&self) -> SubscriptionOptions {
        SubscriptionOptions {
            fallback_rate: self.fallback_rate,
            refresh_interval: self.refresh_interval,
        }
    }

    /// Watched tokens, normalized and de-duplicated.
    pub fn watched(&self) -> Vec<String> {
        let mut tokens: Vec<String> = Vec::new();
        for token in self.watched_tokens.iter().map(|t| normalize_token(t)) {
            if !token.is_empty() && !tokens.contains(&token) {
                tokens.push(token);
            }
        }
        tokens
    }
}
