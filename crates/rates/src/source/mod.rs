//! Rate source trait definitions.
//!
//! A rate source answers "how many fiat units is one token worth right now".
//! The production implementation is [`HttpRateSource`], which talks to the
//! backend exchange-rate endpoints; tests plug in their own.

mod http;

pub use http::HttpRateSource;

use async_trait::async_trait;

use crate::errors::RateError;
use crate::models::ExchangeRate;

/// Trait for exchange rate sources.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Identifier used in logs, e.g. "BACKEND".
    fn id(&self) -> &'static str;

    /// Fetch the current rate for a single token.
    ///
    /// The returned rate must be for `token` (case-insensitive) and positive.
    async fn fetch_rate(&self, token: &str) -> Result<ExchangeRate, RateError>;

    /// Fetch rates for several tokens in one round trip.
    ///
    /// May return fewer rates than requested. The default implementation
    /// fetches one token at a time and keeps whatever succeeded; if nothing
    /// succeeded it reports [`RateError::Unavailable`].
    async fn fetch_rates(&self, tokens: &[String]) -> Result<Vec<ExchangeRate>, RateError> {
        let mut rates = Vec::with_capacity(tokens.len());
        for token in tokens {
            match self.fetch_rate(token).await {
                Ok(rate) => rates.push(rate),
                Err(e) => log::debug!("{}: skipping {}: {}", self.id(), token, e),
            }
        }
        if rates.is_empty() && !tokens.is_empty() {
            return Err(RateError::Unavailable(tokens.join(", ")));
        }
        Ok(rates)
    }
}
