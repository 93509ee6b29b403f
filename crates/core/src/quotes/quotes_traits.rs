use async_trait::async_trait;
use onramp_rates::ExchangeRate;
use rust_decimal::Decimal;

use super::quotes_model::{EffectiveRate, QuoteRequest, RampQuote};
use crate::errors::Result;
use crate::fees::{FeeCalculation, FeeConfig, RampDirection};

/// Trait defining the contract for quote operations.
#[async_trait]
pub trait QuoteServiceTrait: Send + Sync {
    fn fee_config(&self) -> FeeConfig;

    fn fallback_rate(&self) -> Decimal;

    fn default_token(&self) -> String;

    /// Pure fee calculation with the service's fee schedule.
    fn calculate_fees(
        &self,
        amount: Decimal,
        direction: RampDirection,
        receive_amount: Decimal,
        exchange_rate: Decimal,
    ) -> FeeCalculation;

    /// Live rate for `token`, or the fallback when unavailable.
    async fn effective_rate(&self, token: &str) -> Result<EffectiveRate>;

    /// Like [`effective_rate`](Self::effective_rate) but bypasses the cache TTL.
    async fn refresh_rate(&self, token: &str) -> Result<EffectiveRate>;

    /// Live rates for several tokens; tokens without one are omitted.
    async fn exchange_rates(&self, tokens: &[String]) -> Result<Vec<ExchangeRate>>;

    async fn quote(&self, request: QuoteRequest) -> Result<RampQuote>;
}
