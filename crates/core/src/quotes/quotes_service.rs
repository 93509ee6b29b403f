use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use onramp_rates::{normalize_token, token_to_fiat, ExchangeRate, RateCache};
use rust_decimal::Decimal;

use super::quotes_model::{EffectiveRate, QuoteRequest, RampQuote};
use super::quotes_traits::QuoteServiceTrait;
use crate::errors::{Result, ValidationError};
use crate::fees::{calculate_fees_with_config, FeeCalculation, FeeConfig, RampDirection};
use crate::settings::RampSettings;

/// Largest number of tokens accepted in one batch lookup.
const MAX_BATCH_TOKENS: usize = 50;

/// Combines the rate cache with the fee calculator.
#[derive(Clone)]
pub struct QuoteService {
    rates: Arc<RateCache>,
    settings: RampSettings,
}

impl QuoteService {
    pub fn new(rates: Arc<RateCache>, settings: RampSettings) -> Self {
        Self { rates, settings }
    }

    pub fn rates(&self) -> Arc<RateCache> {
        Arc::clone(&self.rates)
    }

    fn resolve_token(&self, token: Option<&str>) -> Result<String> {
        let token = normalize_token(token.unwrap_or(&self.settings.default_token));
        if token.is_empty() {
            return Err(ValidationError::MissingField("token".to_string()).into());
        }
        Ok(token)
    }

    fn to_effective(&self, token: String, live: Option<ExchangeRate>) -> EffectiveRate {
        match live {
            Some(rate) => EffectiveRate::live(rate),
            None => {
                log::warn!(
                    "No live rate for {}, using fallback {}",
                    token,
                    self.settings.fallback_rate
                );
                EffectiveRate::fallback(token, self.settings.fallback_rate)
            }
        }
    }
}

#[async_trait]
impl QuoteServiceTrait for QuoteService {
    fn fee_config(&self) -> FeeConfig {
        self.settings.fees
    }

    fn fallback_rate(&self) -> Decimal {
        self.settings.fallback_rate
    }

    fn default_token(&self) -> String {
        normalize_token(&self.settings.default_token)
    }

    fn calculate_fees(
        &self,
        amount: Decimal,
        direction: RampDirection,
        receive_amount: Decimal,
        exchange_rate: Decimal,
    ) -> FeeCalculation {
        calculate_fees_with_config(
            amount,
            direction,
            receive_amount,
            exchange_rate,
            &self.settings.fees,
        )
    }

    async fn effective_rate(&self, token: &str) -> Result<EffectiveRate> {
        let token = self.resolve_token(Some(token))?;
        let live = self.rates.get(&token).await;
        Ok(self.to_effective(token, live))
    }

    async fn refresh_rate(&self, token: &str) -> Result<EffectiveRate> {
        let token = self.resolve_token(Some(token))?;
        let live = self.rates.refresh(&token).await;
        Ok(self.to_effective(token, live))
    }

    async fn exchange_rates(&self, tokens: &[String]) -> Result<Vec<ExchangeRate>> {
        if tokens.len() > MAX_BATCH_TOKENS {
            return Err(ValidationError::InvalidInput(format!(
                "at most {} tokens per request, got {}",
                MAX_BATCH_TOKENS,
                tokens.len()
            ))
            .into());
        }
        Ok(self.rates.get_many(tokens).await)
    }

    async fn quote(&self, request: QuoteRequest) -> Result<RampQuote> {
        if request.amount.is_sign_negative() {
            return Err(ValidationError::InvalidInput(format!(
                "amount must not be negative, got {}",
                request.amount
            ))
            .into());
        }

        let rate = self.effective_rate(&self.resolve_token(request.token.as_deref())?).await?;
        let exchange_rate = rate.effective_rate;

        let (fees, receive_amount) = match request.direction {
            RampDirection::OnRamp => {
                let fees =
                    self.calculate_fees(request.amount, request.direction, Decimal::ZERO, exchange_rate);
                let receive = fees.crypto_amount;
                (fees, receive)
            }
            RampDirection::OffRamp => {
                let gross = token_to_fiat(request.amount, Some(exchange_rate));
                let fees = self.calculate_fees(request.amount, request.direction, gross, exchange_rate);
                let receive = fees.net_amount;
                (fees, receive)
            }
        };

        Ok(RampQuote {
            direction: request.direction,
            token: rate.token,
            amount: request.amount,
            exchange_rate,
            rate_origin: rate.origin,
            receive_amount,
            receive_currency: request.direction.output_currency(),
            fees,
            quoted_at: Utc::now(),
        })
    }
}
