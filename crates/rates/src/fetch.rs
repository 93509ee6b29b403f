//! Fetch boundary: every [`RateError`](crate::errors::RateError) becomes
//! "no rate" here. Callers decide how to fall back.

use crate::models::{normalize_token, ExchangeRate};
use crate::source::RateSource;

/// Fetch the current rate for `token`, or `None` if the source failed in any way.
pub async fn fetch_exchange_rate(source: &dyn RateSource, token: &str) -> Option<ExchangeRate> {
    match source.fetch_rate(token).await {
        Ok(rate) => Some(rate),
        Err(e) if e.is_transient() => {
            log::warn!("{}: rate for {} unavailable: {}", source.id(), token, e);
            None
        }
        Err(e) => {
            log::error!("{}: rate for {} rejected: {}", source.id(), token, e);
            None
        }
    }
}

/// Fetch rates for several tokens. Returns whatever subset succeeded; a total
/// failure is an empty list.
///
/// Only requested tokens come back, each at most once, in the order the
/// source returned them.
pub async fn fetch_exchange_rates(source: &dyn RateSource, tokens: &[String]) -> Vec<ExchangeRate> {
    let mut requested: Vec<String> = Vec::with_capacity(tokens.len());
    for token in tokens.iter().map(|t| normalize_token(t)) {
        if !token.is_empty() && !requested.contains(&token) {
            requested.push(token);
        }
    }
    if requested.is_empty() {
        return Vec::new();
    }

    let fetched = match source.fetch_rates(&requested).await {
        Ok(rates) => rates,
        Err(e) => {
            log::warn!("{}: batch rate fetch failed: {}", source.id(), e);
            return Vec::new();
        }
    };

    let mut rates: Vec<ExchangeRate> = Vec::with_capacity(requested.len());
    for rate in fetched {
        if !requested.contains(&rate.token) {
            log::warn!("{}: dropping unrequested rate for {}", source.id(), rate.token);
        } else if rates.iter().any(|r| r.token == rate.token) {
            log::debug!("{}: dropping duplicate rate for {}", source.id(), rate.token);
        } else {
            rates.push(rate);
        }
    }

    if rates.len() < requested.len() {
        log::warn!(
            "{}: got {} of {} requested rates",
            source.id(),
            rates.len(),
            requested.len()
        );
    }
    rates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RateError;
    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    struct FixedSource;

    #[async_trait]
    impl RateSource for FixedSource {
        fn id(&self) -> &'static str {
            "FIXED"
        }

        async fn fetch_rate(&self, token: &str) -> Result<ExchangeRate, RateError> {
            match token {
                "USDT" => ExchangeRate::new(token, dec!(850), Utc::now(), "fixed"),
                "DOWN" => Err(RateError::HttpStatus {
                    source_id: "FIXED".to_string(),
                    status: 503,
                }),
                _ => Err(RateError::Unsuccessful(format!("{} not listed", token))),
            }
        }
    }

    struct BrokenBatchSource;

    #[async_trait]
    impl RateSource for BrokenBatchSource {
        fn id(&self) -> &'static str {
            "BROKEN"
        }

        async fn fetch_rate(&self, token: &str) -> Result<ExchangeRate, RateError> {
            Err(RateError::Unavailable(token.to_string()))
        }

        async fn fetch_rates(&self, _tokens: &[String]) -> Result<Vec<ExchangeRate>, RateError> {
            Err(RateError::InvalidPayload("not json".to_string()))
        }
    }

    #[tokio::test]
    async fn test_fetch_single_success() {
        let rate = fetch_exchange_rate(&FixedSource, "USDT").await.unwrap();
        assert_eq!(rate.rate, dec!(850));
    }

    #[tokio::test]
    async fn test_fetch_single_collapses_errors_to_none() {
        assert!(fetch_exchange_rate(&FixedSource, "DOWN").await.is_none());
        assert!(fetch_exchange_rate(&FixedSource, "XYZ").await.is_none());
    }

    #[tokio::test]
    async fn test_fetch_multiple_returns_partial_results() {
        let tokens = vec!["USDT".to_string(), "XYZ".to_string(), "DOWN".to_string()];
        let rates = fetch_exchange_rates(&FixedSource, &tokens).await;
        assert_eq!(rates.len(), 1);
        assert_eq!(rates[0].token, "USDT");
    }

    #[tokio::test]
    async fn test_fetch_multiple_total_failure_is_empty() {
        let tokens = vec!["USDT".to_string()];
        assert!(fetch_exchange_rates(&BrokenBatchSource, &tokens).await.is_empty());
    }

    /// Answers every batch with extra and repeated entries.
    struct ChattyBatchSource;

    #[async_trait]
    impl RateSource for ChattyBatchSource {
        fn id(&self) -> &'static str {
            "CHATTY"
        }

        async fn fetch_rate(&self, token: &str) -> Result<ExchangeRate, RateError> {
            ExchangeRate::new(token, dec!(850), Utc::now(), "chatty")
        }

        async fn fetch_rates(&self, _tokens: &[String]) -> Result<Vec<ExchangeRate>, RateError> {
            Ok(vec![
                ExchangeRate::new("USDT", dec!(850), Utc::now(), "chatty")?,
                ExchangeRate::new("DAI", dec!(840), Utc::now(), "chatty")?,
                ExchangeRate::new("USDT", dec!(999), Utc::now(), "chatty")?,
                ExchangeRate::new("USDC", dec!(860), Utc::now(), "chatty")?,
            ])
        }
    }

    #[tokio::test]
    async fn test_fetch_multiple_keeps_only_requested_tokens_once() {
        let tokens = vec!["usdt".to_string(), "USDC".to_string(), "USDT".to_string()];
        let rates = fetch_exchange_rates(&ChattyBatchSource, &tokens).await;

        let symbols: Vec<&str> = rates.iter().map(|r| r.token.as_str()).collect();
        assert_eq!(symbols, vec!["USDT", "USDC"]);
        assert_eq!(rates[0].rate, dec!(850));
    }

    #[tokio::test]
    async fn test_default_batch_reports_unavailable_when_nothing_resolves() {
        let tokens = vec!["XYZ".to_string(), "DOWN".to_string()];

        match FixedSource.fetch_rates(&tokens).await {
            Err(RateError::Unavailable(message)) => assert_eq!(message, "XYZ, DOWN"),
            other => panic!("expected Unavailable, got {:?}", other),
        }
        assert!(fetch_exchange_rates(&FixedSource, &tokens).await.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_multiple_empty_request() {
        assert!(fetch_exchange_rates(&FixedSource, &[]).await.is_empty());
    }
}
