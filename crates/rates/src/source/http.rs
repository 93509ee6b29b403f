//! Backend exchange-rate API client.
//!
//! Endpoints:
//! - `GET  {base}/api/exchange-rates?token=<SYMBOL>` -> `{ success, data?: Rate, error? }`
//! - `POST {base}/api/exchange-rates` with `{ tokens: [...] }` -> `{ success, data?: Rate[], error? }`
//!
//! Responses are decoded into typed envelopes and validated here, so nothing
//! past this module ever sees untyped JSON.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::RateSource;
use crate::errors::RateError;
use crate::models::{normalize_token, ExchangeRate};

/// Provider ID constant
const SOURCE_ID: &str = "BACKEND";

/// Path of the exchange-rate resource, relative to the base URL.
const RATES_PATH: &str = "/api/exchange-rates";

/// Source label used when the payload omits one.
const DEFAULT_SOURCE_LABEL: &str = "backend";

/// Default HTTP request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RatePayload {
    token: String,
    rate: Decimal,
    last_updated: Option<DateTime<Utc>>,
    source: Option<String>,
}

impl RatePayload {
    fn into_rate(self) -> Result<ExchangeRate, RateError> {
        ExchangeRate::new(
            &self.token,
            self.rate,
            self.last_updated.unwrap_or_else(Utc::now),
            self.source
                .unwrap_or_else(|| DEFAULT_SOURCE_LABEL.to_string()),
        )
    }
}

#[derive(Debug, Serialize)]
struct BatchRequest<'a> {
    tokens: &'a [String],
}

/// HTTP client for the backend exchange-rate endpoints.
pub struct HttpRateSource {
    client: Client,
    base_url: String,
}

impl HttpRateSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self::with_client(client, base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, RATES_PATH)
    }

    async fn read_body(response: reqwest::Response) -> Result<String, RateError> {
        let status = response.status();
        if !status.is_success() {
            return Err(RateError::HttpStatus {
                source_id: SOURCE_ID.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}

/// Decodes and validates a single-rate response for `requested`.
pub(crate) fn decode_single(requested: &str, body: &str) -> Result<ExchangeRate, RateError> {
    let envelope: ApiEnvelope<RatePayload> =
        serde_json::from_str(body).map_err(|e| RateError::InvalidPayload(e.to_string()))?;

    if !envelope.success {
        return Err(RateError::Unsuccessful(
            envelope
                .error
                .unwrap_or_else(|| "no error message".to_string()),
        ));
    }

    let rate = envelope
        .data
        .ok_or_else(|| RateError::InvalidPayload("missing data".to_string()))?
        .into_rate()?;

    if !rate.is_for(requested) {
        return Err(RateError::InvalidPayload(format!(
            "asked for {}, got {}",
            normalize_token(requested),
            rate.token
        )));
    }

    Ok(rate)
}

/// Decodes a batch response, dropping entries that fail validation.
pub(crate) fn decode_batch(body: &str) -> Result<Vec<ExchangeRate>, RateError> {
    let envelope: ApiEnvelope<Vec<Value>> =
        serde_json::from_str(body).map_err(|e| RateError::InvalidPayload(e.to_string()))?;

    if !envelope.success {
        return Err(RateError::Unsuccessful(
            envelope
                .error
                .unwrap_or_else(|| "no error message".to_string()),
        ));
    }

    let entries = envelope
        .data
        .ok_or_else(|| RateError::InvalidPayload("missing data".to_string()))?;

    let rates = entries
        .into_iter()
        .filter_map(|entry| {
            match serde_json::from_value::<RatePayload>(entry)
                .map_err(|e| RateError::InvalidPayload(e.to_string()))
                .and_then(RatePayload::into_rate)
            {
                Ok(rate) => Some(rate),
                Err(e) => {
                    log::warn!("{}: dropping batch entry: {}", SOURCE_ID, e);
                    None
                }
            }
        })
        .collect();

    Ok(rates)
}

#[async_trait]
impl RateSource for HttpRateSource {
    fn id(&self) -> &'static str {
        SOURCE_ID
    }

    async fn fetch_rate(&self, token: &str) -> Result<ExchangeRate, RateError> {
        let symbol = normalize_token(token);
        let response = self
            .client
            .get(self.endpoint())
            .query(&[("token", symbol.as_str())])
            .send()
            .await?;

        let body = Self::read_body(response).await?;
        decode_single(&symbol, &body)
    }

    async fn fetch_rates(&self, tokens: &[String]) -> Result<Vec<ExchangeRate>, RateError> {
        let symbols: Vec<String> = tokens.iter().map(|t| normalize_token(t)).collect();
        let response = self
            .client
            .post(self.endpoint())
            .json(&BatchRequest { tokens: &symbols })
            .send()
            .await?;

        let body = Self::read_body(response).await?;
        decode_batch(&body)
    }
}
