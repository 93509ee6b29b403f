//! Error types for exchange rate fetching.
//!
//! Every variant collapses to "rate unavailable" at the fetch boundary
//! (see [`crate::fetch`]); the typed form only exists so sources can log
//! what went wrong.

use thiserror::Error;

/// Errors that can occur while fetching or validating an exchange rate.
#[derive(Error, Debug)]
pub enum RateError {
    /// The request never produced a response (DNS, connect, timeout, TLS).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend answered with a non-success HTTP status.
    #[error("Unexpected HTTP status {status} from {source_id}")]
    HttpStatus {
        /// The source that answered
        source_id: String,
        /// The HTTP status code
        status: u16,
    },

    /// The backend answered `success: false`.
    #[error("Rate source reported failure: {0}")]
    Unsuccessful(String),

    /// The payload did not match the expected schema or failed validation.
    #[error("Invalid rate payload: {0}")]
    InvalidPayload(String),

    /// No rate is known for the token.
    #[error("Exchange rate unavailable for {0}")]
    Unavailable(String),
}

impl RateError {
    /// Whether the failure is likely to clear up on the next refresh tick.
    ///
    /// Only used to pick a log level; nothing retries on its own.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            Self::Unsuccessful(_) | Self::InvalidPayload(_) | Self::Unavailable(_) => false,
        }
    }
}
