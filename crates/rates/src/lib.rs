//! Onramp Rates Crate
//!
//! Supplies the fiat price of a token for the on/off-ramp flows.
//!
//! # Overview
//!
//! ```text
//! +------------------+     +------------------+     +------------------+
//! |  RateSource      | --> |    RateCache     | --> | RateSubscription |
//! | (HTTP backend)   |     | (TTL + coalesce) |     | (timer + state)  |
//! +------------------+     +------------------+     +------------------+
//!                                                            |
//!                                                            v
//!                                                   effective rate
//!                                                   (live or fallback)
//! ```
//!
//! - [`RateSource`] fetches rates; [`HttpRateSource`] talks to the backend.
//! - [`fetch_exchange_rate`] / [`fetch_exchange_rates`] collapse every failure
//!   into "no rate".
//! - [`RateCache`] serves fresh entries and shares one in-flight fetch per token.
//! - [`RateSubscription`] keeps a token's rate current and exposes the
//!   effective rate with fallback.
//! - [`fiat_to_token`] / [`token_to_fiat`] convert amounts.

pub mod cache;
pub mod convert;
pub mod errors;
pub mod fetch;
pub mod models;
pub mod source;
pub mod subscription;

pub use cache::{RateCache, DEFAULT_CACHE_TTL};
pub use convert::{fiat_to_token, token_to_fiat};
pub use errors::RateError;
pub use fetch::{fetch_exchange_rate, fetch_exchange_rates};
pub use models::{normalize_token, ExchangeRate};
pub use source::{HttpRateSource, RateSource};
pub use subscription::{
    RateState, RateStatus, RateSubscription, SubscriptionOptions, DEFAULT_FALLBACK_RATE,
    DEFAULT_REFRESH_INTERVAL,
};
