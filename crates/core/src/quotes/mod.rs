//! Ramp quotes: the effective exchange rate joined with the fee schedule.
//!
//! ```text
//! QuoteService -> RateCache (onramp-rates) -> RateSource
//!      |
//!      v
//! fee calculator -> RampQuote
//! ```

mod quotes_model;
mod quotes_service;
mod quotes_traits;

pub use quotes_model::{EffectiveRate, QuoteRequest, RampQuote, RateOrigin};
pub use quotes_service::QuoteService;
pub use quotes_traits::QuoteServiceTrait;
