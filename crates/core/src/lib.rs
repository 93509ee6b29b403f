//! Onramp Core - fee schedule, quoting, and settings.
//!
//! Exchange rates come from the `onramp-rates` crate; this crate turns a rate
//! and a user-entered amount into what the user pays and receives.

pub mod constants;
pub mod errors;
pub mod fees;
pub mod quotes;
pub mod settings;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
