//! Service fee calculation for on-ramp and off-ramp conversions.

mod fee_calculator;
mod fees_model;

pub use fee_calculator::{calculate_fees, calculate_fees_with_config};
pub use fees_model::{fee_percentage, DisplayCurrency, FeeCalculation, FeeConfig, RampDirection};
