use rust_decimal::{Decimal, RoundingStrategy};

use super::fees_model::{fee_percentage, DisplayCurrency, FeeCalculation, FeeConfig, RampDirection};

/// Computes the service fee and resulting amounts with the default fee schedule.
///
/// - `amount`: what the user spends (fiat) on on-ramp, or sells (tokens) on off-ramp
/// - `receive_amount`: fiat the user would receive before fees; off-ramp only
/// - `exchange_rate`: fiat per token
pub fn calculate_fees(
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
        &FeeConfig::default(),
    )
}

/// [`calculate_fees`] with an explicit fee schedule.
///
/// Total over its inputs: non-positive amounts or rates give the zero result.
pub fn calculate_fees_with_config(
    amount: Decimal,
    direction: RampDirection,
    receive_amount: Decimal,
    exchange_rate: Decimal,
    config: &FeeConfig,
) -> FeeCalculation {
    if amount <= Decimal::ZERO || exchange_rate <= Decimal::ZERO {
        return FeeCalculation::zero(direction, config);
    }

    let calculation = match direction {
        RampDirection::OnRamp => onramp_fees(amount, exchange_rate, config),
        RampDirection::OffRamp => offramp_fees(amount, receive_amount, exchange_rate, config),
    };

    calculation.unwrap_or_else(|| {
        log::warn!(
            "Fee calculation overflowed for {} amount={} rate={}",
            direction,
            amount,
            exchange_rate
        );
        FeeCalculation::zero(direction, config)
    })
}

fn onramp_fees(amount: Decimal, exchange_rate: Decimal, config: &FeeConfig) -> Option<FeeCalculation> {
    let raw_fee = amount.checked_mul(config.onramp_rate)?;
    // On-ramp fees are whole fiat units.
    let service_fee = raw_fee
        .max(config.minimum_fee)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let net_fiat_amount = amount.checked_sub(service_fee)?;
    let crypto_amount = net_fiat_amount.checked_div(exchange_rate)?;

    Some(FeeCalculation {
        service_fee,
        total_fee: service_fee,
        fee_rate: config.onramp_rate,
        net_amount: net_fiat_amount,
        percentage: fee_percentage(config.onramp_rate),
        display_amount: amount,
        display_currency: DisplayCurrency::Fiat,
        crypto_amount,
    })
}

fn offramp_fees(
    amount: Decimal,
    receive_amount: Decimal,
    exchange_rate: Decimal,
    config: &FeeConfig,
) -> Option<FeeCalculation> {
    let value_in_fiat = amount.checked_mul(exchange_rate)?;
    let fee_in_fiat = value_in_fiat
        .checked_mul(config.offramp_rate)?
        .max(config.minimum_fee);
    // Off-ramp fees stay fractional, in token units.
    let fee_in_crypto = fee_in_fiat.checked_div(exchange_rate)?;
    let net_amount = receive_amount
        .checked_sub(fee_in_fiat)?
        .max(Decimal::ZERO);

    Some(FeeCalculation {
        service_fee: fee_in_crypto,
        total_fee: fee_in_crypto,
        fee_rate: config.offramp_rate,
        net_amount,
        percentage: fee_percentage(config.offramp_rate),
        display_amount: amount,
        display_currency: DisplayCurrency::Token,
        crypto_amount: amount,
    })
}
