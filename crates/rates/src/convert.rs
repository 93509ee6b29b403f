//! Fiat/token amount conversion.
//!
//! Both helpers are total: a missing or non-positive rate, or a result that
//! overflows `Decimal`, yields zero and a warning.

use rust_decimal::Decimal;

fn usable_rate(rate: Option<Decimal>, op: &str) -> Option<Decimal> {
    match rate {
        Some(rate) if rate > Decimal::ZERO => Some(rate),
        other => {
            log::warn!("{}: no usable exchange rate ({:?}), returning 0", op, other);
            None
        }
    }
}

fn overflowed(op: &str, amount: Decimal, rate: Decimal) -> Decimal {
    log::warn!("{}: {} at rate {} overflows, returning 0", op, amount, rate);
    Decimal::ZERO
}

/// Converts a fiat amount into token units (`fiat_amount / rate`).
pub fn fiat_to_token(fiat_amount: Decimal, rate: Option<Decimal>) -> Decimal {
    match usable_rate(rate, "fiat_to_token") {
        Some(rate) => fiat_amount
            .checked_div(rate)
            .unwrap_or_else(|| overflowed("fiat_to_token", fiat_amount, rate)),
        None => Decimal::ZERO,
    }
}

/// Converts a token amount into fiat (`token_amount * rate`).
pub fn token_to_fiat(token_amount: Decimal, rate: Option<Decimal>) -> Decimal {
    match usable_rate(rate, "token_to_fiat") {
        Some(rate) => token_amount
            .checked_mul(rate)
            .unwrap_or_else(|| overflowed("token_to_fiat", token_amount, rate)),
        None => Decimal::ZERO,
    }
}
