//! Property-based tests for the fee calculator.
//!
//! These tests verify that the fee laws hold across generated amounts and
//! exchange rates, using the `proptest` crate for random test case generation.

use onramp_core::fees::{
    calculate_fees, calculate_fees_with_config, DisplayCurrency, FeeCalculation, FeeConfig,
    RampDirection,
};
use proptest::prelude::*;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

// =============================================================================
// Generators
// =============================================================================

/// Positive fiat amount with kobo precision, up to 100 million.
fn arb_fiat_amount() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Positive token amount with 6 decimal places, up to 100 thousand.
fn arb_token_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000_000i64).prop_map(|n| Decimal::new(n, 6))
}

/// Positive exchange rate between 0.01 and 50,000 fiat per token.
fn arb_rate() -> impl Strategy<Value = Decimal> {
    (1i64..5_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Zero or negative value.
fn arb_non_positive() -> impl Strategy<Value = Decimal> {
    (-10_000_000i64..=0i64).prop_map(|n| Decimal::new(n, 2))
}

fn arb_direction() -> impl Strategy<Value = RampDirection> {
    prop_oneof![Just(RampDirection::OnRamp), Just(RampDirection::OffRamp)]
}

fn assert_all_zero(calc: &FeeCalculation) {
    assert_eq!(calc.service_fee, Decimal::ZERO);
    assert_eq!(calc.total_fee, Decimal::ZERO);
    assert_eq!(calc.net_amount, Decimal::ZERO);
    assert_eq!(calc.display_amount, Decimal::ZERO);
    assert_eq!(calc.crypto_amount, Decimal::ZERO);
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn non_positive_amount_gives_zero_result(
        amount in arb_non_positive(),
        rate in arb_rate(),
        receive in arb_fiat_amount(),
        direction in arb_direction(),
    ) {
        let calc = calculate_fees(amount, direction, receive, rate);
        assert_all_zero(&calc);
        prop_assert_eq!(calc.fee_rate, FeeConfig::default().rate_for(direction));
    }

    #[test]
    fn non_positive_rate_gives_zero_result(
        amount in arb_fiat_amount(),
        rate in arb_non_positive(),
        receive in arb_fiat_amount(),
        direction in arb_direction(),
    ) {
        let calc = calculate_fees(amount, direction, receive, rate);
        assert_all_zero(&calc);
        prop_assert_eq!(calc.display_currency, direction.input_currency());
    }

    #[test]
    fn onramp_fee_law(amount in arb_fiat_amount(), rate in arb_rate()) {
        let calc = calculate_fees(amount, RampDirection::OnRamp, Decimal::ZERO, rate);

        let rounded_raw = (amount * dec!(0.005))
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        let expected_fee = rounded_raw.max(dec!(50));

        prop_assert_eq!(calc.service_fee, expected_fee);
        prop_assert_eq!(calc.total_fee, expected_fee);
        prop_assert_eq!(calc.net_amount, amount - expected_fee);
        prop_assert_eq!(calc.crypto_amount, (amount - expected_fee) / rate);
        prop_assert_eq!(calc.display_amount, amount);
        prop_assert_eq!(calc.display_currency, DisplayCurrency::Fiat);
        prop_assert!(calc.service_fee >= dec!(50));
        prop_assert_eq!(calc.service_fee.fract(), Decimal::ZERO);
    }

    #[test]
    fn offramp_fee_law(
        amount in arb_token_amount(),
        rate in arb_rate(),
        receive in (0i64..10_000_000_000i64).prop_map(|n| Decimal::new(n, 2)),
    ) {
        let calc = calculate_fees(amount, RampDirection::OffRamp, receive, rate);

        let fee_in_fiat = (amount * rate * dec!(0.001)).max(dec!(50));

        prop_assert_eq!(calc.service_fee, fee_in_fiat / rate);
        prop_assert_eq!(calc.total_fee, calc.service_fee);
        prop_assert_eq!(calc.net_amount, (receive - fee_in_fiat).max(Decimal::ZERO));
        prop_assert!(calc.net_amount >= Decimal::ZERO);
        prop_assert_eq!(calc.crypto_amount, amount);
        prop_assert_eq!(calc.display_currency, DisplayCurrency::Token);
    }

    #[test]
    fn fee_rate_matches_direction(
        amount in arb_fiat_amount(),
        rate in arb_rate(),
        direction in arb_direction(),
    ) {
        let config = FeeConfig {
            onramp_rate: dec!(0.0075),
            offramp_rate: dec!(0.002),
            minimum_fee: dec!(100),
        };
        let calc = calculate_fees_with_config(amount, direction, amount, rate, &config);
        prop_assert_eq!(calc.fee_rate, config.rate_for(direction));
    }

    #[test]
    fn calculation_is_idempotent(
        amount in arb_fiat_amount(),
        rate in arb_rate(),
        receive in arb_fiat_amount(),
        direction in arb_direction(),
    ) {
        let first = calculate_fees(amount, direction, receive, rate);
        let second = calculate_fees(amount, direction, receive, rate);
        prop_assert_eq!(first, second);
    }
}

// =============================================================================
// Minimum fee boundary
// =============================================================================

#[test]
fn minimum_fee_holds_up_to_break_even() {
    let break_even = FeeConfig::default().onramp_break_even().unwrap();
    assert_eq!(break_even, dec!(10000));

    for amount in [dec!(1), dec!(5000), dec!(9999), dec!(9999.99), break_even] {
        let calc = calculate_fees(amount, RampDirection::OnRamp, Decimal::ZERO, dec!(850));
        assert_eq!(calc.service_fee, dec!(50), "amount {}", amount);
    }
}

#[test]
fn percentage_fee_takes_over_above_break_even() {
    // 10_100 * 0.5% = 50.5 -> 51
    let calc = calculate_fees(dec!(10100), RampDirection::OnRamp, Decimal::ZERO, dec!(850));
    assert_eq!(calc.service_fee, dec!(51));

    let calc = calculate_fees(dec!(12000), RampDirection::OnRamp, Decimal::ZERO, dec!(850));
    assert_eq!(calc.service_fee, dec!(60));
}
