use rust_decimal::Decimal;

/// On-ramp service fee: 0.5%
pub const DEFAULT_ONRAMP_FEE_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 3);

/// Off-ramp service fee: 0.1%
pub const DEFAULT_OFFRAMP_FEE_RATE: Decimal = Decimal::from_parts(1, 0, 0, false, 3);

/// Minimum service fee in fiat units (Naira)
pub const DEFAULT_MINIMUM_FEE: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

/// Token quoted when the caller does not name one
pub const DEFAULT_TOKEN: &str = "USDT";

/// Tokens kept warm by a background subscription
pub const DEFAULT_WATCHED_TOKENS: &[&str] = &["USDT", "USDC"];
