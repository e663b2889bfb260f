//! Money type with decimal precision and currency.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! This type wraps `rust_decimal::Decimal` for arbitrary precision.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of decimal places kept for currency units.
pub const CURRENCY_DECIMAL_PLACES: u32 = 2;

/// Represents a monetary amount with currency.
///
/// Uses `Decimal` internally to avoid floating-point precision errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// The amount in major currency units (e.g., pesos).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: Currency,
}

/// ISO 4217 currency codes supported by the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Mexican Peso
    #[default]
    Mxn,
    /// US Dollar
    Usd,
}

/// Errors raised while reading an amount.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    /// The text is not a decimal number.
    #[error("Malformed amount: '{0}'")]
    Malformed(String),

    /// The amount is zero or negative where a positive amount is required.
    #[error("Amount must be positive, got {0}")]
    NotPositive(Decimal),

    /// The amount is finer than the smallest currency unit.
    #[error("Amount {0} has more than {places} decimal places", places = CURRENCY_DECIMAL_PLACES)]
    TooPrecise(Decimal),
}

impl Money {
    /// Creates a new Money instance.
    #[must_use]
    pub const fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }
}

/// Rounds a value to currency units using half-up rounding.
///
/// Midpoints move away from zero (2.345 → 2.35, -2.345 → -2.35), which is
/// the convention for customer-facing currency amounts.
#[must_use]
pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(CURRENCY_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Parses a currency amount from text.
///
/// # Errors
///
/// Returns `AmountError::Malformed` if the text is not a decimal number.
pub fn parse_amount(text: &str) -> Result<Decimal, AmountError> {
    text.trim()
        .parse::<Decimal>()
        .map_err(|_| AmountError::Malformed(text.to_string()))
}

/// Ensures an amount fits in whole currency units (cents).
///
/// Trailing zeros do not count, so `1.5000` passes and `0.005` does not.
///
/// # Errors
///
/// Returns `AmountError::TooPrecise` for amounts finer than a cent.
pub fn ensure_currency_scale(amount: Decimal) -> Result<Decimal, AmountError> {
    if amount.normalize().scale() > CURRENCY_DECIMAL_PLACES {
        Err(AmountError::TooPrecise(amount))
    } else {
        Ok(amount)
    }
}

/// Ensures an amount is strictly positive and in whole cents.
///
/// # Errors
///
/// - `AmountError::NotPositive` for zero or negative amounts
/// - `AmountError::TooPrecise` for amounts finer than a cent
pub fn ensure_currency_amount(amount: Decimal) -> Result<Decimal, AmountError> {
    if amount <= Decimal::ZERO {
        return Err(AmountError::NotPositive(amount));
    }
    ensure_currency_scale(amount)
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mxn => write!(f, "MXN"),
            Self::Usd => write!(f, "USD"),
        }
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "MXN" => Ok(Self::Mxn),
            "USD" => Ok(Self::Usd),
            _ => Err(format!("Unknown currency: {s}")),
        }
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", round_currency(self.amount), self.currency)
    }
}
