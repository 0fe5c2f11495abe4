//! Money arithmetic for pricing calculations.
//!
//! Exact decimal arithmetic with currency tagging. Every monetary amount in
//! the engine is a `rust_decimal::Decimal`; binary floats never touch money.

use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Round to specified decimal places using banker's rounding (ROUND_HALF_EVEN).
///
/// Banker's rounding rounds to the nearest even number when the value is exactly
/// halfway between two possibilities. This reduces cumulative rounding bias.
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use diveops_pricing::money::round_money;
///
/// assert_eq!(round_money(dec!(2.5), 0), dec!(2));   // rounds to even
/// assert_eq!(round_money(dec!(3.5), 0), dec!(4));   // rounds to even
/// assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
/// ```
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven)
}

/// Arithmetic attempted across two different currency codes.
///
/// Amounts in different currencies are never silently combined or converted;
/// the mismatch always surfaces to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("currency mismatch: {left} vs {right}")]
pub struct CurrencyMismatch {
    pub left: String,
    pub right: String,
}

/// A monetary amount tagged with its currency code.
///
/// Serializes the amount as a decimal string so no precision is lost at the
/// JSON boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub currency: String,
}

impl Money {
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }

    pub fn zero(currency: impl Into<String>) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Addition that fails on currency mismatch instead of coercing.
    pub fn checked_add(&self, other: &Money) -> Result<Money, CurrencyMismatch> {
        self.require_same_currency(other)?;
        Ok(Money::new(self.amount + other.amount, self.currency.clone()))
    }

    /// Subtraction that fails on currency mismatch instead of coercing.
    pub fn checked_sub(&self, other: &Money) -> Result<Money, CurrencyMismatch> {
        self.require_same_currency(other)?;
        Ok(Money::new(self.amount - other.amount, self.currency.clone()))
    }

    /// Multiply by a unitless scalar (quantity, rate). Currency is preserved.
    pub fn multiply(&self, factor: Decimal) -> Money {
        Money::new(self.amount * factor, self.currency.clone())
    }

    fn require_same_currency(&self, other: &Money) -> Result<(), CurrencyMismatch> {
        if self.currency != other.currency {
            return Err(CurrencyMismatch {
                left: self.currency.clone(),
                right: other.currency.clone(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}
