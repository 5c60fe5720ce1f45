//! Type-safe price representation in integer minor units.
//!
//! Prices are stored as whole cents so that reservation, checkout and
//! payment-provider amounts never drift through floating-point rounding.
//! [`rust_decimal`] is used only at the API edge, to accept and display
//! decimal amounts.

use core::fmt;
use core::ops::Add;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Errors that can occur when converting a decimal amount into a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is negative.
    #[error("price cannot be negative")]
    Negative,
    /// The amount carries sub-cent precision.
    #[error("price cannot have sub-cent precision: {0}")]
    SubCentPrecision(Decimal),
    /// The amount does not fit in 64 bits of cents.
    #[error("price is out of range")]
    OutOfRange,
}

/// A price in integer minor units (cents).
///
/// Serializes transparently as the number of cents.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    /// A zero price.
    pub const ZERO: Self = Self(0);

    /// Create a price from a number of cents.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// The number of cents.
    #[must_use]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Convert a decimal currency amount (e.g. `129.99`) into a price.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError`] if the amount is negative, carries sub-cent
    /// precision, or overflows.
    pub fn from_decimal(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() {
            return Err(PriceError::Negative);
        }
        let cents = amount
            .checked_mul(Decimal::ONE_HUNDRED)
            .ok_or(PriceError::OutOfRange)?;
        if cents.fract() != Decimal::ZERO {
            return Err(PriceError::SubCentPrecision(amount));
        }
        let cents = cents.trunc().to_i64().ok_or(PriceError::OutOfRange)?;
        Ok(Self(cents))
    }

    /// The decimal currency amount (e.g. `129.99`).
    #[must_use]
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Line total for `quantity` units, saturating at the i64 range.
    #[must_use]
    pub const fn line_total(&self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(quantity as i64))
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.to_decimal())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn from_decimal_whole_cents() {
        let price = Price::from_decimal(Decimal::new(12999, 2)).unwrap();
        assert_eq!(price.cents(), 12999);
        assert_eq!(price.to_decimal(), Decimal::new(12999, 2));
    }

    #[test]
    fn from_decimal_rejects_sub_cent() {
        let err = Price::from_decimal(Decimal::new(129_991, 3)).unwrap_err();
        assert!(matches!(err, PriceError::SubCentPrecision(_)));
    }

    #[test]
    fn from_decimal_rejects_negative() {
        let err = Price::from_decimal(Decimal::new(-100, 2)).unwrap_err();
        assert_eq!(err, PriceError::Negative);
    }

    #[test]
    fn line_total_multiplies_cents() {
        let price = Price::from_cents(2500);
        assert_eq!(price.line_total(3), Price::from_cents(7500));
    }

    #[test]
    fn add_sums_cents() {
        assert_eq!(
            Price::from_cents(100) + Price::from_cents(250),
            Price::from_cents(350)
        );
    }

    #[test]
    fn display_shows_decimal() {
        assert_eq!(Price::from_cents(12999).to_string(), "$129.99");
    }
}
