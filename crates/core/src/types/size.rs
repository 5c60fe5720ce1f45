//! Shoe size type.
//!
//! Shoe sizes come in half steps (8, 8.5, 9, ...). The value is stored as a
//! count of half steps so it can be compared, hashed and used as a lookup
//! key without any floating-point equality hazards. It serializes as the
//! plain JSON number customers expect (`9.5`).

use core::fmt;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can occur when parsing a [`ShoeSize`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SizeError {
    /// The fractional part is something other than .0 or .5.
    #[error("size must be a number ending in .0 or .5")]
    NotHalfStep,
    /// The size is negative or absurdly large.
    #[error("size {0} is out of range")]
    OutOfRange(f64),
}

/// Largest accepted size. Nobody wears a size 40 shoe.
const MAX_SIZE: f64 = 40.0;

/// A shoe size in half steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShoeSize(u16);

impl ShoeSize {
    /// Parse a size from its numeric value.
    ///
    /// # Errors
    ///
    /// Returns [`SizeError`] if the value is not a non-negative half step.
    pub fn parse(value: f64) -> Result<Self, SizeError> {
        if !value.is_finite() || value < 0.0 || value > MAX_SIZE {
            return Err(SizeError::OutOfRange(value));
        }
        let doubled = value * 2.0;
        if doubled.fract() != 0.0 {
            return Err(SizeError::NotHalfStep);
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Ok(Self(doubled as u16))
    }

    /// The numeric size value (e.g. `9.5`).
    #[must_use]
    pub fn value(&self) -> f64 {
        f64::from(self.0) / 2.0
    }

    /// The number of half steps; stable key for maps and ordering.
    #[must_use]
    pub const fn half_steps(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for ShoeSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 2 == 0 {
            write!(f, "{}", self.0 / 2)
        } else {
            write!(f, "{}", self.value())
        }
    }
}

impl std::str::FromStr for ShoeSize {
    type Err = SizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f64 = s.parse().map_err(|_| SizeError::NotHalfStep)?;
        Self::parse(value)
    }
}

impl Serialize for ShoeSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.value())
    }
}

impl<'de> Deserialize<'de> for ShoeSize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Self::parse(value).map_err(DeError::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_whole_and_half_steps() {
        assert_eq!(ShoeSize::parse(9.0).unwrap().value(), 9.0);
        assert_eq!(ShoeSize::parse(9.5).unwrap().value(), 9.5);
        assert_eq!(ShoeSize::parse(0.0).unwrap().value(), 0.0);
    }

    #[test]
    fn parse_rejects_quarter_steps() {
        assert_eq!(ShoeSize::parse(9.25).unwrap_err(), SizeError::NotHalfStep);
    }

    #[test]
    fn parse_rejects_out_of_range() {
        assert!(matches!(
            ShoeSize::parse(-1.0).unwrap_err(),
            SizeError::OutOfRange(_)
        ));
        assert!(matches!(
            ShoeSize::parse(f64::NAN).unwrap_err(),
            SizeError::OutOfRange(_)
        ));
    }

    #[test]
    fn errors_compare_by_value() {
        assert_eq!(ShoeSize::parse(41.0).unwrap_err(), SizeError::OutOfRange(41.0));
        assert_ne!(SizeError::OutOfRange(41.0), SizeError::NotHalfStep);
    }

    #[test]
    fn display_drops_trailing_zero() {
        assert_eq!(ShoeSize::parse(9.0).unwrap().to_string(), "9");
        assert_eq!(ShoeSize::parse(9.5).unwrap().to_string(), "9.5");
    }

    #[test]
    fn serde_round_trip_as_number() {
        let size = ShoeSize::parse(10.5).unwrap();
        let json = serde_json::to_string(&size).unwrap();
        assert_eq!(json, "10.5");
        let parsed: ShoeSize = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, size);
    }

    #[test]
    fn serde_rejects_quarter_steps() {
        assert!(serde_json::from_str::<ShoeSize>("9.25").is_err());
    }

    #[test]
    fn ordering_follows_numeric_value() {
        assert!(ShoeSize::parse(9.0).unwrap() < ShoeSize::parse(9.5).unwrap());
    }
}
