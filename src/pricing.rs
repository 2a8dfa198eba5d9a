//! Pricing

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use thiserror::Error;

/// Errors that can occur while deriving percentage-based amounts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    /// Percentage calculation could not be safely represented in minor units.
    #[error("percentage result is not representable in minor units")]
    PercentConversion,
}

/// Calculate a percentage of a minor-unit amount.
///
/// `percent` is a fraction (`0.05` = 5%). The result rounds midpoint away
/// from zero, so half a cent of tax rounds up.
///
/// # Errors
///
/// Returns [`PricingError::PercentConversion`] if the multiplication
/// overflows the decimal range or the rounded result does not fit an `i64`.
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, PricingError> {
    // `Percentage` only exposes arithmetic, so recover the fraction first.
    let rate = *percent * Decimal::ONE;

    let Some(minor) = Decimal::from_i64(minor) else {
        unreachable!("every i64 is representable as a Decimal")
    };

    let Some(applied) = rate.checked_mul(minor) else {
        return Err(PricingError::PercentConversion);
    };

    let rounded = applied.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

    rounded.to_i64().ok_or(PricingError::PercentConversion)
}
