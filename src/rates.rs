//! Shipping rates

use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A carrier rate quoted for this cart's shipment, cached on the cart.
///
/// The amount is in major units (dollars), exactly as quoted by the carrier
/// API; it is converted to minor units only when the purchaser picks it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingRate {
    /// Opaque rate identifier assigned by the carrier.
    pub id: String,

    /// Quoted amount in major units.
    pub amount: Decimal,
}

/// A quoted amount that cannot be represented in minor units.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("shipping rate {0:?} has an unrepresentable amount")]
pub struct RateAmountError(pub String);

impl ShippingRate {
    /// Create a rate from its carrier id and quoted major-unit amount.
    #[must_use]
    pub fn new(id: impl Into<String>, amount: Decimal) -> Self {
        Self {
            id: id.into(),
            amount,
        }
    }

    /// The quoted amount converted to minor units, rounded to the cent.
    ///
    /// # Errors
    ///
    /// Returns [`RateAmountError`] if the amount does not fit in an `i64`
    /// once scaled.
    pub fn amount_minor(&self) -> Result<i64, RateAmountError> {
        self.amount
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|scaled| scaled.round_dp(0).to_i64())
            .ok_or_else(|| RateAmountError(self.id.clone()))
    }
}
