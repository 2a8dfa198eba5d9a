//! Coupons

use chrono::NaiveDate;
use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A discount voucher issued by an external promotions system.
///
/// The cart treats a coupon as read-only: it never bumps the usage count and
/// never checks limits or expiry itself. The collaborator applying the coupon
/// is responsible for those checks before calling
/// [`Cart::apply_coupon`](crate::cart::Cart::apply_coupon).
///
/// A coupon is expected to carry either a flat or a percentage discount, not
/// both; when both are present the percentage wins. Zero-valued discounts
/// behave as unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    id: String,
    flat_discount_minor: Option<i64>,
    /// Fractional discount (`0.05` = 5% off).
    percentage_discount: Option<Decimal>,
    maximum_uses: Option<u32>,
    uses: u32,
    expires_on: Option<NaiveDate>,
}

impl Coupon {
    /// Create a flat-discount coupon worth `minor` minor units.
    #[must_use]
    pub fn flat(id: impl Into<String>, minor: i64) -> Self {
        Self {
            id: id.into(),
            flat_discount_minor: Some(minor),
            percentage_discount: None,
            maximum_uses: None,
            uses: 0,
            expires_on: None,
        }
    }

    /// Create a percentage-discount coupon; `fraction` is e.g. `0.10` for 10% off.
    #[must_use]
    pub fn percentage(id: impl Into<String>, fraction: Decimal) -> Self {
        Self {
            id: id.into(),
            flat_discount_minor: None,
            percentage_discount: Some(fraction),
            maximum_uses: None,
            uses: 0,
            expires_on: None,
        }
    }

    /// Attach usage-limit bookkeeping.
    #[must_use]
    pub fn with_usage(mut self, maximum_uses: u32, uses: u32) -> Self {
        self.maximum_uses = Some(maximum_uses);
        self.uses = uses;
        self
    }

    /// Attach an expiration date.
    #[must_use]
    pub fn with_expiration(mut self, date: NaiveDate) -> Self {
        self.expires_on = Some(date);
        self
    }

    /// Coupon identifier, passed through to order creation.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Flat discount in minor units, if one is set and non-zero.
    #[must_use]
    pub fn flat_discount_minor(&self) -> Option<i64> {
        self.flat_discount_minor.filter(|minor| *minor > 0)
    }

    /// Percentage discount as a fraction, if one is set and non-zero.
    #[must_use]
    pub fn percentage_discount(&self) -> Option<Percentage> {
        self.percentage_discount
            .filter(|fraction| !fraction.is_zero())
            .map(Percentage::from)
    }

    /// How many times this coupon may be used in total, if limited.
    #[must_use]
    pub fn maximum_uses(&self) -> Option<u32> {
        self.maximum_uses
    }

    /// How many times this coupon has been used so far.
    #[must_use]
    pub fn uses(&self) -> u32 {
        self.uses
    }

    /// The day after which the coupon is no longer valid, if any.
    #[must_use]
    pub fn expires_on(&self) -> Option<NaiveDate> {
        self.expires_on
    }
}
