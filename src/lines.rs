//! Order lines

use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::products::ProductId;

/// One product's quantity and captured unit price within a cart.
///
/// The unit price is a snapshot taken when the product was added; later
/// catalog price changes do not reach lines already in a cart. Lines are
/// owned and mutated exclusively through [`Cart`](crate::cart::Cart).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    product_id: ProductId,
    quantity: u32,
    unit_price_minor: i64,
    unit_weight: Decimal,
}

impl OrderLine {
    /// Create a new line with the given captured price and weight.
    #[must_use]
    pub fn new(product_id: ProductId, quantity: u32, unit_price_minor: i64, unit_weight: Decimal) -> Self {
        Self {
            product_id,
            quantity,
            unit_price_minor,
            unit_weight,
        }
    }

    /// The product this line is for.
    #[must_use]
    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    /// Units of the product in the cart.
    #[must_use]
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub(crate) fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
    }

    /// Unit price in minor units, captured at add time.
    #[must_use]
    pub fn unit_price_minor(&self) -> i64 {
        self.unit_price_minor
    }

    /// Captured unit price as money in the given currency.
    #[must_use]
    pub fn unit_price(&self, currency: &'static Currency) -> Money<'static, Currency> {
        Money::from_minor(self.unit_price_minor, currency)
    }

    /// Line subtotal in minor units, `None` when it overflows.
    #[must_use]
    pub fn subtotal_minor(&self) -> Option<i64> {
        self.unit_price_minor.checked_mul(i64::from(self.quantity))
    }

    /// Line subtotal as money in the given currency, `None` when the
    /// minor-unit amount overflows.
    #[must_use]
    pub fn subtotal(&self, currency: &'static Currency) -> Option<Money<'static, Currency>> {
        self.subtotal_minor()
            .map(|minor| Money::from_minor(minor, currency))
    }

    /// Total shipping weight of the line.
    #[must_use]
    pub fn weight(&self) -> Decimal {
        self.unit_weight * Decimal::from(self.quantity)
    }
}

/// A quantity that was not a plain non-negative integer.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid quantity: {0:?}")]
pub struct InvalidQuantity(pub String);

/// Parse a wire-form quantity (digits only, as sent by checkout forms).
///
/// # Errors
///
/// Returns [`InvalidQuantity`] for anything that is not a plain
/// non-negative integer.
pub fn parse_quantity(s: &str) -> Result<u32, InvalidQuantity> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(InvalidQuantity(s.to_string()));
    }

    s.parse::<u32>().map_err(|_err| InvalidQuantity(s.to_string()))
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::USD;
    use testresult::TestResult;

    use super::*;

    fn line() -> OrderLine {
        OrderLine::new(ProductId::new(101), 2, 1000, Decimal::new(15, 1))
    }

    #[test]
    fn subtotal_is_unit_price_times_quantity() {
        assert_eq!(line().subtotal_minor(), Some(2000));
        assert_eq!(line().subtotal(USD), Some(Money::from_minor(2000, USD)));
    }

    #[test]
    fn subtotal_overflow_is_detected() {
        let line = OrderLine::new(ProductId::new(101), 2, i64::MAX, Decimal::ONE);

        assert_eq!(line.subtotal_minor(), None);
        assert_eq!(line.subtotal(USD), None);
    }

    #[test]
    fn weight_is_unit_weight_times_quantity() {
        assert_eq!(line().weight(), Decimal::new(30, 1));
    }

    #[test]
    fn quantity_updates_apply_to_derivations() {
        let mut line = line();
        line.set_quantity(5);

        assert_eq!(line.quantity(), 5);
        assert_eq!(line.subtotal_minor(), Some(5000));
        assert_eq!(line.weight(), Decimal::new(75, 1));
    }

    #[test]
    fn parse_quantity_accepts_digits() -> TestResult {
        assert_eq!(parse_quantity("0")?, 0);
        assert_eq!(parse_quantity("12")?, 12);

        Ok(())
    }

    #[test]
    fn parse_quantity_rejects_malformed_input() {
        for input in ["", "-1", "two", "1.0", " 3"] {
            let result = parse_quantity(input);

            assert_eq!(result, Err(InvalidQuantity(input.to_string())));
        }
    }
}
