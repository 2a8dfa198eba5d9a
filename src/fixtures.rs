//! Fixtures
//!
//! YAML-backed definitions of product catalogs, shipping rate tables and
//! cart configuration, for demos and tests. Prices are written as
//! human-readable strings ("10.00 USD") and parsed into minor units.

use std::{fs, path::Path};

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use rustc_hash::FxHashMap;
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use serde::Deserialize;
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    config::{CartConfig, TaxJurisdiction},
    products::{InMemoryCatalog, InvalidProductId, Product},
    rates::ShippingRate,
};

/// Errors raised while loading fixture files.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// The fixture file could not be read.
    #[error("failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// The fixture file is not valid YAML for the expected shape.
    #[error("failed to parse fixture: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// A price string is not of the form "10.00 USD".
    #[error("invalid price {0:?}, expected e.g. \"10.00 USD\"")]
    InvalidPrice(String),

    /// A price names a currency the engine does not support.
    #[error("unsupported currency {0:?}")]
    UnknownCurrency(String),

    /// A percentage string is neither "5%" nor a bare fraction like "0.05".
    #[error("invalid percentage {0:?}")]
    InvalidPercentage(String),

    /// A catalog key is not a numeric product id.
    #[error(transparent)]
    InvalidProductId(#[from] InvalidProductId),
}

#[derive(Debug, Deserialize)]
struct ProductFixture {
    name: String,
    price: String,
    weight: Decimal,
}

#[derive(Debug, Deserialize)]
struct ProductsFixture {
    products: FxHashMap<String, ProductFixture>,
}

#[derive(Debug, Deserialize)]
struct RateFixture {
    id: String,
    amount: Decimal,
}

#[derive(Debug, Deserialize)]
struct RatesFixture {
    rates: Vec<RateFixture>,
}

#[derive(Debug, Deserialize)]
struct ConfigFixture {
    currency: String,
    tax: TaxFixture,
    #[serde(default = "default_handling")]
    handling_cost_minor: i64,
    #[serde(default = "default_strict")]
    strict_shipping: bool,
}

#[derive(Debug, Deserialize)]
struct TaxFixture {
    code: String,
    name: String,
    rate: String,
}

fn default_handling() -> i64 {
    CartConfig::default().handling_cost_minor
}

fn default_strict() -> bool {
    true
}

/// Parse a "10.00 USD" style price string into money.
///
/// # Errors
///
/// Returns [`FixtureError::InvalidPrice`] for malformed strings and
/// [`FixtureError::UnknownCurrency`] for unsupported currency codes.
pub fn parse_price(input: &str) -> Result<Money<'static, Currency>, FixtureError> {
    let mut parts = input.split_whitespace();

    let (Some(amount), Some(code), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(FixtureError::InvalidPrice(input.to_string()));
    };

    let amount = amount
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidPrice(input.to_string()))?;

    let minor = amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|cents| cents.round_dp(0))
        .and_then(|cents| cents.to_i64())
        .ok_or_else(|| FixtureError::InvalidPrice(input.to_string()))?;

    let currency = match code {
        "USD" => iso::USD,
        "EUR" => iso::EUR,
        "GBP" => iso::GBP,
        other => return Err(FixtureError::UnknownCurrency(other.to_string())),
    };

    Ok(Money::from_minor(minor, currency))
}

/// Parse a percentage string into a fraction.
///
/// Accepts both "5%" and a bare fraction like "0.05"; both produce the
/// same five-percent value.
///
/// # Errors
///
/// Returns [`FixtureError::InvalidPercentage`] for anything else.
pub fn parse_percentage(input: &str) -> Result<Percentage, FixtureError> {
    let trimmed = input.trim();

    let fraction = if let Some(number) = trimmed.strip_suffix('%') {
        number
            .trim()
            .parse::<Decimal>()
            .ok()
            .and_then(|percent| percent.checked_div(Decimal::ONE_HUNDRED))
    } else {
        trimmed.parse::<Decimal>().ok()
    };

    fraction
        .map(Percentage::from)
        .ok_or_else(|| FixtureError::InvalidPercentage(input.to_string()))
}

/// Build a catalog from YAML fixture text.
///
/// # Errors
///
/// Returns a [`FixtureError`] for malformed YAML, ids, or prices.
pub fn catalog_from_str(yaml: &str) -> Result<InMemoryCatalog, FixtureError> {
    let fixture: ProductsFixture = serde_norway::from_str(yaml)?;
    let mut catalog = InMemoryCatalog::new();

    for (id, product) in fixture.products {
        catalog.insert(
            id.parse()?,
            Product {
                name: product.name,
                price: parse_price(&product.price)?,
                weight: product.weight,
            },
        );
    }

    Ok(catalog)
}

/// Load a catalog from a YAML fixture file.
///
/// # Errors
///
/// Returns a [`FixtureError`] if the file cannot be read or parsed.
pub fn load_catalog(path: impl AsRef<Path>) -> Result<InMemoryCatalog, FixtureError> {
    catalog_from_str(&fs::read_to_string(path)?)
}

/// Build a shipping rate table from YAML fixture text.
///
/// # Errors
///
/// Returns [`FixtureError::Yaml`] for malformed YAML.
pub fn rates_from_str(yaml: &str) -> Result<SmallVec<[ShippingRate; 4]>, FixtureError> {
    let fixture: RatesFixture = serde_norway::from_str(yaml)?;

    Ok(fixture
        .rates
        .into_iter()
        .map(|rate| ShippingRate::new(rate.id, rate.amount))
        .collect())
}

/// Load a shipping rate table from a YAML fixture file.
///
/// # Errors
///
/// Returns a [`FixtureError`] if the file cannot be read or parsed.
pub fn load_rates(path: impl AsRef<Path>) -> Result<SmallVec<[ShippingRate; 4]>, FixtureError> {
    rates_from_str(&fs::read_to_string(path)?)
}

/// Build a cart configuration from YAML fixture text.
///
/// # Errors
///
/// Returns a [`FixtureError`] for malformed YAML, currencies, or rates.
pub fn config_from_str(yaml: &str) -> Result<CartConfig, FixtureError> {
    let fixture: ConfigFixture = serde_norway::from_str(yaml)?;

    let currency = match fixture.currency.as_str() {
        "USD" => iso::USD,
        "EUR" => iso::EUR,
        "GBP" => iso::GBP,
        other => return Err(FixtureError::UnknownCurrency(other.to_string())),
    };

    Ok(CartConfig {
        currency,
        tax: TaxJurisdiction {
            code: fixture.tax.code,
            name: fixture.tax.name,
            rate: parse_percentage(&fixture.tax.rate)?,
        },
        handling_cost_minor: fixture.handling_cost_minor,
        strict_shipping: fixture.strict_shipping,
    })
}

/// Load a cart configuration from a YAML fixture file.
///
/// # Errors
///
/// Returns a [`FixtureError`] if the file cannot be read or parsed.
pub fn load_config(path: impl AsRef<Path>) -> Result<CartConfig, FixtureError> {
    config_from_str(&fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::USD;
    use testresult::TestResult;

    use crate::products::{Catalog, ProductId};

    use super::*;

    #[test]
    fn parses_prices_in_major_units() -> TestResult {
        assert_eq!(parse_price("10.00 USD")?, Money::from_minor(1000, USD));
        assert_eq!(parse_price("2.99 GBP")?, Money::from_minor(299, iso::GBP));
        assert_eq!(parse_price("0.50 EUR")?, Money::from_minor(50, iso::EUR));

        Ok(())
    }

    #[test]
    fn rejects_malformed_prices() {
        assert!(matches!(
            parse_price("ten dollars"),
            Err(FixtureError::InvalidPrice(_))
        ));
        assert!(matches!(
            parse_price("10.00"),
            Err(FixtureError::InvalidPrice(_))
        ));
        assert!(matches!(
            parse_price("10.00 XYZ"),
            Err(FixtureError::UnknownCurrency(_))
        ));
    }

    #[test]
    fn parses_percentages_in_both_forms() -> TestResult {
        assert_eq!(parse_percentage("5%")?, Percentage::from(0.05));
        assert_eq!(parse_percentage("0.05")?, Percentage::from(0.05));
        assert_eq!(parse_percentage("12.5%")?, Percentage::from(0.125));

        Ok(())
    }

    #[test]
    fn rejects_malformed_percentages() {
        assert!(matches!(
            parse_percentage("five percent"),
            Err(FixtureError::InvalidPercentage(_))
        ));
    }

    #[test]
    fn builds_a_catalog_from_yaml() -> TestResult {
        let catalog = catalog_from_str(
            r"
            products:
              '101':
                name: Widget
                price: 10.00 USD
                weight: 1.5
              '102':
                name: Gadget
                price: 2.50 USD
                weight: 0.25
            ",
        )?;

        assert_eq!(catalog.len(), 2);

        let widget = catalog.find(ProductId::new(101))?;

        assert_eq!(widget.name, "Widget");
        assert_eq!(widget.price, Money::from_minor(1000, USD));

        Ok(())
    }

    #[test]
    fn rejects_non_numeric_catalog_keys() {
        let result = catalog_from_str(
            r"
            products:
              widget:
                name: Widget
                price: 10.00 USD
                weight: 1.5
            ",
        );

        assert!(matches!(result, Err(FixtureError::InvalidProductId(_))));
    }

    #[test]
    fn builds_a_rate_table_from_yaml() -> TestResult {
        let rates = rates_from_str(
            r"
            rates:
              - id: usps_priority
                amount: 12.34
              - id: ups_ground
                amount: 8.00
            ",
        )?;

        assert_eq!(rates.len(), 2);
        assert_eq!(rates[0].id, "usps_priority");
        assert_eq!(rates[0].amount_minor()?, 1234);

        Ok(())
    }

    #[test]
    fn builds_a_config_from_yaml() -> TestResult {
        let config = config_from_str(
            r"
            currency: USD
            tax:
              code: wi
              name: wisconsin
              rate: 5%
            handling_cost_minor: 300
            strict_shipping: true
            ",
        )?;

        assert_eq!(config.currency, USD);
        assert!(config.tax.matches("Wisconsin"));
        assert_eq!(config.handling_cost_minor, 300);

        Ok(())
    }

    #[test]
    fn config_defaults_apply_when_fields_are_omitted() -> TestResult {
        let config = config_from_str(
            r"
            currency: USD
            tax:
              code: wi
              name: wisconsin
              rate: 5%
            ",
        )?;

        assert_eq!(config.handling_cost_minor, 300);
        assert!(config.strict_shipping);

        Ok(())
    }
}
