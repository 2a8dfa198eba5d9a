//! Products

use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier a product carries in the outside world.
///
/// Ids arrive from checkout forms as numeric strings. Parsing is the only way
/// to build one from untrusted input, so cart operations never see a
/// malformed id.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct ProductId(u64);

impl ProductId {
    /// Create a product id from a known-good numeric value.
    #[must_use]
    pub fn new(id: u64) -> Self {
        ProductId(id)
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A product id that was not a plain non-negative integer.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid product id: {0:?}")]
pub struct InvalidProductId(pub String);

impl FromStr for ProductId {
    type Err = InvalidProductId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Digits only: no sign, no whitespace, no decimal point.
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidProductId(s.to_string()));
        }

        s.parse::<u64>()
            .map(ProductId)
            .map_err(|_err| InvalidProductId(s.to_string()))
    }
}

/// A catalog entry: the price and weight the cart captures at add time.
#[derive(Debug, Clone)]
pub struct Product {
    /// Product name
    pub name: String,

    /// Current unit price
    pub price: Money<'static, Currency>,

    /// Per-unit shipping weight
    pub weight: Decimal,
}

/// Errors from product catalog lookups.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// No product exists with the given id.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),
}

/// Read-only product lookup the cart resolves prices and weights through.
pub trait Catalog {
    /// Find a product by id.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ProductNotFound`] if the id is unknown.
    fn find(&self, id: ProductId) -> Result<&Product, CatalogError>;
}

/// A catalog held entirely in memory, as loaded from fixtures.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: FxHashMap<ProductId, Product>,
}

impl InMemoryCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a product.
    pub fn insert(&mut self, id: ProductId, product: Product) {
        self.products.insert(id, product);
    }

    /// Number of products in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Check whether the catalog holds no products.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl Catalog for InMemoryCatalog {
    fn find(&self, id: ProductId) -> Result<&Product, CatalogError> {
        self.products
            .get(&id)
            .ok_or(CatalogError::ProductNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::USD;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parse_numeric_string() -> TestResult {
        let id: ProductId = "101".parse()?;

        assert_eq!(id, ProductId::new(101));

        Ok(())
    }

    #[test]
    fn parse_rejects_non_numeric_strings() {
        for input in ["", "abc", "-1", "1.5", " 5", "5 ", "+5"] {
            let result = input.parse::<ProductId>();

            assert_eq!(result, Err(InvalidProductId(input.to_string())));
        }
    }

    #[test]
    fn display_round_trips() -> TestResult {
        let id = ProductId::new(42);
        let parsed: ProductId = id.to_string().parse()?;

        assert_eq!(parsed, id);

        Ok(())
    }

    #[test]
    fn catalog_finds_inserted_product() -> TestResult {
        let mut catalog = InMemoryCatalog::new();
        catalog.insert(
            ProductId::new(101),
            Product {
                name: "Widget".to_string(),
                price: Money::from_minor(1000, USD),
                weight: Decimal::new(15, 1),
            },
        );

        let product = catalog.find(ProductId::new(101))?;

        assert_eq!(product.name, "Widget");
        assert_eq!(product.price, Money::from_minor(1000, USD));

        Ok(())
    }

    #[test]
    fn catalog_missing_product_errors() {
        let catalog = InMemoryCatalog::new();

        let result = catalog.find(ProductId::new(7));

        assert_eq!(result.err(), Some(CatalogError::ProductNotFound(ProductId::new(7))));
    }
}
