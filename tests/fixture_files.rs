//! Integration tests for loading fixture files from disk.

use std::{fs, path::PathBuf};

use rusty_money::{Money, iso::USD};
use testresult::TestResult;
use tempfile::TempDir;

use tally::{
    fixtures,
    products::{Catalog, ProductId},
};

fn write_fixture(dir: &TempDir, name: &str, contents: &str) -> Result<PathBuf, std::io::Error> {
    let path = dir.path().join(name);

    fs::write(&path, contents)?;

    Ok(path)
}

#[test]
fn loads_a_catalog_file() -> TestResult {
    let dir = TempDir::new()?;
    let path = write_fixture(
        &dir,
        "products.yml",
        r"
        products:
          '101':
            name: Walnut Cutting Board
            price: 48.00 USD
            weight: 3.2
        ",
    )?;

    let catalog = fixtures::load_catalog(path)?;
    let product = catalog.find(ProductId::new(101))?;

    assert_eq!(product.name, "Walnut Cutting Board");
    assert_eq!(product.price, Money::from_minor(4800, USD));

    Ok(())
}

#[test]
fn loads_a_rates_file() -> TestResult {
    let dir = TempDir::new()?;
    let path = write_fixture(
        &dir,
        "rates.yml",
        r"
        rates:
          - id: usps_priority
            amount: 12.34
        ",
    )?;

    let rates = fixtures::load_rates(path)?;

    assert_eq!(rates.len(), 1);
    assert_eq!(rates[0].amount_minor()?, 1234);

    Ok(())
}

#[test]
fn loads_a_config_file() -> TestResult {
    let dir = TempDir::new()?;
    let path = write_fixture(
        &dir,
        "config.yml",
        r"
        currency: USD
        tax:
          code: wi
          name: wisconsin
          rate: 5%
        handling_cost_minor: 250
        strict_shipping: false
        ",
    )?;

    let config = fixtures::load_config(path)?;

    assert_eq!(config.handling_cost_minor, 250);
    assert!(!config.strict_shipping);
    assert!(config.tax.matches("WI"));

    Ok(())
}

#[test]
fn missing_file_reports_io_error() {
    let result = fixtures::load_catalog("no/such/products.yml");

    assert!(matches!(result, Err(fixtures::FixtureError::Io(_))));
}

#[test]
fn malformed_yaml_reports_parse_error() -> TestResult {
    let dir = TempDir::new()?;
    let path = write_fixture(&dir, "products.yml", "products: [not, a, map]")?;

    let result = fixtures::load_catalog(path);

    assert!(matches!(result, Err(fixtures::FixtureError::Yaml(_))));

    Ok(())
}
