//! Checkout demo.
//!
//! Loads a product catalog from a YAML fixture, fills a cart from the
//! command line, and prints the priced receipt.

use std::{io, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use rust_decimal::Decimal;

use tally::{
    cart::{BillingInfo, Cart, ShippingInfo},
    config::CartConfig,
    coupons::Coupon,
    fixtures,
    lines::parse_quantity,
    products::ProductId,
    receipt,
};

#[derive(Parser)]
#[command(name = "checkout")]
#[command(about = "Price a shopping cart and print its receipt")]
struct Cli {
    /// Product catalog fixture
    #[arg(long, default_value = "fixtures/products.yml")]
    products: PathBuf,

    /// Shipping rates fixture
    #[arg(long)]
    rates: Option<PathBuf>,

    /// Cart configuration fixture; defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Line items as id:quantity pairs, e.g. --add 101:2
    #[arg(long = "add", value_name = "ID:QTY")]
    adds: Vec<String>,

    /// Billing state, e.g. WI
    #[arg(long)]
    state: Option<String>,

    /// Shipping rate id to price shipping with
    #[arg(long)]
    method: Option<String>,

    /// Coupon code to apply
    #[arg(long)]
    coupon: Option<String>,

    /// Flat coupon discount in minor units
    #[arg(long, requires = "coupon")]
    flat: Option<i64>,

    /// Percentage coupon discount, e.g. 10%
    #[arg(long, requires = "coupon", conflicts_with = "flat")]
    percent: Option<String>,
}

fn parse_add(pair: &str) -> anyhow::Result<(ProductId, u32)> {
    let (id, quantity) = pair
        .split_once(':')
        .with_context(|| format!("expected ID:QTY, got {pair:?}"))?;

    Ok((id.parse()?, parse_quantity(quantity)?))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let catalog = fixtures::load_catalog(&cli.products)
        .with_context(|| format!("loading catalog from {}", cli.products.display()))?;

    let config = match &cli.config {
        Some(path) => fixtures::load_config(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => CartConfig::default(),
    };

    let mut cart = Cart::new(config);

    for pair in &cli.adds {
        let (id, quantity) = parse_add(pair)?;

        cart.add(&catalog, id, quantity)?;
    }

    if let Some(path) = &cli.rates {
        let rates = fixtures::load_rates(path)
            .with_context(|| format!("loading rates from {}", path.display()))?;

        cart.set_rates(rates);
    }

    if let Some(state) = cli.state {
        cart.set_billing_info(BillingInfo {
            state,
            ..BillingInfo::default()
        });
    }

    if let Some(method) = cli.method {
        cart.set_shipping_info(ShippingInfo {
            method,
            ..ShippingInfo::default()
        })?;
    }

    if let Some(code) = cli.coupon {
        let coupon = if let Some(percent) = &cli.percent {
            let fraction = fixtures::parse_percentage(percent)? * Decimal::ONE;
            Coupon::percentage(code, fraction)
        } else {
            Coupon::flat(code, cli.flat.unwrap_or(0))
        };

        cart.apply_coupon(coupon);
    }

    receipt::write_to(io::stdout().lock(), &cart, &catalog)?;

    Ok(())
}
