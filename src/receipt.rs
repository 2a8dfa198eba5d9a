//! Receipt
//!
//! Plain-text rendering of a cart: an item table followed by the summary
//! lines of the pricing pipeline.

use std::io;

use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    cart::{Cart, CartError},
    products::{Catalog, CatalogError},
};

/// Errors that can occur when rendering a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// The pricing pipeline failed.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// A line's product is no longer in the catalog.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// IO error
    #[error("IO error")]
    IO,
}

/// Render the cart as a receipt: one table row per line item, then the
/// summary figures.
///
/// The discount line is only printed when a coupon is applied.
///
/// # Errors
///
/// Returns a [`ReceiptError`] if a product lookup or total calculation
/// fails, or the output cannot be written.
pub fn write_to(
    mut out: impl io::Write,
    cart: &Cart,
    catalog: &impl Catalog,
) -> Result<(), ReceiptError> {
    let mut builder = Builder::default();

    builder.push_record(["Qty", "Item", "Unit", "Subtotal"]);

    for line in cart.lines() {
        let product = catalog.find(line.product_id())?;
        let subtotal = line
            .subtotal(cart.currency())
            .ok_or(CartError::LineTotalOverflow(line.product_id()))?;

        builder.push_record([
            format!("{}", line.quantity()),
            product.name.clone(),
            format!("{}", line.unit_price(cart.currency())),
            format!("{subtotal}"),
        ]);
    }

    write_item_table(&mut out, builder)?;
    write_summary(&mut out, cart)?;

    Ok(())
}

fn write_item_table(out: &mut impl io::Write, builder: Builder) -> Result<(), ReceiptError> {
    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());
    let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(1, separator);

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(2..4), Alignment::right());

    writeln!(out, "\n{table}").map_err(|_err| ReceiptError::IO)
}

fn write_summary(out: &mut impl io::Write, cart: &Cart) -> Result<(), ReceiptError> {
    let coupon_value = cart.coupon_value()?;

    let mut rows = vec![
        (" Subtotal:".to_string(), format!("{}  ", cart.subtotal()?)),
        (" Tax:".to_string(), format!("{}  ", cart.tax()?)),
        (" Shipping:".to_string(), format!("{}  ", cart.shipping())),
        (" Handling:".to_string(), format!("{}  ", cart.handling())),
    ];

    if let Some(coupon) = cart.coupon() {
        rows.push((
            format!(" Discount ({}):", coupon.id()),
            format!("-{coupon_value}  "),
        ));
    }

    rows.push((
        " \x1b[1mTotal:\x1b[0m".to_string(),
        format!("\x1b[1m{}  \x1b[0m", cart.total()?),
    ));

    let label_width = rows
        .iter()
        .map(|(label, _value)| visible_width(label))
        .max()
        .unwrap_or(0);

    let value_width = rows
        .iter()
        .map(|(_label, value)| visible_width(value))
        .max()
        .unwrap_or(0);

    for (label, value) in &rows {
        write_summary_line(out, label, value, label_width, value_width)?;
    }

    writeln!(out).map_err(|_err| ReceiptError::IO)
}

/// Writes a summary line with a right-aligned label and a fixed-width value column.
fn write_summary_line(
    out: &mut impl io::Write,
    label: &str,
    value: &str,
    label_col_width: usize,
    value_col_width: usize,
) -> Result<(), ReceiptError> {
    let label_pad = label_col_width.saturating_sub(visible_width(label));
    let value_pad = value_col_width.saturating_sub(visible_width(value));

    writeln!(
        out,
        "{:>label_pad$}{label}  {value_pad}{value}",
        "",
        value_pad = " ".repeat(value_pad)
    )
    .map_err(|_err| ReceiptError::IO)
}

/// Returns the visible (non-ANSI) width of a string.
fn visible_width(s: &str) -> usize {
    let mut width = 0usize;
    let mut in_escape = false;

    for ch in s.chars() {
        if in_escape {
            if ch.is_ascii_alphabetic() {
                in_escape = false;
            }
        } else if ch == '\x1b' {
            in_escape = true;
        } else {
            width += 1;
        }
    }

    width
}
