//! Tally
//!
//! Tally is a shopping-cart state and pricing engine for e-commerce checkout flows.
//!
//! It tracks the line items a purchaser intends to buy, carries purchaser,
//! shipping and billing metadata, caches quoted shipping rates, applies an
//! optional coupon, and derives monetary totals (subtotal, tax, shipping,
//! handling, discount, grand total) on demand for display and order creation.
//! Carts restore from and save to a session store behind a bounded per-session
//! lock.

pub mod cart;
pub mod config;
pub mod coupons;
pub mod fixtures;
pub mod lines;
pub mod prelude;
pub mod pricing;
pub mod products;
pub mod rates;
pub mod receipt;
pub mod session;
