//! Tally prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{
        BillingInfo, Cart, CartError, CartSnapshot, CheckoutData, OrderSummary, PurchaserInfo,
        ShippingInfo,
    },
    config::{CartConfig, TaxJurisdiction},
    coupons::Coupon,
    fixtures::FixtureError,
    lines::{InvalidQuantity, OrderLine, parse_quantity},
    products::{Catalog, CatalogError, InMemoryCatalog, InvalidProductId, Product, ProductId},
    rates::{RateAmountError, ShippingRate},
    receipt::ReceiptError,
    session::{MemorySessionStore, SessionError, SessionStore},
};
