//! Cart
//!
//! The aggregate root of the checkout flow: line items, purchaser and
//! address data, cached shipping rates, an optional coupon, and the money
//! pipeline that derives totals from them. Totals are never cached; every
//! figure is recomputed from current state on demand.

use std::time::Duration;

use rust_decimal::Decimal;
use rusty_money::{Money, MoneyError, iso::Currency};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    config::CartConfig,
    coupons::Coupon,
    lines::{InvalidQuantity, OrderLine},
    pricing::{PricingError, percent_of_minor},
    products::{Catalog, CatalogError, InvalidProductId, ProductId},
    rates::{RateAmountError, ShippingRate},
    session::{SessionError, SessionStore},
};

/// How long [`Cart::restore`] waits for another accessor to release the
/// session before giving up.
pub const DEFAULT_LOCK_WAIT: Duration = Duration::from_secs(5);

type CartRates = SmallVec<[ShippingRate; 4]>;

/// Errors raised by cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// `subtract`/`remove` targeted a product with no line in the cart.
    #[error("product {0} is not in the cart")]
    NotInCart(ProductId),

    /// Incrementing a line would overflow its quantity.
    #[error("quantity for product {0} overflows")]
    QuantityOverflow(ProductId),

    /// A line subtotal does not fit in minor units.
    #[error("line total for product {0} overflows minor units")]
    LineTotalOverflow(ProductId),

    /// No cached rate matches the shipping method the purchaser chose.
    #[error("no shipping rate matches method {0:?}")]
    ShippingCostUnresolved(String),

    /// Malformed product id at the wire boundary.
    #[error(transparent)]
    InvalidProductId(#[from] InvalidProductId),

    /// Malformed quantity at the wire boundary.
    #[error(transparent)]
    InvalidQuantity(#[from] InvalidQuantity),

    /// Product lookup failed while adding a line.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Percentage derivation could not be represented in minor units.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// Money arithmetic failure (currency mismatch or overflow).
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// A quoted rate amount that does not fit minor units.
    #[error(transparent)]
    RateAmount(#[from] RateAmountError),

    /// Session lock or store failure.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The persisted snapshot could not be decoded.
    #[error("malformed cart snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// Checkout fields carried alongside the line items.
///
/// A fixed record: every field the checkout flow writes has a name and a
/// type here, rather than a slot in a stringly keyed bag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutData {
    /// Purchaser name.
    pub name: Option<String>,

    /// Purchaser email.
    pub email: Option<String>,

    /// Shipping street line 1.
    pub shipping_street: Option<String>,

    /// Shipping street line 2.
    pub shipping_street2: Option<String>,

    /// Shipping city.
    pub shipping_city: Option<String>,

    /// Shipping state.
    pub shipping_state: Option<String>,

    /// Shipping zip code.
    pub shipping_zip: Option<String>,

    /// Shipping country.
    pub shipping_country: Option<String>,

    /// Resolved shipping charge in minor units; 0 until a rate is chosen.
    pub shipping_cost_minor: i64,

    /// Handling charge override in minor units. `None` and `Some(0)` fall
    /// back to the configured default.
    pub handling_cost_minor: Option<i64>,

    /// Billing street.
    pub billing_street: Option<String>,

    /// Billing city.
    pub billing_city: Option<String>,

    /// Billing state; drives the taxable-jurisdiction check.
    pub billing_state: Option<String>,

    /// Billing zip code.
    pub billing_zip: Option<String>,

    /// Opaque shipment identifier from the shipping collaborator.
    pub shipment_id: Option<String>,

    /// Id of the shipping rate the purchaser selected.
    pub selected_rate_id: Option<String>,

    /// Opaque payment token from the payment gateway.
    pub payment_token: Option<String>,

    /// Card brand reported by the payment gateway.
    pub card_type: Option<String>,
}

/// Purchaser contact fields for [`Cart::set_purchaser_info`].
#[derive(Debug, Clone, Default)]
pub struct PurchaserInfo {
    /// Purchaser name.
    pub name: String,

    /// Purchaser email.
    pub email: String,
}

/// Shipping address plus the chosen rate id, for [`Cart::set_shipping_info`].
#[derive(Debug, Clone, Default)]
pub struct ShippingInfo {
    /// Street line 1.
    pub street: String,

    /// Street line 2, if any.
    pub street2: Option<String>,

    /// City.
    pub city: String,

    /// State.
    pub state: String,

    /// Zip code.
    pub zip: String,

    /// Country.
    pub country: String,

    /// Id of the cached rate to price shipping with.
    pub method: String,
}

/// Billing address and payment pass-throughs, for [`Cart::set_billing_info`].
#[derive(Debug, Clone, Default)]
pub struct BillingInfo {
    /// Street.
    pub street: String,

    /// City.
    pub city: String,

    /// State.
    pub state: String,

    /// Zip code.
    pub zip: String,

    /// Opaque payment token.
    pub payment_token: String,

    /// Card brand.
    pub card_type: String,
}

/// Everything [`Cart::save`] persists for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartSnapshot {
    /// Checkout fields.
    pub data: CheckoutData,

    /// Cached shipping rates.
    pub rates: CartRates,

    /// Line items, in display order.
    pub lines: Vec<OrderLine>,

    /// Applied coupon, if any.
    pub coupon: Option<Coupon>,
}

/// Flat record of totals and fields handed to order creation.
///
/// Extracting one is a pure read: no mutation, no persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSummary {
    /// Sum of line subtotals.
    pub subtotal: Money<'static, Currency>,

    /// Resolved shipping charge.
    pub shipping: Money<'static, Currency>,

    /// Handling charge.
    pub handling: Money<'static, Currency>,

    /// Sales tax.
    pub tax: Money<'static, Currency>,

    /// Value of the applied coupon.
    pub coupon_value: Money<'static, Currency>,

    /// Identifier of the applied coupon, if any.
    pub coupon: Option<String>,

    /// Grand total.
    pub total: Money<'static, Currency>,

    /// Purchaser name.
    pub name: Option<String>,

    /// Purchaser email.
    pub email: Option<String>,

    /// Shipment identifier pass-through.
    pub shipment_id: Option<String>,

    /// Selected rate identifier pass-through.
    pub selected_rate_id: Option<String>,

    /// Shipping street.
    pub shipping_street: Option<String>,

    /// Shipping city.
    pub shipping_city: Option<String>,

    /// Shipping state.
    pub shipping_state: Option<String>,

    /// Shipping zip code.
    pub shipping_zip: Option<String>,
}

/// Shopping cart bound to one logical session.
#[derive(Debug, Clone)]
pub struct Cart {
    config: CartConfig,
    data: CheckoutData,
    rates: CartRates,
    lines: Vec<OrderLine>,
    coupon: Option<Coupon>,
}

impl Cart {
    /// Create an empty cart with the given behaviour configuration.
    #[must_use]
    pub fn new(config: CartConfig) -> Self {
        Cart {
            config,
            data: CheckoutData::default(),
            rates: SmallVec::new(),
            lines: Vec::new(),
            coupon: None,
        }
    }

    /// Currency the cart's totals are denominated in.
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.config.currency
    }

    /// Checkout fields currently on the cart.
    #[must_use]
    pub fn data(&self) -> &CheckoutData {
        &self.data
    }

    fn line_index(&self, id: ProductId) -> Option<usize> {
        self.lines.iter().position(|line| line.product_id() == id)
    }

    fn money(&self, minor: i64) -> Money<'static, Currency> {
        Money::from_minor(minor, self.config.currency)
    }

    // --- mutation ---

    /// Add `quantity` units of a product.
    ///
    /// An existing line is incremented; otherwise the product is resolved
    /// through the catalog and its current unit price and weight are
    /// captured into a new line. A quantity of zero never creates a line.
    /// Returns the line's resulting quantity.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Catalog`] if the product id is unknown to the
    /// catalog, or [`CartError::QuantityOverflow`] if an increment would
    /// overflow the line's quantity (the line is left unchanged).
    pub fn add(
        &mut self,
        catalog: &impl Catalog,
        id: ProductId,
        quantity: u32,
    ) -> Result<u32, CartError> {
        if let Some(line) = self.lines.iter_mut().find(|line| line.product_id() == id) {
            let updated = line
                .quantity()
                .checked_add(quantity)
                .ok_or(CartError::QuantityOverflow(id))?;

            line.set_quantity(updated);
            return Ok(updated);
        }

        if quantity == 0 {
            return Ok(0);
        }

        let product = catalog.find(id)?;
        let line = OrderLine::new(id, quantity, product.price.to_minor_units(), product.weight);

        self.lines.push(line);

        Ok(quantity)
    }

    /// Remove `quantity` units of a product; the line disappears entirely
    /// when its quantity drops to zero or below.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotInCart`] if the product has no line.
    pub fn subtract(&mut self, id: ProductId, quantity: u32) -> Result<(), CartError> {
        let index = self.line_index(id).ok_or(CartError::NotInCart(id))?;
        let current = self.lines.get(index).map_or(0, OrderLine::quantity);

        if current <= quantity {
            self.lines.remove(index);
        } else if let Some(line) = self.lines.get_mut(index) {
            line.set_quantity(current - quantity);
        }

        Ok(())
    }

    /// Set a product's quantity outright.
    ///
    /// Zero removes the line (silently when absent) and returns 0. A product
    /// not yet in the cart is added. Returns the resulting quantity.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Catalog`] if an absent product's id is unknown
    /// to the catalog.
    pub fn update(
        &mut self,
        catalog: &impl Catalog,
        id: ProductId,
        quantity: u32,
    ) -> Result<u32, CartError> {
        if quantity == 0 {
            if let Some(index) = self.line_index(id) {
                self.lines.remove(index);
            }
            return Ok(0);
        }

        if let Some(line) = self.lines.iter_mut().find(|line| line.product_id() == id) {
            line.set_quantity(quantity);
            return Ok(quantity);
        }

        self.add(catalog, id, quantity)
    }

    /// Remove a product's line entirely.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotInCart`] if the product has no line.
    pub fn remove(&mut self, id: ProductId) -> Result<(), CartError> {
        let index = self.line_index(id).ok_or(CartError::NotInCart(id))?;

        self.lines.remove(index);

        Ok(())
    }

    /// A product's current quantity; 0 when it has no line.
    #[must_use]
    pub fn quantity(&self, id: ProductId) -> u32 {
        self.line_index(id)
            .and_then(|index| self.lines.get(index))
            .map_or(0, OrderLine::quantity)
    }

    /// Number of distinct lines (not total units).
    #[must_use]
    pub fn count(&self) -> usize {
        self.lines.len()
    }

    /// Check whether the cart holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The line items, in the order they were added.
    #[must_use]
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    /// Total shipping weight of all lines, rounded to 2 decimal places.
    #[must_use]
    pub fn weight(&self) -> Decimal {
        self.lines
            .iter()
            .map(OrderLine::weight)
            .sum::<Decimal>()
            .round_dp(2)
    }

    // --- informational setters ---

    /// Record the purchaser's contact details.
    pub fn set_purchaser_info(&mut self, input: PurchaserInfo) {
        self.data.name = Some(input.name);
        self.data.email = Some(input.email);
    }

    /// Replace the cached shipping rates wholesale.
    pub fn set_rates(&mut self, rates: impl IntoIterator<Item = ShippingRate>) {
        self.rates = rates.into_iter().collect();
    }

    /// The cached shipping rates.
    #[must_use]
    pub fn rates(&self) -> &[ShippingRate] {
        &self.rates
    }

    /// Record the opaque shipment identifier from the shipping collaborator.
    pub fn set_shipment_id(&mut self, shipment_id: impl Into<String>) {
        self.data.shipment_id = Some(shipment_id.into());
    }

    /// Record the shipping address and price the chosen rate.
    ///
    /// The cached rates are scanned for `input.method`; on a match the
    /// shipping cost becomes the rate's amount in minor units. Without a
    /// match, strict configurations fail before any field is copied, so the
    /// cart never carries an address whose shipping cost is stale.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ShippingCostUnresolved`] in strict mode when no
    /// rate matches, or [`CartError::RateAmount`] if the matched quote is
    /// unrepresentable.
    pub fn set_shipping_info(&mut self, input: ShippingInfo) -> Result<(), CartError> {
        let resolved = self
            .rates
            .iter()
            .find(|rate| rate.id == input.method)
            .map(ShippingRate::amount_minor)
            .transpose()?;

        if resolved.is_none() && self.config.strict_shipping {
            return Err(CartError::ShippingCostUnresolved(input.method));
        }

        self.data.shipping_street = Some(input.street);
        self.data.shipping_street2 = input.street2;
        self.data.shipping_city = Some(input.city);
        self.data.shipping_state = Some(input.state);
        self.data.shipping_zip = Some(input.zip);
        self.data.shipping_country = Some(input.country);
        self.data.selected_rate_id = Some(input.method);

        if let Some(minor) = resolved {
            self.data.shipping_cost_minor = minor;
        }

        Ok(())
    }

    /// Record the billing address and payment pass-throughs.
    pub fn set_billing_info(&mut self, input: BillingInfo) {
        self.data.billing_street = Some(input.street);
        self.data.billing_city = Some(input.city);
        self.data.billing_state = Some(input.state);
        self.data.billing_zip = Some(input.zip);
        self.data.payment_token = Some(input.payment_token);
        self.data.card_type = Some(input.card_type);
    }

    // --- pricing pipeline ---

    /// Sum of line subtotals.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineTotalOverflow`] if a line subtotal does not
    /// fit in minor units, or [`CartError::Money`] if the accumulation
    /// fails.
    pub fn subtotal(&self) -> Result<Money<'static, Currency>, CartError> {
        self.lines.iter().try_fold(self.money(0), |acc, line| {
            let subtotal = line
                .subtotal(self.config.currency)
                .ok_or(CartError::LineTotalOverflow(line.product_id()))?;

            acc.add(subtotal).map_err(CartError::from)
        })
    }

    /// The resolved shipping charge.
    #[must_use]
    pub fn shipping(&self) -> Money<'static, Currency> {
        self.money(self.data.shipping_cost_minor)
    }

    /// The handling charge, falling back to the configured default when no
    /// override (or a zero override) is set.
    #[must_use]
    pub fn handling(&self) -> Money<'static, Currency> {
        let minor = match self.data.handling_cost_minor {
            None | Some(0) => self.config.handling_cost_minor,
            Some(minor) => minor,
        };

        self.money(minor)
    }

    /// Sales tax on the subtotal.
    ///
    /// Nonzero only when the billing state names the configured taxable
    /// jurisdiction (case-insensitively, by code or full name).
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Pricing`] or [`CartError::Money`] if the
    /// derivation fails.
    pub fn tax(&self) -> Result<Money<'static, Currency>, CartError> {
        let Some(state) = self.data.billing_state.as_deref() else {
            return Ok(self.money(0));
        };

        if !self.config.tax.matches(state) {
            return Ok(self.money(0));
        }

        let subtotal = self.subtotal()?;
        let minor = percent_of_minor(&self.config.tax.rate, subtotal.to_minor_units())?;

        Ok(self.money(minor))
    }

    /// Subtotal + tax + shipping + handling, before any coupon discount.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Money`] if the accumulation fails.
    pub fn pre_total(&self) -> Result<Money<'static, Currency>, CartError> {
        Ok(self
            .subtotal()?
            .add(self.tax()?)?
            .add(self.shipping())?
            .add(self.handling())?)
    }

    /// Value of the applied coupon; zero when none is applied.
    ///
    /// A percentage discount is taken from the pre-total. A flat discount is
    /// clamped to the pre-total so the final total can never go negative.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Pricing`] or [`CartError::Money`] if the
    /// derivation fails.
    pub fn coupon_value(&self) -> Result<Money<'static, Currency>, CartError> {
        let Some(coupon) = &self.coupon else {
            return Ok(self.money(0));
        };

        let pre_total = self.pre_total()?;

        if let Some(percent) = coupon.percentage_discount() {
            let minor = percent_of_minor(&percent, pre_total.to_minor_units())?;
            return Ok(self.money(minor));
        }

        if let Some(flat) = coupon.flat_discount_minor() {
            return Ok(self.money(flat.min(pre_total.to_minor_units())));
        }

        Ok(self.money(0))
    }

    /// The grand total: pre-total minus the coupon value.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Money`] if the subtraction fails.
    pub fn total(&self) -> Result<Money<'static, Currency>, CartError> {
        Ok(self.pre_total()?.sub(self.coupon_value()?)?)
    }

    /// The grand total expressed as an integer minor-unit value.
    ///
    /// # Errors
    ///
    /// Propagates any failure from [`Cart::total`].
    pub fn total_in_cents(&self) -> Result<i64, CartError> {
        Ok(self.total()?.to_minor_units())
    }

    // --- coupon ---

    /// Apply a coupon, replacing any previous one. Validity (usage limits,
    /// expiration) is the caller's responsibility.
    pub fn apply_coupon(&mut self, coupon: Coupon) {
        self.coupon = Some(coupon);
    }

    /// The applied coupon, if any.
    #[must_use]
    pub fn coupon(&self) -> Option<&Coupon> {
        self.coupon.as_ref()
    }

    // --- lifecycle ---

    /// Reset every checkout field, leaving lines and rates untouched.
    pub fn clear_checkout_data(&mut self) {
        self.data = CheckoutData::default();
    }

    /// Drop the cached shipping rates.
    pub fn clear_shipping_rates(&mut self) {
        self.rates.clear();
    }

    /// Empty the cart of line items.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Remove the applied coupon.
    pub fn clear_coupon(&mut self) {
        self.coupon = None;
    }

    /// Reset the cart for reuse after a completed checkout: checkout data,
    /// rates, lines and coupon all cleared.
    pub fn cleanup(&mut self) -> &mut Self {
        self.clear_checkout_data();
        self.clear_shipping_rates();
        self.clear();
        self.clear_coupon();

        self
    }

    // --- snapshots ---

    /// Derive the flat record handed to order creation.
    ///
    /// # Errors
    ///
    /// Propagates any failure from the pricing pipeline.
    pub fn for_order(&self) -> Result<OrderSummary, CartError> {
        Ok(OrderSummary {
            subtotal: self.subtotal()?,
            shipping: self.shipping(),
            handling: self.handling(),
            tax: self.tax()?,
            coupon_value: self.coupon_value()?,
            coupon: self.coupon.as_ref().map(|coupon| coupon.id().to_string()),
            total: self.total()?,
            name: self.data.name.clone(),
            email: self.data.email.clone(),
            shipment_id: self.data.shipment_id.clone(),
            selected_rate_id: self.data.selected_rate_id.clone(),
            shipping_street: self.data.shipping_street.clone(),
            shipping_city: self.data.shipping_city.clone(),
            shipping_state: self.data.shipping_state.clone(),
            shipping_zip: self.data.shipping_zip.clone(),
        })
    }

    /// Extract the full internal state for session persistence.
    #[must_use]
    pub fn for_session(&self) -> CartSnapshot {
        CartSnapshot {
            data: self.data.clone(),
            rates: self.rates.clone(),
            lines: self.lines.clone(),
            coupon: self.coupon.clone(),
        }
    }

    /// Rebuild a cart from a persisted snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: CartSnapshot, config: CartConfig) -> Self {
        Cart {
            config,
            data: snapshot.data,
            rates: snapshot.rates,
            lines: snapshot.lines,
            coupon: snapshot.coupon,
        }
    }

    // --- session binding ---

    /// Restore the cart stored under `key`, locking the session first.
    ///
    /// Waits up to [`DEFAULT_LOCK_WAIT`] for another accessor to release the
    /// session. The lock stays held until [`Cart::save`] or
    /// [`Cart::discard`].
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Session`] if the lock wait is exhausted, or
    /// [`CartError::Snapshot`] if the stored blob cannot be decoded (the
    /// lock is released in that case).
    pub fn restore(
        store: &impl SessionStore,
        key: &str,
        config: CartConfig,
    ) -> Result<Self, CartError> {
        Self::restore_with_wait(store, key, config, DEFAULT_LOCK_WAIT)
    }

    /// [`Cart::restore`] with an explicit lock-wait budget.
    ///
    /// # Errors
    ///
    /// As [`Cart::restore`].
    pub fn restore_with_wait(
        store: &impl SessionStore,
        key: &str,
        config: CartConfig,
        max_wait: Duration,
    ) -> Result<Self, CartError> {
        store.acquire(key, max_wait)?;

        let Some(blob) = store.get(key) else {
            tracing::debug!(key, "no stored cart; starting empty");
            return Ok(Cart::new(config));
        };

        match serde_json::from_str::<CartSnapshot>(&blob) {
            Ok(snapshot) => {
                tracing::debug!(key, lines = snapshot.lines.len(), "cart restored");
                Ok(Cart::from_snapshot(snapshot, config))
            }
            Err(error) => {
                // A corrupt blob must not wedge the session.
                store.release(key);
                Err(CartError::Snapshot(error))
            }
        }
    }

    /// Persist the cart under `key` and release the session lock.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Snapshot`] if serialization fails; the lock is
    /// kept in that case so the caller can retry or discard.
    pub fn save(&self, store: &impl SessionStore, key: &str) -> Result<(), CartError> {
        let blob = serde_json::to_string(&self.for_session())?;

        store.put(key, blob);
        store.release(key);

        tracing::debug!(key, lines = self.lines.len(), "cart saved");

        Ok(())
    }

    /// Release the session lock without persisting anything.
    pub fn discard(self, store: &impl SessionStore, key: &str) {
        store.release(key);
    }
}
