//! Checkout state machine.
//!
//! Linear `Cart → Form → Success` flow over the cart ledger and coupon
//! state. Shipping participates in totals only once the session has
//! reached the form step; a successful submission freezes an immutable
//! order snapshot and clears the working state in one move.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

use crate::clients::orders::{OrderItem, OrderRequest};
use crate::domain::cart::Cart;
use crate::domain::coupon::CouponState;

/// Flat delivery fee outside Dhaka city; inside the city delivery is free.
pub const OUTSIDE_DHAKA_FEE: u64 = 50;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    #[default]
    Cart,
    Form,
    Success,
}

/// Coarse delivery classification relative to Dhaka city.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShippingZone {
    #[default]
    Inside,
    Outside,
}

impl ShippingZone {
    pub fn fee(self) -> u64 {
        match self {
            Self::Inside => 0,
            Self::Outside => OUTSIDE_DHAKA_FEE,
        }
    }
}

/// Customer contact fields; all three are required before submission.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Validate)]
pub struct CustomerDetails {
    #[validate(length(min = 1, message = "phone is required"))]
    pub phone: String,
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "address is required"))]
    pub address: String,
}

/// Totals as displayed at any step. `shipping` stays zero until the
/// session reaches the form step with the outside zone selected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub subtotal: u64,
    pub discount: u64,
    pub shipping: u64,
    pub payable: u64,
}

/// Immutable record of the last confirmed order. Captured once per
/// successful submission, never mutated, overwritten only by the next one.
#[derive(Clone, Debug, Serialize)]
pub struct OrderSnapshot {
    pub order_number: String,
    pub items: Vec<OrderItem>,
    pub total: u64,
    pub details: CustomerDetails,
    pub shipping_zone: ShippingZone,
    pub discount: u64,
    pub placed_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("{0}")]
    InvalidDetails(String),
    #[error("an order submission is already in flight")]
    SubmissionInFlight,
    #[error("checkout form has not been opened")]
    NotInForm,
}

/// Per-session checkout state.
#[derive(Clone, Debug, Default)]
pub struct CheckoutSession {
    step: Step,
    shipping_zone: ShippingZone,
    details: CustomerDetails,
    last_order: Option<OrderSnapshot>,
    error: Option<String>,
    in_flight: bool,
}

impl CheckoutSession {
    pub fn step(&self) -> Step {
        self.step
    }

    pub fn shipping_zone(&self) -> ShippingZone {
        self.shipping_zone
    }

    pub fn details(&self) -> &CustomerDetails {
        &self.details
    }

    pub fn last_order(&self) -> Option<&OrderSnapshot> {
        self.last_order.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// `Cart → Form`: a pure UI transition, no validation.
    pub fn open_form(&mut self) {
        self.step = Step::Form;
    }

    /// Returns to cart review without touching form fields.
    pub fn back_to_cart(&mut self) {
        if self.step == Step::Form {
            self.step = Step::Cart;
        }
    }

    pub fn select_zone(&mut self, zone: ShippingZone) {
        self.shipping_zone = zone;
    }

    /// Delivery fee as it participates in totals: zero before the form
    /// step regardless of the selected zone.
    pub fn shipping_cost(&self) -> u64 {
        match self.step {
            Step::Cart => 0,
            Step::Form | Step::Success => self.shipping_zone.fee(),
        }
    }

    /// `payable = subtotal − round(subtotal × rate) + shipping`, recomputed
    /// from the live cart and coupon on every call.
    pub fn totals(&self, cart: &Cart, coupon: &CouponState) -> Totals {
        let subtotal = cart.subtotal();
        let discount = coupon.discount_amount(subtotal);
        let shipping = self.shipping_cost();
        Totals {
            subtotal,
            discount,
            shipping,
            payable: subtotal.saturating_sub(discount) + shipping,
        }
    }

    /// Validates the form and freezes the outbound order request, marking
    /// the submission as in flight. Exactly one of [`Self::complete`] or
    /// [`Self::fail`] must follow.
    ///
    /// An empty cart is permitted here (the HTTP layer guards it); the
    /// three contact fields are not.
    pub fn prepare_submission(
        &mut self,
        cart: &Cart,
        coupon: &CouponState,
        details: CustomerDetails,
    ) -> Result<OrderRequest, CheckoutError> {
        if self.step != Step::Form {
            return Err(CheckoutError::NotInForm);
        }
        if self.in_flight {
            return Err(CheckoutError::SubmissionInFlight);
        }
        details
            .validate()
            .map_err(|e| CheckoutError::InvalidDetails(flatten_validation(&e)))?;
        self.details = details.clone();
        self.error = None;

        let totals = self.totals(cart, coupon);
        let items = cart
            .lines()
            .iter()
            .map(|line| OrderItem {
                id: line.product.id.clone(),
                name: line.product.name.en.clone(),
                qty: line.qty,
                price: line.product.price,
            })
            .collect();
        self.in_flight = true;
        Ok(OrderRequest {
            items,
            total: totals.payable,
            details,
            shipping_zone: self.shipping_zone,
            discount: totals.discount,
        })
    }

    /// Success leg of a submission: captures the snapshot, clears the cart
    /// and coupon, resets the form, and enters `Success` atomically.
    pub fn complete(
        &mut self,
        cart: &mut Cart,
        coupon: &mut CouponState,
        request: OrderRequest,
    ) -> &OrderSnapshot {
        let snapshot = OrderSnapshot {
            order_number: format!("SP-{:05}", rand::random::<u32>() % 100_000),
            items: request.items,
            total: request.total,
            details: request.details,
            shipping_zone: request.shipping_zone,
            discount: request.discount,
            placed_at: Utc::now(),
        };
        cart.clear();
        coupon.reset();
        self.details = CustomerDetails::default();
        self.error = None;
        self.in_flight = false;
        self.step = Step::Success;
        self.last_order.insert(snapshot)
    }

    /// Failure leg: the session stays on the form with cart, coupon, and
    /// form fields preserved; the message is surfaced for display.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.in_flight = false;
        self.error = Some(message.into());
    }

    /// `Success → Cart` ("continue shopping"). The last order snapshot
    /// stays readable until the next successful submission overwrites it.
    pub fn continue_shopping(&mut self) {
        if self.step == Step::Success {
            self.step = Step::Cart;
        }
    }
}

fn flatten_validation(errors: &validator::ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("{field} is invalid"),
            })
        })
        .collect();
    parts.sort();
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::domain::coupon::CouponRule;
    use crate::i18n::Lang;

    fn details() -> CustomerDetails {
        CustomerDetails {
            phone: "01712345678".into(),
            name: "Rahim Uddin".into(),
            address: "House 7, Road 3, Dhanmondi, Dhaka".into(),
        }
    }

    fn loaded_cart() -> (Cart, CouponState) {
        let catalog = Catalog::builtin().expect("embedded catalog parses");
        let mut cart = Cart::default();
        cart.add(catalog.get("j700-5w40").unwrap(), 1); // 4500
        cart.add(catalog.get("xplore-10w30").unwrap(), 2); // 2 × 750
        let mut coupon = CouponState::default();
        coupon.evaluate(&CouponRule::default(), "SAVE10", Lang::En);
        (cart, coupon)
    }

    #[test]
    fn shipping_participates_only_from_the_form_step() {
        let (cart, coupon) = loaded_cart();
        let mut checkout = CheckoutSession::default();
        checkout.select_zone(ShippingZone::Outside);

        // Cart step: no shipping even with the outside zone selected.
        let at_cart = checkout.totals(&cart, &coupon);
        assert_eq!(at_cart.subtotal, 6000);
        assert_eq!(at_cart.discount, 600);
        assert_eq!(at_cart.shipping, 0);
        assert_eq!(at_cart.payable, 5400);

        checkout.open_form();
        let at_form = checkout.totals(&cart, &coupon);
        assert_eq!(at_form.shipping, OUTSIDE_DHAKA_FEE);
        assert_eq!(at_form.payable, 5450);
    }

    #[test]
    fn inside_zone_ships_free() {
        let (cart, coupon) = loaded_cart();
        let mut checkout = CheckoutSession::default();
        checkout.open_form();
        assert_eq!(checkout.totals(&cart, &coupon).payable, 5400);
    }

    #[test]
    fn empty_cart_totals_are_zero() {
        let checkout = CheckoutSession::default();
        let totals = checkout.totals(&Cart::default(), &CouponState::default());
        assert_eq!(totals.subtotal, 0);
        assert_eq!(totals.payable, 0);
    }

    #[test]
    fn submission_requires_the_form_step() {
        let (cart, coupon) = loaded_cart();
        let mut checkout = CheckoutSession::default();
        assert!(matches!(
            checkout.prepare_submission(&cart, &coupon, details()),
            Err(CheckoutError::NotInForm)
        ));
    }

    #[test]
    fn missing_fields_refuse_the_transition() {
        let (cart, coupon) = loaded_cart();
        let mut checkout = CheckoutSession::default();
        checkout.open_form();
        let err = checkout
            .prepare_submission(
                &cart,
                &coupon,
                CustomerDetails {
                    phone: "01712345678".into(),
                    ..CustomerDetails::default()
                },
            )
            .unwrap_err();
        let CheckoutError::InvalidDetails(message) = err else {
            panic!("expected InvalidDetails, got {err:?}");
        };
        assert!(message.contains("name is required"));
        assert!(message.contains("address is required"));
        assert_eq!(checkout.step(), Step::Form);
        assert!(!checkout.in_flight());
    }

    #[test]
    fn empty_item_list_is_permitted_but_fields_are_not() {
        // The HTTP layer refuses empty carts; the machine itself only
        // insists on the contact fields.
        let mut checkout = CheckoutSession::default();
        checkout.open_form();
        assert!(matches!(
            checkout.prepare_submission(&Cart::default(), &CouponState::default(), CustomerDetails::default()),
            Err(CheckoutError::InvalidDetails(_))
        ));
        let request = checkout
            .prepare_submission(&Cart::default(), &CouponState::default(), details())
            .expect("fields are present");
        assert!(request.items.is_empty());
        assert_eq!(request.total, 0);
    }

    #[test]
    fn overlapping_submissions_are_guarded() {
        let (cart, coupon) = loaded_cart();
        let mut checkout = CheckoutSession::default();
        checkout.open_form();
        checkout
            .prepare_submission(&cart, &coupon, details())
            .expect("first submission");
        assert!(matches!(
            checkout.prepare_submission(&cart, &coupon, details()),
            Err(CheckoutError::SubmissionInFlight)
        ));
    }

    #[test]
    fn success_snapshots_and_clears_atomically() {
        let (mut cart, mut coupon) = loaded_cart();
        let mut checkout = CheckoutSession::default();
        checkout.select_zone(ShippingZone::Outside);
        checkout.open_form();
        let request = checkout
            .prepare_submission(&cart, &coupon, details())
            .expect("submittable");

        let snapshot = checkout.complete(&mut cart, &mut coupon, request);
        assert_eq!(snapshot.total, 5450);
        assert_eq!(snapshot.discount, 600);
        assert_eq!(snapshot.items.len(), 2);
        assert_eq!(snapshot.shipping_zone, ShippingZone::Outside);
        assert!(snapshot.order_number.starts_with("SP-"));

        assert_eq!(checkout.step(), Step::Success);
        assert!(cart.is_empty());
        assert!(!coupon.is_applied());
        assert!(checkout.details().phone.is_empty());
        assert!(!checkout.in_flight());
    }

    #[test]
    fn failure_keeps_the_form_and_surfaces_the_message() {
        let (mut cart, mut coupon) = loaded_cart();
        let mut checkout = CheckoutSession::default();
        checkout.open_form();
        checkout
            .prepare_submission(&cart, &coupon, details())
            .expect("submittable");
        checkout.fail("Insufficient stock");

        assert_eq!(checkout.step(), Step::Form);
        assert_eq!(checkout.error(), Some("Insufficient stock"));
        assert!(!checkout.in_flight());
        assert!(!cart.is_empty());
        assert!(coupon.is_applied());
        assert_eq!(checkout.details().phone, details().phone);

        // Retry works once the flag is down.
        let request = checkout
            .prepare_submission(&cart, &coupon, details())
            .expect("retry allowed");
        checkout.complete(&mut cart, &mut coupon, request);
        assert_eq!(checkout.step(), Step::Success);
        assert!(checkout.error().is_none());
    }

    #[test]
    fn continue_shopping_keeps_the_snapshot() {
        let (mut cart, mut coupon) = loaded_cart();
        let mut checkout = CheckoutSession::default();
        checkout.open_form();
        let request = checkout
            .prepare_submission(&cart, &coupon, details())
            .expect("submittable");
        let order_number = checkout
            .complete(&mut cart, &mut coupon, request)
            .order_number
            .clone();

        checkout.continue_shopping();
        assert_eq!(checkout.step(), Step::Cart);
        assert_eq!(
            checkout.last_order().map(|o| o.order_number.as_str()),
            Some(order_number.as_str())
        );
    }
}
