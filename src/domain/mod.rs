//! Session-scoped storefront state machines.

pub mod cart;
pub mod chat;
pub mod checkout;
pub mod coupon;
pub mod session;

pub use cart::{Cart, CartLine};
pub use chat::{ChatMessage, Role, Transcript};
pub use checkout::{
    CheckoutError, CheckoutSession, CustomerDetails, OrderSnapshot, ShippingZone, Step, Totals,
};
pub use coupon::{CouponRule, CouponState};
pub use session::StoreSession;
