//! One visitor's storefront session.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::cart::Cart;
use crate::domain::chat::Transcript;
use crate::domain::checkout::{CheckoutSession, Totals};
use crate::domain::coupon::CouponState;
use crate::i18n::Lang;

/// Cart, coupon, checkout, and chat state owned by one visitor. A session
/// is mutated by a single request at a time and shares nothing with other
/// sessions.
#[derive(Clone, Debug)]
pub struct StoreSession {
    pub id: String,
    pub lang: Lang,
    pub cart: Cart,
    pub coupon: CouponState,
    pub checkout: CheckoutSession,
    pub chat: Transcript,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoreSession {
    pub fn new(lang: Lang) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            lang,
            cart: Cart::default(),
            coupon: CouponState::default(),
            checkout: CheckoutSession::default(),
            chat: Transcript::new(lang),
            created_at: now,
            updated_at: now,
        }
    }

    /// Switches the display language. Product data is untouched; the chat
    /// greeting is re-localized while it is still the only message.
    pub fn set_lang(&mut self, lang: Lang) {
        self.lang = lang;
        self.chat.relocalize_greeting(lang);
        self.touch();
    }

    pub fn totals(&self) -> Totals {
        self.checkout.totals(&self.cart, &self.coupon)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
