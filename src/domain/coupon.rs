//! Coupon evaluation.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::i18n::{messages, Lang};

/// The active promotion: a code matched case-insensitively and the
/// discount rate it grants. Injected from configuration; the shipped
/// default is the 10% `SAVE10` promotion.
#[derive(Clone, Debug)]
pub struct CouponRule {
    pub code: String,
    pub rate: Decimal,
}

impl Default for CouponRule {
    fn default() -> Self {
        Self {
            code: "SAVE10".to_string(),
            rate: Decimal::new(10, 2),
        }
    }
}

/// Outcome of the latest coupon evaluation. After an evaluation exactly one
/// of `applied_discount > 0` or `error` holds; re-evaluating replaces the
/// state wholesale, so discounts never stack.
#[derive(Clone, Debug, Default)]
pub struct CouponState {
    pub code: String,
    pub applied_discount: Decimal,
    pub error: Option<String>,
}

impl CouponState {
    /// Evaluates a user-entered code against the active rule.
    pub fn evaluate(&mut self, rule: &CouponRule, code: &str, lang: Lang) {
        self.code = code.to_string();
        if code.eq_ignore_ascii_case(&rule.code) {
            self.applied_discount = rule.rate;
            self.error = None;
        } else {
            self.applied_discount = Decimal::ZERO;
            self.error = Some(messages::invalid_coupon(lang).to_string());
        }
    }

    /// Discount in whole Taka: `round(subtotal × rate)`, half away from
    /// zero, recomputed from the live subtotal on every call.
    pub fn discount_amount(&self, subtotal: u64) -> u64 {
        (Decimal::from(subtotal) * self.applied_discount)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u64()
            .unwrap_or(0)
    }

    pub fn is_applied(&self) -> bool {
        self.applied_discount > Decimal::ZERO
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_code_matches_in_any_casing() {
        let rule = CouponRule::default();
        for code in ["SAVE10", "save10", "SaVe10"] {
            let mut state = CouponState::default();
            state.evaluate(&rule, code, Lang::En);
            assert_eq!(state.applied_discount, Decimal::new(10, 2));
            assert!(state.error.is_none());
            assert!(state.is_applied());
        }
    }

    #[test]
    fn mismatch_clears_discount_and_sets_localized_error() {
        let rule = CouponRule::default();
        let mut state = CouponState::default();
        state.evaluate(&rule, "SAVE20", Lang::Bn);
        assert_eq!(state.applied_discount, Decimal::ZERO);
        assert_eq!(state.error.as_deref(), Some(messages::invalid_coupon(Lang::Bn)));
    }

    #[test]
    fn reevaluation_replaces_prior_state_wholesale() {
        let rule = CouponRule::default();
        let mut state = CouponState::default();
        state.evaluate(&rule, "save10", Lang::En);
        state.evaluate(&rule, "nope", Lang::En);
        assert!(!state.is_applied());
        assert!(state.error.is_some());

        state.evaluate(&rule, "SAVE10", Lang::En);
        assert!(state.is_applied());
        assert!(state.error.is_none());
    }

    #[test]
    fn discount_rounds_half_away_from_zero() {
        let rule = CouponRule::default();
        let mut state = CouponState::default();
        state.evaluate(&rule, "SAVE10", Lang::En);
        assert_eq!(state.discount_amount(6000), 600);
        assert_eq!(state.discount_amount(4505), 451); // 450.5 rounds up
        assert_eq!(state.discount_amount(0), 0);
    }

    #[test]
    fn unapplied_state_discounts_nothing() {
        let state = CouponState::default();
        assert_eq!(state.discount_amount(6000), 0);
    }
}
