//! Sinopec BD Storefront
//!
//! Bilingual (English/Bengali) storefront service for Sinopec lubricants
//! in Bangladesh: a static product catalog, session-scoped carts and
//! checkout, and a conversational oil-finder assistant.
//!
//! ## Features
//! - Bilingual catalog with per-field language fallback
//! - Session carts with merged line items and derived totals
//! - Coupon evaluation and shipping-zone aware checkout
//! - Order submission to an external fulfilment endpoint
//! - Oil-finder assistant backed by a generative language API, with an
//!   offline degradation mode

pub mod api;
pub mod catalog;
pub mod clients;
pub mod config;
pub mod domain;
pub mod i18n;
