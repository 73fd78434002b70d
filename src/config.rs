//! Runtime configuration read once from the environment.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::coupon::CouponRule;

/// Service configuration. `ORDER_ENDPOINT_URL` is the only required
/// variable; a missing assistant credential switches the oil finder into
/// its offline mode rather than failing startup.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub order_endpoint: String,
    pub gemini_api_key: Option<String>,
    pub http_timeout_secs: u64,
    pub coupon: CouponRule,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{0} is invalid: {1}")]
    Invalid(&'static str, String),
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match std::env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|e: std::num::ParseIntError| ConfigError::Invalid("PORT", e.to_string()))?,
            Err(_) => 8083,
        };
        let order_endpoint = std::env::var("ORDER_ENDPOINT_URL")
            .map_err(|_| ConfigError::Missing("ORDER_ENDPOINT_URL"))?;
        let gemini_api_key = std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty());
        let http_timeout_secs = match std::env::var("HTTP_TIMEOUT_SECS") {
            Ok(raw) => raw.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::Invalid("HTTP_TIMEOUT_SECS", e.to_string())
            })?,
            Err(_) => 30,
        };
        Ok(Self {
            port,
            order_endpoint,
            gemini_api_key,
            http_timeout_secs,
            coupon: coupon_from_env()?,
        })
    }
}

/// The active promotion, overridable per deployment; rates outside [0, 1]
/// are rejected so a discount can never exceed the subtotal.
fn coupon_from_env() -> Result<CouponRule, ConfigError> {
    let mut rule = CouponRule::default();
    if let Ok(code) = std::env::var("COUPON_CODE") {
        if !code.is_empty() {
            rule.code = code;
        }
    }
    if let Ok(raw) = std::env::var("COUPON_RATE") {
        let rate: Decimal = raw
            .parse()
            .map_err(|e: rust_decimal::Error| ConfigError::Invalid("COUPON_RATE", e.to_string()))?;
        if rate < Decimal::ZERO || rate > Decimal::ONE {
            return Err(ConfigError::Invalid(
                "COUPON_RATE",
                "must lie within [0, 1]".to_string(),
            ));
        }
        rule.rate = rate;
    }
    Ok(rule)
}
