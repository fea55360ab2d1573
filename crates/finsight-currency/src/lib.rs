//! Finsight Currency Normalizer
//!
//! Converts monetary values between the unit systems annual reports use
//! (INR Crores, INR) and the units extraction tasks demand (USD Billion,
//! USD), using an INR→USD rate that is cached for an hour and falls back to
//! a fixed approximation when the live source is unavailable.
//!
//! # Examples
//!
//! ```
//! use finsight_currency::{convert_with_rate, should_convert};
//!
//! assert!(should_convert("INR Crores", "USD Billion"));
//! let (value, unit) = convert_with_rate(255_324.0, "INR Crores", "USD Billion", 0.012);
//! assert_eq!(value, 30.64);
//! assert_eq!(unit, "USD Billion");
//! ```

#![warn(missing_docs)]

pub mod converter;
pub mod source;

use thiserror::Error;

pub use converter::{
    convert_inr_crores_to_usd_billion, convert_inr_to_usd, convert_with_rate, round2,
    should_convert, Conversion, CurrencyConverter, DEFAULT_CACHE_TTL_SECS, FALLBACK_INR_TO_USD,
};
pub use source::{
    FixedRateSource, HttpRateSource, RateSource, DEFAULT_RATE_ENDPOINT, DEFAULT_TIMEOUT_SECS,
};

/// Errors raised by a rate source
///
/// The converter absorbs all of these and falls back to the fixed rate.
#[derive(Error, Debug)]
pub enum RateError {
    /// Transport-level failure
    #[error("Rate request failed: {0}")]
    Communication(String),

    /// Non-success HTTP status
    #[error("Rate endpoint returned HTTP {0}")]
    Status(u16),

    /// Payload did not contain a usable rate
    #[error("Malformed rate payload: {0}")]
    MalformedPayload(String),

    /// Rate was zero, negative or not finite
    #[error("Invalid rate: {0}")]
    InvalidRate(f64),
}
