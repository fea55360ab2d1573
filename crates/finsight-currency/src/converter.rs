//! Cached currency converter and the unit-matching rules
//!
//! All unit matching is case-insensitive substring matching over free-text
//! labels, since report prose writes units as "INR Crores", "₹ crore",
//! "Rs. crore" and so on.

use crate::source::RateSource;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Rate used when the live source fails (1 INR ≈ 0.012 USD)
pub const FALLBACK_INR_TO_USD: f64 = 0.012;

/// Default validity window of a fetched rate (1 hour)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

/// 1 Crore = 10 million = 0.01 Billion
const CRORE_TO_BILLION: f64 = 0.01;

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Whether a value found in `found_unit` must be converted for `required_unit`
pub fn should_convert(found_unit: &str, required_unit: &str) -> bool {
    let found = found_unit.to_lowercase();
    let required = required_unit.to_lowercase();

    ((found.contains("inr") || found_unit.contains('₹')) && required.contains("usd"))
        || (found.contains("crore") && required.contains("usd billion"))
}

/// INR Crores to USD Billion at `rate`
pub fn convert_inr_crores_to_usd_billion(inr_crores: f64, rate: f64) -> f64 {
    round2(inr_crores * rate * CRORE_TO_BILLION)
}

/// INR to USD at `rate`
pub fn convert_inr_to_usd(inr: f64, rate: f64) -> f64 {
    round2(inr * rate)
}

/// Apply the first matching conversion rule at an explicit rate
///
/// Rules, in order:
/// 1. from contains "crore", to contains "usd billion" → USD Billion
/// 2. from contains "inr", to contains "usd" → USD
/// 3. from contains "₹" and "crore", to contains "usd billion" → USD Billion
///
/// With no match the input value and unit are returned unchanged.
pub fn convert_with_rate(value: f64, from_unit: &str, to_unit: &str, rate: f64) -> (f64, String) {
    let from = from_unit.to_lowercase();
    let to = to_unit.to_lowercase();

    if from.contains("crore") && to.contains("usd billion") {
        (convert_inr_crores_to_usd_billion(value, rate), "USD Billion".to_string())
    } else if from.contains("inr") && to.contains("usd") {
        (convert_inr_to_usd(value, rate), "USD".to_string())
    } else if from_unit.contains('₹') && from.contains("crore") && to.contains("usd billion") {
        (convert_inr_crores_to_usd_billion(value, rate), "USD Billion".to_string())
    } else {
        (value, from_unit.to_string())
    }
}

/// Result of a conversion together with the rate applied
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    /// Converted value
    pub value: f64,
    /// Converted unit
    pub unit: String,
    /// INR→USD rate used
    pub rate: f64,
}

impl Conversion {
    /// Human-readable note describing this conversion of `original`
    pub fn note(&self, original_value: f64, original_unit: &str) -> String {
        format!(
            "Converted from {} {} to {} {} at 1 INR = {} USD",
            original_value, original_unit, self.value, self.unit, self.rate
        )
    }
}

/// Currency converter with a shared rate cache
///
/// Create one per process and share it through `Arc`; every clone of the
/// `Arc` sees the same cache.
pub struct CurrencyConverter {
    source: Arc<dyn RateSource>,
    ttl: Duration,
    cache: Mutex<Option<(f64, Instant)>>,
}

impl CurrencyConverter {
    /// Create a converter over `source` with the default one-hour cache
    pub fn new(source: Arc<dyn RateSource>) -> Self {
        Self {
            source,
            ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            cache: Mutex::new(None),
        }
    }

    /// Set the cache validity window
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Current INR→USD rate
    ///
    /// Served from the cache while it is fresh. On a miss the source is
    /// asked; any failure yields [`FALLBACK_INR_TO_USD`], which is not cached.
    pub async fn rate(&self) -> f64 {
        let mut cache = self.cache.lock().await;

        if let Some((rate, fetched_at)) = *cache {
            if fetched_at.elapsed() < self.ttl {
                return rate;
            }
        }

        match self.source.fetch_inr_to_usd().await {
            Ok(rate) if rate.is_finite() && rate > 0.0 => {
                debug!(rate, "Updated INR to USD rate");
                *cache = Some((rate, Instant::now()));
                rate
            }
            Ok(rate) => {
                warn!(rate, fallback = FALLBACK_INR_TO_USD, "Rejected invalid exchange rate");
                FALLBACK_INR_TO_USD
            }
            Err(e) => {
                warn!(error = %e, fallback = FALLBACK_INR_TO_USD, "Failed to fetch live exchange rate");
                FALLBACK_INR_TO_USD
            }
        }
    }

    /// Convert `value` from `from_unit` to `to_unit` at the current rate
    pub async fn convert(&self, value: f64, from_unit: &str, to_unit: &str) -> (f64, String) {
        let conversion = self.convert_detailed(value, from_unit, to_unit).await;
        (conversion.value, conversion.unit)
    }

    /// Like [`convert`](Self::convert) but also reports the rate used
    pub async fn convert_detailed(&self, value: f64, from_unit: &str, to_unit: &str) -> Conversion {
        let rate = self.rate().await;
        let (value, unit) = convert_with_rate(value, from_unit, to_unit, rate);
        Conversion { value, unit, rate }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FixedRateSource;
    use crate::RateError;
    use async_trait::async_trait;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Source that counts its calls and replays a fixed outcome
    struct CountingSource {
        rate: Result<f64, ()>,
        calls: AtomicUsize,
    }

    impl CountingSource {
        fn new(rate: Result<f64, ()>) -> Arc<Self> {
            Arc::new(Self {
                rate,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RateSource for CountingSource {
        async fn fetch_inr_to_usd(&self) -> Result<f64, RateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.rate
                .map_err(|_| RateError::Communication("connection refused".to_string()))
        }
    }

    #[test]
    fn test_should_convert() {
        assert!(should_convert("INR Crores", "USD Billion"));
        assert!(should_convert("inr", "USD"));
        assert!(should_convert("₹", "usd"));
        assert!(should_convert("Rs. Crore", "USD Billion"));
        assert!(!should_convert("USD Million", "USD Billion"));
        assert!(!should_convert("INR Crores", "INR Crores"));
        assert!(!should_convert("Crores", "USD"));
    }

    #[test]
    fn test_conversion_rules() {
        assert_eq!(
            convert_with_rate(255_324.0, "INR Crores", "USD Billion", 0.012),
            (30.64, "USD Billion".to_string())
        );
        assert_eq!(
            convert_with_rate(134.19, "INR", "USD", 0.012),
            (1.61, "USD".to_string())
        );
        assert_eq!(
            convert_with_rate(1000.0, "₹ crore", "USD Billion", 0.012),
            (0.12, "USD Billion".to_string())
        );
        // No rule: identity
        assert_eq!(
            convert_with_rate(42.0, "EUR Million", "USD Billion", 0.012),
            (42.0, "EUR Million".to_string())
        );
    }

    #[test]
    fn test_conversion_note() {
        let conversion = Conversion {
            value: 30.64,
            unit: "USD Billion".to_string(),
            rate: 0.012,
        };
        assert_eq!(
            conversion.note(255_324.0, "INR Crores"),
            "Converted from 255324 INR Crores to 30.64 USD Billion at 1 INR = 0.012 USD"
        );
    }

    #[tokio::test]
    async fn test_fetched_rate_is_cached() {
        let source = CountingSource::new(Ok(0.0119));
        let converter = CurrencyConverter::new(source.clone());

        assert_eq!(converter.rate().await, 0.0119);
        assert_eq!(converter.rate().await, 0.0119);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_expired_cache_refetches() {
        let source = CountingSource::new(Ok(0.0119));
        let converter = CurrencyConverter::new(source.clone()).with_ttl(Duration::ZERO);

        converter.rate().await;
        converter.rate().await;
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_failure_falls_back_without_caching() {
        let source = CountingSource::new(Err(()));
        let converter = CurrencyConverter::new(source.clone());

        assert_eq!(converter.rate().await, FALLBACK_INR_TO_USD);
        assert_eq!(converter.rate().await, FALLBACK_INR_TO_USD);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_invalid_rate_falls_back() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let converter = CurrencyConverter::new(Arc::new(FixedRateSource::new(bad)));
            assert_eq!(converter.rate().await, FALLBACK_INR_TO_USD);
        }
    }

    #[tokio::test]
    async fn test_convert_uses_current_rate() {
        let converter = CurrencyConverter::new(Arc::new(FixedRateSource::unavailable()));
        let (value, unit) = converter.convert(255_324.0, "INR Crores", "USD Billion").await;
        assert_eq!(value, 30.64);
        assert_eq!(unit, "USD Billion");

        let detailed = converter.convert_detailed(134.19, "INR", "USD").await;
        assert_eq!(detailed.rate, FALLBACK_INR_TO_USD);
    }

    proptest! {
        #[test]
        fn prop_crores_to_billion_formula(x in 0.0f64..1.0e9, rate in 0.001f64..1.0) {
            prop_assert_eq!(
                convert_inr_crores_to_usd_billion(x, rate),
                round2(x * rate * 0.01)
            );
        }

        #[test]
        fn prop_identity_when_no_rule_applies(
            value in -1.0e9f64..1.0e9,
            unit in "(EUR|GBP|JPY|USD)( Million| Billion)?",
        ) {
            prop_assert!(!should_convert(&unit, "USD Billion"));
            let (converted, converted_unit) = convert_with_rate(value, &unit, "EUR", 0.012);
            prop_assert_eq!(converted, value);
            prop_assert_eq!(converted_unit, unit);
        }
    }
}
