//! Division with a declared sentinel policy.
//!
//! Every ratio in the engine goes through this module. A zero (or
//! non-finite) denominator never produces NaN or Infinity; it produces the
//! sentinel the caller names, so sorting and threshold comparisons downstream
//! always see ordinary finite numbers.
//!
//! Sentinels in use:
//! - rates, margins, GMROI, sell-through, turnover, CV: `0.0`
//! - coverage days: [`COVERAGE_SENTINEL_DAYS`] (no movement = effectively infinite)

/// Coverage reported for stock that is not selling at all.
///
/// Chosen to exceed the default day-based thresholds (obsolete is 365), so a
/// non-moving product with stock on hand always reads as "never runs out".
pub const COVERAGE_SENTINEL_DAYS: f64 = 999.0;

/// `numerator / denominator`, or `sentinel` when the quotient is undefined.
///
/// The denominator must be strictly positive; zero and negative denominators
/// both resolve to the sentinel (a negative stock or window is never a valid
/// basis for a rate).
pub fn safe_ratio(numerator: f64, denominator: f64, sentinel: f64) -> f64 {
    if !numerator.is_finite() || !denominator.is_finite() || denominator <= 0.0 {
        return sentinel;
    }
    let q = numerator / denominator;
    if q.is_finite() {
        q
    } else {
        sentinel
    }
}

/// Ratio with the `0.0` sentinel (rates, margins, returns).
pub fn ratio_or_zero(numerator: f64, denominator: f64) -> f64 {
    safe_ratio(numerator, denominator, 0.0)
}

/// Days until `quantity` is exhausted at `daily_rate`.
///
/// Zero rate gives [`COVERAGE_SENTINEL_DAYS`]. A positive rate with
/// non-positive stock gives `0.0` (already out). A slow mover reports its
/// real horizon, which may exceed the sentinel.
pub fn coverage_days(quantity: f64, daily_rate: f64) -> f64 {
    if daily_rate.is_nan() || daily_rate <= 0.0 {
        return COVERAGE_SENTINEL_DAYS;
    }
    if quantity <= 0.0 {
        return 0.0;
    }
    safe_ratio(quantity, daily_rate, COVERAGE_SENTINEL_DAYS)
}

/// Replace NaN / Infinity with `0.0`; used when ingesting raw cells.
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
