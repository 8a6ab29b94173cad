//! Vendor unit strings to a canonical "cost per one million items".
//!
//! Vendors quote per token, per 1K, per 1M, or leave the unit off
//! entirely. Some also tag an already per-million price as "per token",
//! which inflates it by a factor of a million. The correction stage
//! undoes that guess. It is lossy: a genuinely huge price will be
//! shrunk too, so corrected figures are best-effort, never authoritative.

use crate::error::{PricingError, Result};

/// Values above this after scaling are assumed to be vendor scale mistakes.
pub const SCALE_CORRECTION_THRESHOLD: f64 = 10_000.0;

/// Repairs a per-million figure that looks mis-scaled.
pub trait ScaleCorrection: Send + Sync {
    fn correct(&self, per_million: f64) -> f64;
}

/// Default repair: divide by 1e6 when above the threshold, then by 1e3 if
/// still above it.
#[derive(Debug, Clone, Copy, Default)]
pub struct VendorScaleRepair;

impl ScaleCorrection for VendorScaleRepair {
    fn correct(&self, per_million: f64) -> f64 {
        let mut v = per_million;
        if v > SCALE_CORRECTION_THRESHOLD {
            v /= 1_000_000.0;
            if v > SCALE_CORRECTION_THRESHOLD {
                v /= 1_000.0;
            }
            tracing::debug!(from = per_million, to = v, "scale-corrected vendor price");
        }
        v
    }
}

/// Leaves figures untouched, for sources known to be clean.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCorrection;

impl ScaleCorrection for NoCorrection {
    fn correct(&self, per_million: f64) -> f64 {
        per_million
    }
}

/// Scale markers and the multiplier each implies. When a unit names more
/// than one scale, the earliest mention wins.
const SCALE_MARKERS: &[(&str, f64)] = &[
    ("1m", 1.0),
    ("million", 1.0),
    ("1k", 1_000.0),
    ("thousand", 1_000.0),
];

/// Position of `marker` in `unit` where it stands as its own token, so
/// "1m" matches "per 1m tokens" but neither "per 11m" nor "per 1mo".
fn find_marker(unit: &str, marker: &str) -> Option<usize> {
    unit.match_indices(marker).map(|(i, _)| i).find(|&i| {
        let before = unit[..i].chars().next_back();
        let after = unit[i + marker.len()..].chars().next();
        !before.is_some_and(|c| c.is_ascii_digit() || c == '.')
            && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Multiplier that takes a price in `unit` to a per-million price.
pub fn unit_multiplier(unit: Option<&str>) -> f64 {
    let unit = unit.unwrap_or("").to_lowercase();
    let scale = SCALE_MARKERS
        .iter()
        .filter_map(|&(marker, mult)| find_marker(&unit, marker).map(|i| (i, mult)))
        .min_by_key(|&(i, _)| i);
    match scale {
        Some((_, mult)) => mult,
        None if unit.contains("token") => 1_000_000.0,
        None => 1.0,
    }
}

/// Price per one million items, with the default vendor scale repair.
pub fn to_per_million(amount: f64, unit: Option<&str>) -> f64 {
    to_per_million_with(amount, unit, &VendorScaleRepair)
}

pub fn to_per_million_with(
    amount: f64,
    unit: Option<&str>,
    strategy: &dyn ScaleCorrection,
) -> f64 {
    if amount == 0.0 {
        return 0.0;
    }
    strategy.correct(amount * unit_multiplier(unit))
}

/// Like [`to_per_million`] but reports values the repair could not
/// bring back into range.
pub fn try_to_per_million(amount: f64, unit: Option<&str>) -> Result<f64> {
    if !amount.is_finite() {
        return Err(PricingError::MalformedPricing);
    }
    let value = to_per_million(amount, unit);
    if value > SCALE_CORRECTION_THRESHOLD {
        return Err(PricingError::NormalizationOverflow { value });
    }
    Ok(value)
}
