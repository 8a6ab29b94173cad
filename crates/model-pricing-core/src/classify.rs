use serde::{Deserialize, Serialize};

use crate::model::PricingRecord;

const RECURRING_MARKERS: &[&str] = &["month", "year", "annual", "subscription", "plan"];
const METERED_MARKERS: &[&str] = &["token", "request", "call"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PricingKind {
    /// Metered API usage.
    Usage,
    /// Flat recurring charge.
    Subscription,
}

/// Whether a record is a recurring charge rather than metered usage.
///
/// An unlabeled flat fee counts as a subscription: usage fees almost
/// always carry an explicit per-token/request/call unit.
pub fn is_subscription_pricing(record: &PricingRecord) -> bool {
    let unit = record.unit_lower();
    if RECURRING_MARKERS.iter().any(|m| unit.contains(m)) {
        return true;
    }
    record.flat.is_some() && !METERED_MARKERS.iter().any(|m| unit.contains(m))
}

pub fn classify(record: &PricingRecord) -> PricingKind {
    if is_subscription_pricing(record) {
        PricingKind::Subscription
    } else {
        PricingKind::Usage
    }
}

/// Whether a subscription unit bills yearly.
pub fn is_yearly(record: &PricingRecord) -> bool {
    let unit = record.unit_lower();
    unit.contains("year") || unit.contains("annual")
}
