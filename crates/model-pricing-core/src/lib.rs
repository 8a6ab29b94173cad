pub mod classify;
pub mod context;
pub mod cost;
pub mod currency;
pub mod error;
pub mod format;
pub mod model;
pub mod reference;
pub mod report;
pub mod units;
#[cfg(feature = "user-data")]
pub mod userdata;
pub mod validate;

pub use classify::{is_subscription_pricing, PricingKind};
pub use context::PricingContext;
pub use cost::{describe_cost, Badge, BadgeKind, CostSummary};
pub use currency::{detect_currency, RateTable};
pub use error::PricingError;
pub use model::{License, LicenseKind, Model, PricingRecord};
pub use reference::{ReferenceCosts, ReferenceTable};
pub use units::to_per_million;
pub use validate::{fact_check, validate, Confidence, ValidationVerdict};
