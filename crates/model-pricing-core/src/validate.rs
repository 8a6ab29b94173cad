//! Plausibility checks over pricing records.
//!
//! Two independent verdicts: a heuristic check that needs nothing but the
//! record, and a fact check against reference prices. They are never
//! merged here; callers OR them through [`has_validation_problems`].

use serde::{Deserialize, Serialize};

use crate::classify::{classify, PricingKind};
use crate::context::PricingContext;
use crate::currency::{detect_currency, RateTable};
use crate::error::PricingError;
use crate::model::{Model, PricingRecord};
use crate::reference::{ReferenceCosts, ReferenceScope};
use crate::units::{to_per_million, try_to_per_million, SCALE_CORRECTION_THRESHOLD};

/// Recurring charges above this per period are flagged.
pub const MAX_SUBSCRIPTION_PRICE: f64 = 10_000.0;

/// Output cheaper than input by more than this factor is unusual.
pub const OUTPUT_INPUT_RATIO_LIMIT: f64 = 10.0;

/// Beyond this many times outside the reference band, a price is rejected.
pub const REFERENCE_TOLERANCE: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationVerdict {
    pub is_valid: bool,
    pub confidence: Confidence,
    pub issues: Vec<String>,
}

impl ValidationVerdict {
    /// Nothing to compare against.
    pub fn unverified() -> Self {
        Self {
            is_valid: true,
            confidence: Confidence::Medium,
            issues: Vec::new(),
        }
    }

    pub fn has_problems(&self) -> bool {
        !self.is_valid || self.confidence == Confidence::Low
    }
}

/// Either verdict failing is enough to surface a warning.
pub fn has_validation_problems(
    heuristic: &ValidationVerdict,
    fact: Option<&ValidationVerdict>,
) -> bool {
    heuristic.has_problems() || fact.is_some_and(ValidationVerdict::has_problems)
}

struct Findings {
    is_valid: bool,
    confidence: Confidence,
    issues: Vec<String>,
}

impl Findings {
    fn new(confidence: Confidence) -> Self {
        Self {
            is_valid: true,
            confidence,
            issues: Vec::new(),
        }
    }

    fn invalid(&mut self, issue: String) {
        self.is_valid = false;
        self.confidence = Confidence::Low;
        self.issues.push(issue);
    }

    fn lower(&mut self, to: Confidence, issue: String) {
        self.confidence = self.confidence.min(to);
        self.issues.push(issue);
    }

    fn finish(self) -> ValidationVerdict {
        ValidationVerdict {
            is_valid: self.is_valid,
            confidence: if self.is_valid { self.confidence } else { Confidence::Low },
            issues: self.issues,
        }
    }
}

/// Typical per-million-token range for a domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlausibleRange {
    pub min: f64,
    pub max: f64,
}

const TEXT_DOMAINS: &[&str] = &[
    "text",
    "chat",
    "code",
    "llm",
    "language",
    "reasoning",
    "conversational",
];

pub fn plausible_range(domain: Option<&str>) -> PlausibleRange {
    let d = domain.unwrap_or("").to_lowercase();
    if d.contains("embed") {
        PlausibleRange { min: 0.001, max: 10.0 }
    } else if TEXT_DOMAINS.iter().any(|t| d.contains(t)) {
        PlausibleRange { min: 0.01, max: 500.0 }
    } else {
        PlausibleRange {
            min: 0.0,
            max: SCALE_CORRECTION_THRESHOLD,
        }
    }
}

/// Heuristic check: negative or non-numeric amounts, magnitudes implausible
/// for the domain, and self-contradictory records.
pub fn validate(
    record: &PricingRecord,
    model_name: &str,
    domain: Option<&str>,
) -> ValidationVerdict {
    let mut f = Findings::new(Confidence::High);

    if !record.is_usable() {
        f.invalid(PricingError::MalformedPricing.to_string());
        return f.finish();
    }

    for (field, amount) in record.amounts() {
        if !amount.is_finite() {
            f.invalid(format!("{field} price is not a finite number"));
        } else if amount < 0.0 {
            f.invalid(format!("negative {field} price: {amount}"));
        }
    }

    if record.flat.is_some() && (record.input.is_some() || record.output.is_some()) {
        f.lower(
            Confidence::Medium,
            "both a flat price and metered input/output prices are set".to_string(),
        );
    }

    let unit = record.unit.as_deref();
    match classify(record) {
        PricingKind::Subscription => {
            if let Some(flat) = record.flat.filter(|v| v.is_finite()) {
                if flat > MAX_SUBSCRIPTION_PRICE {
                    f.lower(
                        Confidence::Low,
                        format!("subscription price {flat} per period is unusually high"),
                    );
                }
            }
        }
        PricingKind::Usage => {
            let range = plausible_range(domain);
            let domain_label = domain.unwrap_or("this kind of model");
            for (field, amount) in record.amounts() {
                if !amount.is_finite() || amount <= 0.0 {
                    continue;
                }
                match try_to_per_million(amount, unit) {
                    Err(PricingError::NormalizationOverflow { value }) => f.lower(
                        Confidence::Low,
                        format!(
                            "{field} price is implausible even after scale correction \
                             ({value:.0} per 1M)"
                        ),
                    ),
                    Err(e) => f.invalid(format!("{field} price: {e}")),
                    // Flat usage fees are per call, not per token; only the overflow check applies.
                    Ok(_) if field == "flat" => {}
                    Ok(per_m) if per_m > range.max => f.lower(
                        Confidence::Low,
                        format!(
                            "{field} price {per_m:.2} per 1M is implausibly high for {domain_label}"
                        ),
                    ),
                    Ok(per_m) if per_m < range.min => f.lower(
                        Confidence::Medium,
                        format!(
                            "{field} price {per_m:.4} per 1M is unusually low for {domain_label}"
                        ),
                    ),
                    Ok(_) => {}
                }
            }
        }
    }

    if let (Some(input), Some(output)) = (record.input, record.output) {
        if input.is_finite() && output > 0.0 && output * OUTPUT_INPUT_RATIO_LIMIT < input {
            f.lower(
                Confidence::Medium,
                format!(
                    "output price {output} is more than {OUTPUT_INPUT_RATIO_LIMIT}x lower \
                     than input price {input}"
                ),
            );
        }
    }

    let verdict = f.finish();
    tracing::debug!(
        model = model_name,
        valid = verdict.is_valid,
        confidence = %verdict.confidence,
        issues = verdict.issues.len(),
        "heuristic pricing check"
    );
    verdict
}

/// Compare metered rates with a reference price, when one is known.
///
/// Returns an unverified (medium, no issues) verdict when there is no
/// reference source, no matching entry, or nothing comparable in the record.
pub fn fact_check(
    record: &PricingRecord,
    model_name: &str,
    domain: Option<&str>,
    reference: Option<&dyn ReferenceCosts>,
    rates: &RateTable,
) -> ValidationVerdict {
    let Some((scope, expected)) = reference.and_then(|r| r.expected(model_name, domain)) else {
        return ValidationVerdict::unverified();
    };
    if classify(record) == PricingKind::Subscription {
        return ValidationVerdict::unverified();
    }

    let cap = match scope {
        ReferenceScope::Model => Confidence::High,
        ReferenceScope::Domain => Confidence::Medium,
    };
    let mut f = Findings::new(cap);
    let source = detect_currency(record);
    let unit = record.unit.as_deref();
    let mut compared = 0;

    for (field, amount, band) in [
        ("input", record.input, expected.input),
        ("output", record.output, expected.output),
    ] {
        let (Some(amount), Some(band)) = (amount, band) else {
            continue;
        };
        if !amount.is_finite() || amount <= 0.0 {
            continue;
        }
        let per_m = match rates.convert(to_per_million(amount, unit), &source, &expected.currency) {
            Ok(v) => v,
            Err(e) => {
                f.lower(Confidence::Medium, format!("cannot compare with reference price: {e}"));
                return f.finish();
            }
        };
        compared += 1;
        if band.contains(per_m) {
            continue;
        }
        let deviation = band.deviation(per_m);
        let msg = format!(
            "{field} price {per_m:.2} {cur}/1M is outside the expected {min}-{max} range",
            cur = expected.currency,
            min = band.min,
            max = band.max,
        );
        if deviation <= REFERENCE_TOLERANCE {
            f.lower(Confidence::Medium, msg);
        } else {
            f.invalid(format!("{msg} by more than {REFERENCE_TOLERANCE}x"));
        }
    }

    if compared == 0 {
        return ValidationVerdict::unverified();
    }
    let verdict = f.finish();
    tracing::debug!(
        model = model_name,
        valid = verdict.is_valid,
        confidence = %verdict.confidence,
        "reference pricing check"
    );
    verdict
}

/// Both verdicts for a model's primary quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelVerdicts {
    pub heuristic: ValidationVerdict,
    /// Present only when the context carries a reference source.
    pub fact_check: Option<ValidationVerdict>,
}

impl ModelVerdicts {
    pub fn has_problems(&self) -> bool {
        has_validation_problems(&self.heuristic, self.fact_check.as_ref())
    }
}

/// Validate the primary quote of a model; `None` when it has no usable record.
pub fn validate_model(model: &Model, ctx: &PricingContext<'_>) -> Option<ModelVerdicts> {
    let primary = model.primary_pricing()?;
    let domain = model.domain.as_deref();
    Some(ModelVerdicts {
        heuristic: validate(primary, &model.name, domain),
        fact_check: ctx
            .reference
            .map(|r| fact_check(primary, &model.name, domain, Some(r), ctx.rates)),
    })
}
