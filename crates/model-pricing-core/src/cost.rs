//! Short display badges and tooltip text for a model's pricing.

use serde::Serialize;

use crate::classify::{is_subscription_pricing, is_yearly};
use crate::context::PricingContext;
use crate::currency::{detect_currency, same_currency};
use crate::format::{format_amount, format_amount_with};
use crate::model::{Model, PricingRecord};
use crate::units::to_per_million;
use crate::validate::validate_model;

/// Shown when nothing usable can be displayed.
pub const PLACEHOLDER: &str = "—";

/// Input tokens weigh three times output tokens in the blended figure.
pub const INPUT_WEIGHT: f64 = 3.0;
pub const OUTPUT_WEIGHT: f64 = 1.0;

/// Flat API fees are priced per call; per-million figures divide by this
/// to give a per-1K-requests figure.
pub const FLAT_FEE_DIVISOR: f64 = 1_000.0;

const VALIDATION_WARNING: &str = "⚠ Pricing data may be inaccurate";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeKind {
    Free,
    Local,
    Hardware,
    Api,
    Subscription,
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Badge {
    pub kind: BadgeKind,
    pub label: String,
}

impl Badge {
    fn new(kind: BadgeKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostSummary {
    #[serde(rename = "shortDisplay")]
    pub badges: Vec<Badge>,
    pub tooltip: String,
    pub has_validation_issues: bool,
}

impl CostSummary {
    /// Badge labels joined for plain-text output.
    pub fn display_text(&self) -> String {
        self.badges
            .iter()
            .map(|b| b.label.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn labels(&self) -> Vec<&str> {
        self.badges.iter().map(|b| b.label.as_str()).collect()
    }
}

/// Weighted average of input and output per-unit rates.
pub fn blended_cost(input: f64, output: f64) -> f64 {
    (input * INPUT_WEIGHT + output * OUTPUT_WEIGHT) / (INPUT_WEIGHT + OUTPUT_WEIGHT)
}

/// One rendered quote: its badge plus the tooltip line describing it.
struct Quote {
    badge: Badge,
    detail: String,
    converted_from: Option<String>,
}

/// Converts an amount into the target currency. A failed conversion keeps
/// the original amount so the record still renders.
struct Converter<'c, 'a> {
    ctx: &'c PricingContext<'a>,
    source: String,
    converted: bool,
}

impl<'c, 'a> Converter<'c, 'a> {
    fn new(ctx: &'c PricingContext<'a>, record: &PricingRecord) -> Self {
        Self {
            ctx,
            source: detect_currency(record),
            converted: false,
        }
    }

    fn convert(&mut self, amount: f64) -> f64 {
        let target = self.ctx.target_currency;
        if same_currency(&self.source, target) {
            return amount;
        }
        let rates = self.ctx.rates;
        self.converted = rates.contains(&self.source) && rates.contains(target);
        rates.convert_or_passthrough(amount, &self.source, target)
    }

    fn converted_from(&self) -> Option<String> {
        self.converted.then(|| self.source.clone())
    }
}

fn api_quote(record: &PricingRecord, ctx: &PricingContext<'_>) -> Option<Quote> {
    let unit = record.unit.as_deref();
    let target = ctx.target_currency;
    let mut conv = Converter::new(ctx, record);
    let mut per_m = |amount: f64| conv.convert(to_per_million(amount, unit));

    let (value, detail) = match (record.flat, record.input, record.output) {
        (Some(flat), _, _) => {
            let value = per_m(flat) / FLAT_FEE_DIVISOR;
            (value, format!("API: {} per 1K requests", format_amount_with(value, target, 3)))
        }
        (None, Some(input), Some(output)) => {
            let (input, output) = (per_m(input), per_m(output));
            let value = blended_cost(input, output);
            let detail = format!(
                "API: {} input / {} output per 1M, ~{} blended",
                format_amount_with(input, target, 3),
                format_amount_with(output, target, 3),
                format_amount_with(value, target, 3),
            );
            (value, detail)
        }
        (None, Some(rate), None) | (None, None, Some(rate)) => {
            let value = per_m(rate);
            (value, format!("API: {} per 1M", format_amount_with(value, target, 3)))
        }
        (None, None, None) => return None,
    };

    Some(Quote {
        badge: Badge::new(
            BadgeKind::Api,
            format!("API • ~{}/1K requests", format_amount_with(value, target, 3)),
        ),
        detail,
        converted_from: conv.converted_from(),
    })
}

fn subscription_quote(record: &PricingRecord, ctx: &PricingContext<'_>) -> Option<Quote> {
    let flat = record.flat?;
    let mut conv = Converter::new(ctx, record);
    let amount = format_amount(conv.convert(flat), ctx.target_currency);
    let (period, period_word) = if is_yearly(record) {
        ("/yr", "per year")
    } else {
        ("/mo", "per month")
    };
    Some(Quote {
        badge: Badge::new(BadgeKind::Subscription, format!("Sub: {amount}{period}")),
        detail: format!("Subscription: {amount} {period_word}"),
        converted_from: conv.converted_from(),
    })
}

fn free_badges(model: &Model) -> Vec<Badge> {
    let mut badges = vec![
        Badge::new(BadgeKind::Free, "Free"),
        Badge::new(BadgeKind::Local, "Local"),
    ];
    if let Some(hint) = model.hardware_hint() {
        badges.push(Badge::new(BadgeKind::Hardware, hint));
    }
    badges
}

fn free_detail(model: &Model) -> String {
    let license = model
        .license
        .as_ref()
        .and_then(|l| l.name.as_deref())
        .unwrap_or("open license");
    match model.hardware_hint() {
        Some(hint) => format!("Free and open-source ({license}), can run locally ({hint})"),
        None => format!("Free and open-source ({license}), can run locally"),
    }
}

/// Build the badge list and tooltip for a model.
///
/// Only the first usage quote and the first subscription quote are shown.
/// Never fails: unusable records are skipped, failed conversions fall back
/// to the unconverted amount, and an empty result becomes a placeholder.
pub fn describe_cost(model: &Model, ctx: &PricingContext<'_>) -> CostSummary {
    let open_source = model.is_open_source();

    if open_source && model.pricing.is_empty() {
        return CostSummary {
            badges: free_badges(model),
            tooltip: free_detail(model),
            has_validation_issues: false,
        };
    }

    let mut usable = model.pricing.iter().filter(|r| r.is_usable());
    let usable_count = usable.clone().count();
    if usable_count < model.pricing.len() {
        tracing::debug!(
            model = %model.name,
            skipped = model.pricing.len() - usable_count,
            "skipping pricing records without any price"
        );
    }
    let api = usable.clone().find(|r| !is_subscription_pricing(r));
    let sub = usable.find(|r| is_subscription_pricing(r));

    let mut badges = Vec::new();
    let mut lines = Vec::new();
    if open_source {
        badges.extend(free_badges(model));
        lines.push(free_detail(model));
    }

    let quotes = [
        api.and_then(|r| api_quote(r, ctx)),
        sub.and_then(|r| subscription_quote(r, ctx)),
    ];
    for quote in quotes.into_iter().flatten() {
        let line = match &quote.converted_from {
            Some(code) => format!("{} (converted from {code})", quote.detail),
            None => quote.detail,
        };
        lines.push(line);
        badges.push(quote.badge);
    }

    if badges.is_empty() {
        badges.push(Badge::new(BadgeKind::Placeholder, PLACEHOLDER));
    }
    if lines.is_empty() {
        lines.push("No pricing information".to_string());
    }
    if usable_count > 1 {
        lines.push(format!("({usable_count} pricing options)"));
    }

    let has_validation_issues = ctx.show_validation
        && validate_model(model, ctx).is_some_and(|v| v.has_problems());
    if has_validation_issues {
        lines.push(VALIDATION_WARNING.to_string());
    }

    CostSummary {
        badges,
        tooltip: lines.join("\n"),
        has_validation_issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::RateTable;
    use crate::model::{License, LicenseKind};

    fn rates() -> RateTable {
        RateTable::new("USD", [("EUR", 0.5)]).unwrap()
    }

    fn model(pricing: Vec<PricingRecord>) -> Model {
        Model {
            pricing,
            ..Model::new("test")
        }
    }

    #[test]
    fn blended_uses_three_to_one_weighting() {
        assert!((blended_cost(3.0, 15.0) - 6.0).abs() < 1e-12);
        assert!((blended_cost(1.0, 1.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn metered_record_renders_blended_badge() {
        let t = rates();
        let ctx = PricingContext::base(&t);
        let m = model(vec![PricingRecord::metered(3.0, 15.0, Some("per 1M tokens"))]);
        let s = describe_cost(&m, &ctx);
        assert_eq!(s.labels(), vec!["API • ~$6.000/1K requests"]);
        assert!(!s.tooltip.contains("converted"));
    }

    #[test]
    fn output_only_record_uses_output_rate() {
        let t = rates();
        let ctx = PricingContext::base(&t);
        let r = PricingRecord {
            output: Some(15.0),
            unit: Some("per 1M tokens".into()),
            ..PricingRecord::default()
        };
        let s = describe_cost(&model(vec![r]), &ctx);
        assert_eq!(s.labels(), vec!["API • ~$15.000/1K requests"]);
        assert!(s.tooltip.lines().any(|l| l == "API: $15.000 per 1M"));
    }

    #[test]
    fn flat_api_fee_divides_by_thousand() {
        let t = rates();
        let ctx = PricingContext::base(&t);
        let s = describe_cost(&model(vec![PricingRecord::flat(2.0, Some("per request"))]), &ctx);
        assert_eq!(s.labels(), vec!["API • ~$0.002/1K requests"]);
    }

    #[test]
    fn subscription_periods() {
        let t = rates();
        let ctx = PricingContext::base(&t);
        let s = describe_cost(&model(vec![PricingRecord::flat(20.0, Some("per month"))]), &ctx);
        assert_eq!(s.labels(), vec!["Sub: $20.00/mo"]);
        let s = describe_cost(&model(vec![PricingRecord::flat(200.0, Some("annual plan"))]), &ctx);
        assert_eq!(s.labels(), vec!["Sub: $200.00/yr"]);
    }

    #[test]
    fn converted_quote_mentions_source_currency() {
        let t = rates();
        let ctx = PricingContext::new(&t, "USD");
        let r = PricingRecord::flat(10.0, Some("per month")).with_currency("EUR");
        let s = describe_cost(&model(vec![r]), &ctx);
        assert_eq!(s.labels(), vec!["Sub: $20.00/mo"]);
        assert!(s.tooltip.contains("(converted from EUR)"));
    }

    #[test]
    fn unknown_currency_falls_back_to_raw_amount() {
        let t = rates();
        let ctx = PricingContext::base(&t);
        let r = PricingRecord::flat(10.0, Some("per month")).with_currency("XYZ");
        let s = describe_cost(&model(vec![r]), &ctx);
        assert_eq!(s.labels(), vec!["Sub: $10.00/mo"]);
        assert!(!s.tooltip.contains("converted"));
    }

    #[test]
    fn summary_serializes_with_js_field_names() {
        let t = rates();
        let ctx = PricingContext::base(&t);
        let s = describe_cost(&model(vec![PricingRecord::flat(20.0, Some("per month"))]), &ctx);
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["shortDisplay"][0]["kind"], "subscription");
        assert_eq!(v["shortDisplay"][0]["label"], "Sub: $20.00/mo");
        assert_eq!(v["hasValidationIssues"], false);
        assert!(v.get("badges").is_none());
    }

    #[test]
    fn first_of_each_kind_wins() {
        let t = rates();
        let ctx = PricingContext::base(&t);
        let s = describe_cost(
            &model(vec![
                PricingRecord::flat(20.0, Some("per month")),
                PricingRecord::metered(1.0, 1.0, Some("per 1M tokens")),
                PricingRecord::flat(50.0, Some("per month")),
                PricingRecord::metered(9.0, 9.0, Some("per 1M tokens")),
            ]),
            &ctx,
        );
        assert_eq!(s.labels(), vec!["API • ~$1.000/1K requests", "Sub: $20.00/mo"]);
        assert!(s.tooltip.contains("(4 pricing options)"));
    }

    #[test]
    fn no_usable_pricing_gives_placeholder() {
        let t = rates();
        let ctx = PricingContext::base(&t);
        let s = describe_cost(&model(vec![]), &ctx);
        assert_eq!(s.labels(), vec![PLACEHOLDER]);
        let s = describe_cost(&model(vec![PricingRecord::default()]), &ctx);
        assert_eq!(s.labels(), vec![PLACEHOLDER]);
        assert_eq!(s.badges[0].kind, BadgeKind::Placeholder);
    }

    #[test]
    fn open_source_with_pricing_keeps_both() {
        let t = rates();
        let ctx = PricingContext::base(&t);
        let mut m = model(vec![PricingRecord::metered(0.2, 0.2, Some("per 1M tokens"))]);
        m.license = Some(License {
            kind: LicenseKind::Osi,
            name: Some("Apache-2.0".into()),
        });
        let s = describe_cost(&m, &ctx);
        assert_eq!(s.labels(), vec!["Free", "Local", "API • ~$0.200/1K requests"]);
    }

    #[test]
    fn validation_warning_respects_toggle() {
        let t = rates();
        let m = model(vec![PricingRecord::flat(-5.0, None)]);
        let s = describe_cost(&m, &PricingContext::base(&t));
        assert!(s.has_validation_issues);
        assert!(s.tooltip.ends_with(VALIDATION_WARNING));
        let s = describe_cost(&m, &PricingContext::base(&t).with_validation(false));
        assert!(!s.has_validation_issues);
        assert!(!s.tooltip.contains(VALIDATION_WARNING));
    }
}
