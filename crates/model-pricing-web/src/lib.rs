use std::sync::OnceLock;

use wasm_bindgen::prelude::*;

use model_pricing_core::classify;
use model_pricing_core::cost;
use model_pricing_core::currency::{self, RateTable};
use model_pricing_core::format;
use model_pricing_core::model::{Model, PricingRecord};
use model_pricing_core::reference::{self, ReferenceTable};
use model_pricing_core::units;
use model_pricing_core::validate;
use model_pricing_core::PricingContext;

// ---------------------------------------------------------------------------
// Bundled tables
// ---------------------------------------------------------------------------

fn rates() -> Option<&'static RateTable> {
    static RATES: OnceLock<Option<RateTable>> = OnceLock::new();
    RATES.get_or_init(|| currency::load_bundled_rates().ok()).as_ref()
}

fn reference_table() -> Option<&'static ReferenceTable> {
    static REFERENCE: OnceLock<Option<ReferenceTable>> = OnceLock::new();
    REFERENCE
        .get_or_init(|| reference::load_bundled_reference().ok())
        .as_ref()
}

fn to_js<T: serde::Serialize>(value: &T) -> JsValue {
    serde_wasm_bindgen::to_value(value).unwrap_or(JsValue::NULL)
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

/// Badges and tooltip for a model object, in `target` currency.
/// Returns { shortDisplay: [{kind, label}], tooltip, hasValidationIssues } or null.
#[wasm_bindgen]
pub fn describe_cost(model: JsValue, target: &str, show_validation: bool) -> JsValue {
    let model: Model = match serde_wasm_bindgen::from_value(model) {
        Ok(m) => m,
        Err(_) => return JsValue::NULL,
    };
    let Some(rates) = rates() else {
        return JsValue::NULL;
    };
    let mut ctx = PricingContext::new(rates, target).with_validation(show_validation);
    if let Some(r) = reference_table() {
        ctx = ctx.with_reference(r);
    }
    to_js(&cost::describe_cost(&model, &ctx))
}

/// Format an amount with the currency's symbol, e.g. "€0.30".
#[wasm_bindgen]
pub fn format_amount(amount: f64, code: &str) -> String {
    format::format_amount(amount, code)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Heuristic verdict { isValid, confidence, issues } for a pricing record.
#[wasm_bindgen]
pub fn validate_pricing(record: JsValue, model_name: &str, domain: Option<String>) -> JsValue {
    let record: PricingRecord = match serde_wasm_bindgen::from_value(record) {
        Ok(r) => r,
        Err(_) => return JsValue::NULL,
    };
    to_js(&validate::validate(&record, model_name, domain.as_deref()))
}

/// Reference-price verdict for a pricing record.
#[wasm_bindgen]
pub fn fact_check(record: JsValue, model_name: &str, domain: Option<String>) -> JsValue {
    let record: PricingRecord = match serde_wasm_bindgen::from_value(record) {
        Ok(r) => r,
        Err(_) => return JsValue::NULL,
    };
    let Some(rates) = rates() else {
        return JsValue::NULL;
    };
    let reference = reference_table().map(|r| r as &dyn reference::ReferenceCosts);
    to_js(&validate::fact_check(&record, model_name, domain.as_deref(), reference, rates))
}

// ---------------------------------------------------------------------------
// Units and currencies
// ---------------------------------------------------------------------------

/// Convert between currencies with the bundled rates; null for unknown codes.
#[wasm_bindgen]
pub fn convert_currency(amount: f64, from: &str, to: &str) -> JsValue {
    match rates().map(|r| r.convert(amount, from, to)) {
        Some(Ok(v)) => JsValue::from_f64(v),
        _ => JsValue::NULL,
    }
}

/// Price per one million items for a vendor amount and unit string.
#[wasm_bindgen]
pub fn to_per_million(amount: f64, unit: Option<String>) -> f64 {
    units::to_per_million(amount, unit.as_deref())
}

#[wasm_bindgen]
pub fn is_subscription_pricing(record: JsValue) -> bool {
    serde_wasm_bindgen::from_value::<PricingRecord>(record)
        .map(|r| classify::is_subscription_pricing(&r))
        .unwrap_or(false)
}

/// Currency codes the bundled rate table knows.
#[wasm_bindgen]
pub fn supported_currencies() -> JsValue {
    let codes: Vec<&str> = rates().map(|r| r.codes().collect()).unwrap_or_default();
    to_js(&codes)
}
