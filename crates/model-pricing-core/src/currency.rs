use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{PricingError, Result};
use crate::model::PricingRecord;

/// Currency every rate in a [`RateTable`] is relative to.
pub const BASE_CURRENCY: &str = "USD";

/// Static exchange rates, as units of each currency per one base unit.
#[derive(Debug, Clone)]
pub struct RateTable {
    base: String,
    rates: BTreeMap<String, f64>,
}

#[derive(Debug, Deserialize)]
struct RatesFile {
    #[serde(default = "default_base")]
    base: String,
    rates: BTreeMap<String, f64>,
}

fn default_base() -> String {
    BASE_CURRENCY.to_string()
}

fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

impl RateTable {
    /// Build a table from `(code, rate)` pairs. Rates must be positive and finite.
    pub fn new<I, S>(base: &str, rates: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let base = normalize_code(base);
        let mut map = BTreeMap::new();
        for (code, rate) in rates {
            let code = normalize_code(code.as_ref());
            if !rate.is_finite() || rate <= 0.0 {
                return Err(PricingError::InvalidRate { code, rate });
            }
            map.insert(code, rate);
        }
        map.entry(base.clone()).or_insert(1.0);
        Ok(Self { base, rates: map })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Units of `code` per one base unit.
    pub fn rate(&self, code: &str) -> Result<f64> {
        let code = normalize_code(code);
        self.rates
            .get(&code)
            .copied()
            .ok_or(PricingError::UnknownCurrency(code))
    }

    pub fn contains(&self, code: &str) -> bool {
        self.rates.contains_key(&normalize_code(code))
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.rates.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.rates.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Convert `amount` from one currency to another through the base.
    /// Identical codes short-circuit without a table lookup.
    pub fn convert(&self, amount: f64, from: &str, to: &str) -> Result<f64> {
        if same_currency(from, to) {
            return Ok(amount);
        }
        let from_rate = self.rate(from)?;
        let to_rate = self.rate(to)?;
        Ok(amount / from_rate * to_rate)
    }

    /// Convert, or hand back `amount` unchanged when either code is unknown.
    pub fn convert_or_passthrough(&self, amount: f64, from: &str, to: &str) -> f64 {
        match self.convert(amount, from, to) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(
                    amount,
                    from,
                    to,
                    error = %e,
                    "currency conversion failed, showing unconverted amount"
                );
                amount
            }
        }
    }
}

pub fn same_currency(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Currency a record is quoted in, defaulting to the base currency.
pub fn detect_currency(record: &PricingRecord) -> String {
    match record.currency.as_deref().map(str::trim) {
        Some(code) if !code.is_empty() => code.to_uppercase(),
        _ => BASE_CURRENCY.to_string(),
    }
}

/// Symbol for the common currencies, `None` for the rest.
pub fn currency_symbol(code: &str) -> Option<&'static str> {
    let sym = match normalize_code(code).as_str() {
        "USD" => "$",
        "EUR" => "€",
        "GBP" => "£",
        "JPY" => "¥",
        "CNY" => "¥",
        "KRW" => "₩",
        "INR" => "₹",
        "BRL" => "R$",
        "CHF" => "CHF ",
        "CAD" => "CA$",
        "AUD" => "A$",
        "SEK" => "kr ",
        "NOK" => "kr ",
        "DKK" => "kr ",
        "PLN" => "zł",
        "CZK" => "Kč ",
        "TRY" => "₺",
        "THB" => "฿",
        "MXN" => "MX$",
        "ZAR" => "R ",
        "SGD" => "S$",
        "HKD" => "HK$",
        _ => return None,
    };
    Some(sym)
}

/// Load a rate table from a rates.toml file.
pub fn load_rates(path: &Path) -> Result<RateTable> {
    let content = std::fs::read_to_string(path).map_err(|e| PricingError::Io(e.to_string()))?;
    parse_rates(&content)
}

/// Parse a rate table from TOML string.
pub fn parse_rates(toml_str: &str) -> Result<RateTable> {
    let file: RatesFile =
        toml::from_str(toml_str).map_err(|e| PricingError::Parse(format!("bad rates.toml: {e}")))?;
    RateTable::new(&file.base, file.rates)
}

/// Load the bundled rates.toml from the data/ directory.
pub fn load_bundled_rates() -> Result<RateTable> {
    let toml_str = include_str!("../../../data/rates.toml");
    parse_rates(toml_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RateTable {
        RateTable::new("USD", [("EUR", 0.5), ("GBP", 0.25), ("JPY", 150.0)]).unwrap()
    }

    #[test]
    fn identity_skips_lookup() {
        let t = table();
        assert_eq!(t.convert(12.34, "XYZ", "XYZ").unwrap(), 12.34);
        assert_eq!(t.convert(12.34, "eur", "EUR").unwrap(), 12.34);
    }

    #[test]
    fn cross_rate_through_base() {
        let t = table();
        assert!((t.convert(10.0, "USD", "EUR").unwrap() - 5.0).abs() < 1e-12);
        assert!((t.convert(10.0, "EUR", "USD").unwrap() - 20.0).abs() < 1e-12);
        assert!((t.convert(10.0, "EUR", "GBP").unwrap() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn unknown_code_is_an_error() {
        let t = table();
        assert!(matches!(
            t.convert(1.0, "USD", "XYZ"),
            Err(PricingError::UnknownCurrency(code)) if code == "XYZ"
        ));
    }

    #[test]
    fn passthrough_keeps_amount_on_unknown_code() {
        assert_eq!(table().convert_or_passthrough(7.0, "ABC", "USD"), 7.0);
    }

    #[test]
    fn rejects_non_positive_rates() {
        assert!(matches!(
            RateTable::new("USD", [("EUR", 0.0)]),
            Err(PricingError::InvalidRate { .. })
        ));
        assert!(RateTable::new("USD", [("EUR", f64::NAN)]).is_err());
    }

    #[test]
    fn detect_defaults_to_base() {
        let mut r = PricingRecord::flat(1.0, None);
        assert_eq!(detect_currency(&r), "USD");
        r.currency = Some("  ".into());
        assert_eq!(detect_currency(&r), "USD");
        r.currency = Some("eur".into());
        assert_eq!(detect_currency(&r), "EUR");
    }

    #[test]
    fn parse_bundled_rates() {
        let t = load_bundled_rates().expect("should parse bundled rates.toml");
        assert_eq!(t.base(), "USD");
        assert_eq!(t.rate("USD").unwrap(), 1.0);
        for code in ["EUR", "GBP", "JPY", "CNY", "INR"] {
            assert!(t.contains(code), "{code} missing from bundled rates");
        }
    }

    #[test]
    fn bundled_codes_have_symbols() {
        let t = load_bundled_rates().unwrap();
        for code in t.codes() {
            assert!(currency_symbol(code).is_some(), "{code}: no symbol");
        }
    }

    #[test]
    fn parse_minimal_toml() {
        let t = parse_rates("[rates]\nEUR = 0.9\n").unwrap();
        assert_eq!(t.base(), "USD");
        assert_eq!(t.rate("USD").unwrap(), 1.0);
        assert!(parse_rates("rates = 3").is_err());
    }
}
