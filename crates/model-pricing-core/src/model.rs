use serde::{Deserialize, Serialize};

use crate::error::{PricingError, Result};

/// One quoted price for a model, exactly as the vendor reported it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PricingRecord {
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub flat: Option<f64>,
    #[serde(default)]
    pub input: Option<f64>,
    #[serde(default)]
    pub output: Option<f64>,
}

impl PricingRecord {
    /// Flat fee quoted in `unit`, in USD.
    pub fn flat(amount: f64, unit: Option<&str>) -> Self {
        Self {
            flat: Some(amount),
            unit: unit.map(str::to_string),
            ..Self::default()
        }
    }

    /// Metered input/output rates quoted in `unit`, in USD.
    pub fn metered(input: f64, output: f64, unit: Option<&str>) -> Self {
        Self {
            input: Some(input),
            output: Some(output),
            unit: unit.map(str::to_string),
            ..Self::default()
        }
    }

    pub fn with_currency(mut self, code: &str) -> Self {
        self.currency = Some(code.to_string());
        self
    }

    /// A record with no flat, input or output price is inert.
    pub fn is_usable(&self) -> bool {
        self.flat.is_some() || self.input.is_some() || self.output.is_some()
    }

    pub fn check_usable(&self) -> Result<()> {
        if self.is_usable() {
            Ok(())
        } else {
            Err(PricingError::MalformedPricing)
        }
    }

    /// Lower-cased unit, empty when absent.
    pub fn unit_lower(&self) -> String {
        self.unit.as_deref().unwrap_or("").to_lowercase()
    }

    /// Present price fields as `(name, value)` pairs.
    pub fn amounts(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        [("flat", self.flat), ("input", self.input), ("output", self.output)]
            .into_iter()
            .filter_map(|(name, v)| v.map(|v| (name, v)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LicenseKind {
    #[serde(rename = "OSI", alias = "osi")]
    Osi,
    #[serde(alias = "copyleft")]
    Copyleft,
    #[serde(alias = "proprietary")]
    Proprietary,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct License {
    #[serde(rename = "type")]
    pub kind: LicenseKind,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    /// Category tag, e.g. "text-generation". Only used as a validation hint.
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub license: Option<License>,
    /// Provider-reported order; the first record is the primary quote.
    #[serde(default)]
    pub pricing: Vec<PricingRecord>,
}

impl Model {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Free to run locally: OSI or copyleft license with a real name.
    pub fn is_open_source(&self) -> bool {
        let Some(license) = &self.license else {
            return false;
        };
        let kind_ok = matches!(license.kind, LicenseKind::Osi | LicenseKind::Copyleft);
        let name_ok = license
            .name
            .as_deref()
            .map(str::trim)
            .is_some_and(|n| !n.is_empty() && n != "Proprietary");
        kind_ok && name_ok
    }

    /// First tag that looks like a hardware requirement ("8GB VRAM", "1x GPU").
    pub fn hardware_hint(&self) -> Option<&str> {
        self.tags.iter().map(String::as_str).find(|t| {
            let lower = t.to_lowercase();
            lower.contains("vram") || lower.contains("gb") || lower.contains("gpu")
        })
    }

    /// The first record with at least one price set.
    pub fn primary_pricing(&self) -> Option<&PricingRecord> {
        self.pricing.iter().find(|r| r.is_usable())
    }
}

/// Parse a catalog: a JSON array of models.
pub fn parse_catalog(json: &str) -> Result<Vec<Model>> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn licensed(kind: LicenseKind, name: Option<&str>) -> Model {
        Model {
            license: Some(License {
                kind,
                name: name.map(str::to_string),
            }),
            ..Model::new("m")
        }
    }

    #[test]
    fn open_source_requires_kind_and_name() {
        assert!(licensed(LicenseKind::Osi, Some("Apache-2.0")).is_open_source());
        assert!(licensed(LicenseKind::Copyleft, Some("GPL-3.0")).is_open_source());
        assert!(!licensed(LicenseKind::Osi, None).is_open_source());
        assert!(!licensed(LicenseKind::Osi, Some("  ")).is_open_source());
        assert!(!licensed(LicenseKind::Osi, Some("Proprietary")).is_open_source());
        assert!(!licensed(LicenseKind::Proprietary, Some("MIT")).is_open_source());
        assert!(!Model::new("m").is_open_source());
    }

    #[test]
    fn hardware_hint_is_case_insensitive() {
        let mut m = Model::new("m");
        m.tags = vec!["chat".into(), "24gb vram".into(), "1x GPU".into()];
        assert_eq!(m.hardware_hint(), Some("24gb vram"));
        m.tags = vec!["chat".into()];
        assert_eq!(m.hardware_hint(), None);
    }

    #[test]
    fn inert_record_is_not_usable() {
        let r = PricingRecord {
            unit: Some("per month".into()),
            ..PricingRecord::default()
        };
        assert!(!r.is_usable());
        assert!(matches!(r.check_usable(), Err(PricingError::MalformedPricing)));
        assert!(PricingRecord::flat(0.0, None).is_usable());
    }

    #[test]
    fn primary_pricing_skips_inert_records() {
        let mut m = Model::new("m");
        m.pricing = vec![PricingRecord::default(), PricingRecord::flat(20.0, Some("per month"))];
        assert_eq!(m.primary_pricing().and_then(|r| r.flat), Some(20.0));
    }

    #[test]
    fn unknown_license_kind_parses_as_other() {
        let lic: License =
            serde_json::from_str(r#"{"type": "Research-only", "name": "X"}"#).unwrap();
        assert_eq!(lic.kind, LicenseKind::Other);
    }
}
