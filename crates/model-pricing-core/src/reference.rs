//! Known reference prices backing the fact check.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PricingError, Result};

/// Inclusive per-million price band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBand {
    pub min: f64,
    pub max: f64,
}

impl PriceBand {
    pub fn contains(&self, v: f64) -> bool {
        v >= self.min && v <= self.max
    }

    /// How many times outside the band `v` lies; 1.0 when inside.
    pub fn deviation(&self, v: f64) -> f64 {
        if self.contains(v) {
            1.0
        } else if v < self.min {
            if v <= 0.0 {
                f64::INFINITY
            } else {
                self.min / v
            }
        } else if self.max <= 0.0 {
            f64::INFINITY
        } else {
            v / self.max
        }
    }
}

/// Expected prices for one model or domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferencePrice {
    /// Case-insensitive substring of the model name (or domain) this entry covers.
    #[serde(rename = "match")]
    pub pattern: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub input: Option<PriceBand>,
    #[serde(default)]
    pub output: Option<PriceBand>,
}

fn default_currency() -> String {
    crate::currency::BASE_CURRENCY.to_string()
}

/// Where a reference price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceScope {
    /// Matched the model name.
    Model,
    /// Matched only the model's domain; a much broader band.
    Domain,
}

/// Source of expected prices for the fact check.
pub trait ReferenceCosts: Send + Sync {
    fn expected(
        &self,
        model_name: &str,
        domain: Option<&str>,
    ) -> Option<(ReferenceScope, &ReferencePrice)>;
}

/// Reference prices from reference_prices.toml.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    models: Vec<ReferencePrice>,
    domains: Vec<ReferencePrice>,
}

#[derive(Debug, Deserialize)]
struct ReferenceFile {
    #[serde(default)]
    model: BTreeMap<String, ReferencePrice>,
    #[serde(default)]
    domain: BTreeMap<String, ReferencePrice>,
}

/// Longest pattern contained in `haystack` wins.
fn best_match<'a>(entries: &'a [ReferencePrice], haystack: &str) -> Option<&'a ReferencePrice> {
    let haystack = haystack.to_lowercase();
    entries
        .iter()
        .filter(|e| haystack.contains(&e.pattern))
        .max_by_key(|e| e.pattern.len())
}

impl ReferenceTable {
    pub fn new(models: Vec<ReferencePrice>, domains: Vec<ReferencePrice>) -> Self {
        let lower = |mut e: ReferencePrice| {
            e.pattern = e.pattern.to_lowercase();
            e
        };
        Self {
            models: models.into_iter().map(lower).collect(),
            domains: domains.into_iter().map(lower).collect(),
        }
    }

    pub fn models(&self) -> &[ReferencePrice] {
        &self.models
    }

    pub fn domains(&self) -> &[ReferencePrice] {
        &self.domains
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty() && self.domains.is_empty()
    }
}

impl ReferenceCosts for ReferenceTable {
    fn expected(
        &self,
        model_name: &str,
        domain: Option<&str>,
    ) -> Option<(ReferenceScope, &ReferencePrice)> {
        if let Some(p) = best_match(&self.models, model_name) {
            return Some((ReferenceScope::Model, p));
        }
        let domain = domain?;
        best_match(&self.domains, domain).map(|p| (ReferenceScope::Domain, p))
    }
}

/// Load reference prices from a reference_prices.toml file.
pub fn load_reference(path: &Path) -> Result<ReferenceTable> {
    let content = std::fs::read_to_string(path).map_err(|e| PricingError::Io(e.to_string()))?;
    parse_reference(&content)
}

/// Parse reference prices from TOML string.
pub fn parse_reference(toml_str: &str) -> Result<ReferenceTable> {
    let file: ReferenceFile = toml::from_str(toml_str)
        .map_err(|e| PricingError::Parse(format!("bad reference_prices.toml: {e}")))?;
    Ok(ReferenceTable::new(
        file.model.into_values().collect(),
        file.domain.into_values().collect(),
    ))
}

/// Load the bundled reference_prices.toml from the data/ directory.
pub fn load_bundled_reference() -> Result<ReferenceTable> {
    let toml_str = include_str!("../../../data/reference_prices.toml");
    parse_reference(toml_str)
}
