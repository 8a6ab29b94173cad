use crate::currency::{RateTable, BASE_CURRENCY};
use crate::reference::ReferenceCosts;

/// Caller-supplied settings and lookup tables for one display pass.
///
/// The engine keeps no state of its own; everything it needs besides the
/// model arrives through this.
#[derive(Clone, Copy)]
pub struct PricingContext<'a> {
    pub rates: &'a RateTable,
    pub reference: Option<&'a dyn ReferenceCosts>,
    pub target_currency: &'a str,
    /// Attach validation warnings to summaries.
    pub show_validation: bool,
}

impl<'a> PricingContext<'a> {
    pub fn new(rates: &'a RateTable, target_currency: &'a str) -> Self {
        Self {
            rates,
            reference: None,
            target_currency,
            show_validation: true,
        }
    }

    /// Context targeting the base currency.
    pub fn base(rates: &'a RateTable) -> Self {
        Self::new(rates, BASE_CURRENCY)
    }

    pub fn with_reference(mut self, reference: &'a dyn ReferenceCosts) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn with_validation(mut self, show: bool) -> Self {
        self.show_validation = show;
        self
    }
}

impl std::fmt::Debug for PricingContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PricingContext")
            .field("rates", &self.rates.base())
            .field("reference", &self.reference.is_some())
            .field("target_currency", &self.target_currency)
            .field("show_validation", &self.show_validation)
            .finish()
    }
}
