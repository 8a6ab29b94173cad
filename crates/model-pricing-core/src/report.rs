use serde::Serialize;

use crate::context::PricingContext;
use crate::cost::{describe_cost, CostSummary};
use crate::model::Model;
use crate::validate::{validate_model, ModelVerdicts};

/// Display payload and raw verdicts for one model.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelReport {
    pub name: String,
    pub summary: CostSummary,
    pub verdicts: Option<ModelVerdicts>,
}

impl ModelReport {
    pub fn has_problems(&self) -> bool {
        self.verdicts.as_ref().is_some_and(ModelVerdicts::has_problems)
    }
}

pub fn report(model: &Model, ctx: &PricingContext<'_>) -> ModelReport {
    ModelReport {
        name: model.name.clone(),
        summary: describe_cost(model, ctx),
        verdicts: validate_model(model, ctx),
    }
}

/// Report on a whole catalog, e.g. after an import. Output order matches input.
#[cfg(feature = "parallel")]
pub fn validate_catalog(models: &[Model], ctx: &PricingContext<'_>) -> Vec<ModelReport> {
    use rayon::prelude::*;

    models.par_iter().map(|m| report(m, ctx)).collect()
}

#[cfg(not(feature = "parallel"))]
pub fn validate_catalog(models: &[Model], ctx: &PricingContext<'_>) -> Vec<ModelReport> {
    models.iter().map(|m| report(m, ctx)).collect()
}
