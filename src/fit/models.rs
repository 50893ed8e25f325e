//! The study's regressions of weekly positivity on search covariates.
//!
//! Each `ModelSpec` picks its rows (merged table, or the lagged view for the
//! lag models) and its regressors. Rows with a missing `avg_positive` or a
//! missing regressor are left out of that model; they are never read as zero.

use tracing::{debug, info};

use crate::domain::{MergedRecord, ModelSpec, RegressionFit};
use crate::features::lagged_view;
use crate::math::fit_ols;

/// Outcome of fitting a set of models on one merged table.
#[derive(Debug, Clone)]
pub struct ModelReport {
    pub fits: Vec<(ModelSpec, RegressionFit)>,
    /// Models that could not be fitted, with a human-readable reason.
    pub skipped: Vec<(ModelSpec, String)>,
}

impl ModelReport {
    pub fn is_empty(&self) -> bool {
        self.fits.is_empty()
    }
}

/// Fit every requested model on `merged`.
///
/// An empty `merged` is valid input: every model is reported as skipped.
pub fn fit_models(merged: &[MergedRecord], specs: &[ModelSpec]) -> ModelReport {
    let mut fits = Vec::new();
    let mut skipped = Vec::new();

    for &spec in specs {
        let (columns, y) = design(merged, spec);
        match fit_ols(spec.regressors(), &columns, &y) {
            Some(fit) => {
                info!(model = spec.formula(), n = fit.n, r_squared = fit.r_squared, "Fitted model");
                fits.push((spec, fit));
            }
            None => {
                let reason = if y.len() <= spec.regressors().len() + 1 {
                    format!("only {} complete rows", y.len())
                } else {
                    "design matrix is singular".to_string()
                };
                debug!(model = spec.formula(), %reason, "Skipped model");
                skipped.push((spec, reason));
            }
        }
    }

    ModelReport { fits, skipped }
}

/// Regressor columns and response for one model, complete cases only.
fn design(merged: &[MergedRecord], spec: ModelSpec) -> (Vec<Vec<f64>>, Vec<f64>) {
    let width = spec.regressors().len();
    let mut columns = vec![Vec::new(); width];
    let mut y = Vec::new();

    let mut push = |response: Option<f64>, values: &[Option<f64>]| {
        let Some(v) = response else { return };
        let Some(row) = values.iter().copied().collect::<Option<Vec<f64>>>() else {
            return;
        };
        y.push(v);
        for (col, x) in columns.iter_mut().zip(row) {
            col.push(x);
        }
    };

    if spec.uses_lag() {
        for r in lagged_view(merged) {
            match spec {
                ModelSpec::HitVacLag => push(r.avg_positive, &[r.hit_vac_lag]),
                _ => push(r.avg_positive, &[r.hits_lag.map(f64::from), Some(r.vac_lag)]),
            }
        }
    } else {
        for r in merged {
            match spec {
                ModelSpec::Hits => push(r.avg_positive, &[r.hits.map(f64::from)]),
                _ => push(r.avg_positive, &[r.hit_vac]),
            }
        }
    }

    (columns, y)
}
