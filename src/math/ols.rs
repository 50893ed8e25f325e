//! Ordinary least squares with an intercept.
//!
//! The regressions here are tiny (tens of weekly rows, one or two regressors),
//! so we build the design matrix explicitly and solve with SVD. Nalgebra's
//! `QR::solve` is meant for square systems and panics on tall matrices.

use nalgebra::{DMatrix, DVector};

use crate::domain::{Coefficient, RegressionFit};

/// Name given to the intercept coefficient.
pub const INTERCEPT: &str = "const";

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Fit `y ~ const + columns` and compute classical standard errors.
///
/// `names[j]` labels `columns[j]`; every column must have `y.len()` entries.
/// Returns `None` when there are no residual degrees of freedom, when the shapes
/// disagree, or when `XᵀX` is singular.
pub fn fit_ols(names: &[&str], columns: &[Vec<f64>], y: &[f64]) -> Option<RegressionFit> {
    let n = y.len();
    let p = columns.len() + 1;
    if names.len() != columns.len() || columns.iter().any(|c| c.len() != n) || n <= p {
        return None;
    }

    let x = DMatrix::from_fn(n, p, |i, j| if j == 0 { 1.0 } else { columns[j - 1][i] });
    let yv = DVector::from_column_slice(y);

    let beta = solve_least_squares(&x, &yv)?;
    let xtx_inv = (x.transpose() * &x).try_inverse()?;

    let residuals = &yv - &x * &beta;
    let sse = residuals.norm_squared();
    let dof = (n - p) as f64;
    let sigma2 = sse / dof;

    let mean = yv.mean();
    let sst: f64 = yv.iter().map(|v| (v - mean).powi(2)).sum();
    let r_squared = if sst > 0.0 { 1.0 - sse / sst } else { f64::NAN };
    let adj_r_squared = 1.0 - (1.0 - r_squared) * (n as f64 - 1.0) / dof;

    let coefficients = (0..p)
        .map(|j| {
            let std_error = (sigma2 * xtx_inv[(j, j)]).max(0.0).sqrt();
            let estimate = beta[j];
            Coefficient {
                name: if j == 0 { INTERCEPT.to_string() } else { names[j - 1].to_string() },
                estimate,
                std_error,
                t_value: estimate / std_error,
            }
        })
        .collect();

    Some(RegressionFit {
        n,
        coefficients,
        sse,
        r_squared,
        adj_r_squared,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn fit_ols_matches_hand_computed_line() {
        // x = [1,2,3,4], y = [1,3,2,4]: slope 0.8, intercept 0.5, SSE 1.8.
        let x = vec![1.0, 2.0, 3.0, 4.0];
        let y = vec![1.0, 3.0, 2.0, 4.0];
        let fit = fit_ols(&["x"], &[x], &y).unwrap();

        assert_eq!(fit.n, 4);
        assert_eq!(fit.coefficients[0].name, INTERCEPT);
        assert_eq!(fit.coefficients[1].name, "x");
        assert!((fit.coefficients[0].estimate - 0.5).abs() < 1e-10);
        assert!((fit.coefficients[1].estimate - 0.8).abs() < 1e-10);
        assert!((fit.sse - 1.8).abs() < 1e-10);
        // SST = 5, R² = 1 - 1.8/5.
        assert!((fit.r_squared - 0.64).abs() < 1e-10);
        assert!((fit.adj_r_squared - 0.46).abs() < 1e-10);
        // se(slope) = sqrt((1.8/2) / 5)
        assert!((fit.coefficients[1].std_error - (0.18f64).sqrt()).abs() < 1e-10);
    }

    #[test]
    fn fit_ols_needs_residual_degrees_of_freedom() {
        assert!(fit_ols(&["x"], &[vec![1.0, 2.0]], &[1.0, 2.0]).is_none());
        assert!(fit_ols(&["x"], &[vec![1.0, 2.0, 3.0]], &[1.0, 2.0]).is_none());
    }

    #[test]
    fn fit_ols_rejects_collinear_design() {
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let twice: Vec<f64> = x.iter().map(|v| v * 2.0).collect();
        let y = vec![1.0, 2.0, 2.5, 4.0, 5.5];
        assert!(fit_ols(&["x", "x2"], &[x, twice], &y).is_none());
    }
}
