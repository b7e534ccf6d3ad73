//! Ordinary least squares.
//!
//! The Granger evaluator fits many small regressions of the form:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! and only needs the residual sum of squares of each fit.
//!
//! Implementation choices:
//! - SVD solve, so tall design matrices (many more rows than columns) work.
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.)
//! - Lagged regressors of smooth series can be nearly collinear, so the solve
//!   retries with progressively looser singular-value tolerances.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    if x.nrows() != y.len() || x.nrows() == 0 {
        return None;
    }
    let svd = x.clone().svd(true, true);

    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Residual sum of squares of the least squares fit of `y` on `x`.
pub fn residual_sum_of_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<f64> {
    let beta = solve_least_squares(x, y)?;
    let residuals = y - x * beta;
    let rss = residuals.norm_squared();
    rss.is_finite().then_some(rss)
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
        assert!(residual_sum_of_squares(&x, &y).unwrap() < 1e-18);
    }

    #[test]
    fn rss_of_intercept_only_is_total_sum_of_squares() {
        let x = DMatrix::from_element(4, 1, 1.0);
        let y = DVector::from_row_slice(&[1.0, 2.0, 3.0, 4.0]);
        // mean 2.5 → deviations ±0.5, ±1.5 → 0.25*2 + 2.25*2 = 5
        let rss = residual_sum_of_squares(&x, &y).unwrap();
        assert!((rss - 5.0).abs() < 1e-10, "rss={rss}");
    }

    #[test]
    fn mismatched_dimensions_yield_none() {
        let x = DMatrix::from_element(3, 1, 1.0);
        let y = DVector::from_row_slice(&[1.0, 2.0]);
        assert!(solve_least_squares(&x, &y).is_none());
    }
}
