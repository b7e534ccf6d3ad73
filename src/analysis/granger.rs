//! Granger causality (SSR F-test) at several lag orders.
//!
//! For a lag order `k` and aligned, stationary series `y` (target) and `x`
//! (candidate) of length `n`, rows `t = k..n` are regressed twice:
//!
//! ```text
//! restricted:    y_t = c + Σ_{i=1..k} a_i y_{t-i}
//! unrestricted:  y_t = c + Σ_{i=1..k} a_i y_{t-i} + Σ_{i=1..k} b_i x_{t-i}
//! ```
//!
//! and compared with `F = ((RSS_r - RSS_u) / k) / (RSS_u / (n - k - 2k - 1))`,
//! whose p-value comes from the `F(k, n - 3k - 1)` survival function.

use log::debug;
use nalgebra::{DMatrix, DVector};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, FisherSnedecor};

use crate::analysis::align::AlignedPair;
use crate::error::AnalysisError;
use crate::math::{has_spread, residual_sum_of_squares};

/// RSS below this fraction of the target's sum of squares is a perfect fit.
const PERFECT_FIT_REL: f64 = 1e-12;

/// F-test result for one lag order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GrangerLagResult {
    pub lag: usize,
    pub f_stat: f64,
    pub p_value: f64,
    pub df_num: usize,
    pub df_denom: usize,
}

/// All tested lag orders for one direction (candidate → target).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrangerOutcome {
    pub n_obs: usize,
    /// Ascending by lag; lags whose regressions were degenerate are absent.
    pub results: Vec<GrangerLagResult>,
}

impl GrangerOutcome {
    /// Minimum p-value across lags; ties go to the smallest lag.
    pub fn best(&self) -> Option<&GrangerLagResult> {
        let mut best: Option<&GrangerLagResult> = None;
        for r in &self.results {
            match best {
                Some(b) if r.p_value >= b.p_value => {}
                _ => best = Some(r),
            }
        }
        best
    }
}

/// Both directions of an aligned pair, tested on the same data and lag set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BidirectionalGranger {
    pub first_name: String,
    pub second_name: String,
    /// H: first Granger-causes second (target = second).
    pub first_to_second: GrangerOutcome,
    /// H: second Granger-causes first (target = first).
    pub second_to_first: GrangerOutcome,
}

/// Observations required to test lag orders up to `max_lag`.
pub fn required_observations(max_lag: usize) -> usize {
    3 * max_lag + 2
}

/// Test "candidate Granger-causes target" at each lag order.
pub fn granger_test(target: &[f64], candidate: &[f64], lag_orders: &[usize]) -> Result<GrangerOutcome, AnalysisError> {
    let n = target.len();
    if candidate.len() != n {
        return Err(AnalysisError::InvalidSeries(format!(
            "target has {n} observations, candidate has {}",
            candidate.len()
        )));
    }

    let mut lags: Vec<usize> = lag_orders.iter().copied().filter(|&k| k > 0).collect();
    lags.sort_unstable();
    lags.dedup();
    let Some(&max_lag) = lags.last() else {
        return Err(AnalysisError::InvalidSeries("no positive lag orders".to_string()));
    };

    let needed = required_observations(max_lag);
    if n < needed {
        return Err(AnalysisError::InsufficientData { needed, got: n });
    }
    // A constant candidate makes the unrestricted design rank-deficient.
    if !has_spread(candidate) {
        return Err(AnalysisError::DegenerateSeries("candidate series is constant".to_string()));
    }

    let mut results = Vec::with_capacity(lags.len());
    for k in lags {
        match f_test_at_lag(target, candidate, k) {
            Some(r) => results.push(r),
            None => debug!("granger: lag {k} regression is degenerate; skipped"),
        }
    }

    if results.is_empty() {
        return Err(AnalysisError::DegenerateSeries(
            "no lag order produced a well-posed regression".to_string(),
        ));
    }

    Ok(GrangerOutcome { n_obs: n, results })
}

/// Run both directions on an aligned pair.
pub fn granger_bidirectional(pair: &AlignedPair, lag_orders: &[usize]) -> Result<BidirectionalGranger, AnalysisError> {
    let first_to_second = granger_test(&pair.second, &pair.first, lag_orders)?;
    let second_to_first = granger_test(&pair.first, &pair.second, lag_orders)?;
    Ok(BidirectionalGranger {
        first_name: pair.first_name.clone(),
        second_name: pair.second_name.clone(),
        first_to_second,
        second_to_first,
    })
}

fn f_test_at_lag(y: &[f64], x: &[f64], k: usize) -> Option<GrangerLagResult> {
    let n = y.len();
    let rows = n.checked_sub(k)?;
    let df_denom = rows.checked_sub(2 * k + 1).filter(|&d| d > 0)?;

    let restricted = lagged_design(y, None, k);
    let unrestricted = lagged_design(y, Some(x), k);
    let response = DVector::from_iterator(rows, y[k..].iter().copied());

    let rss_r = residual_sum_of_squares(&restricted, &response)?;
    let rss_u = residual_sum_of_squares(&unrestricted, &response)?;

    let scale = response.norm_squared();
    if !(scale > 0.0) || rss_r <= PERFECT_FIT_REL * scale || rss_u <= PERFECT_FIT_REL * scale {
        return None;
    }

    let f_stat = (((rss_r - rss_u) / k as f64) / (rss_u / df_denom as f64)).max(0.0);
    if !f_stat.is_finite() {
        return None;
    }

    let dist = FisherSnedecor::new(k as f64, df_denom as f64).ok()?;
    let p_value = dist.sf(f_stat).clamp(0.0, 1.0);
    if !p_value.is_finite() {
        return None;
    }

    Some(GrangerLagResult {
        lag: k,
        f_stat,
        p_value,
        df_num: k,
        df_denom,
    })
}

/// Design matrix `[1, y_{t-1..t-k}, (x_{t-1..t-k})]` for rows `t = k..n`.
fn lagged_design(y: &[f64], x: Option<&[f64]>, k: usize) -> DMatrix<f64> {
    let rows = y.len() - k;
    let cols = 1 + k + if x.is_some() { k } else { 0 };
    DMatrix::from_fn(rows, cols, |r, c| {
        let t = r + k;
        match c {
            0 => 1.0,
            c if c <= k => y[t - c],
            c => match x {
                Some(x) => x[t - (c - k)],
                None => 0.0,
            },
        }
    })
}
