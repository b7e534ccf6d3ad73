//! Cross-correlation over a symmetric lag window.
//!
//! Lag convention: the value at lag `k` correlates `first[t]` with `second[t + k]`.
//!
//! - `k < 0`: the second series' *past* against the first's present
//!   (the second series leads).
//! - `k > 0`: the second series' *future* against the first's present
//!   (the first series leads).
//!
//! Under this convention `ccf(A, B)[k] == ccf(B, A)[-k]`.
//!
//! Only positions where both shifted operands exist are paired; the boundary
//! loss caused by shifting is excluded, never zero-filled.

use serde::Serialize;

use crate::analysis::align::AlignedPair;
use crate::domain::{CoMovement, LagWindow, LeadRole};
use crate::math::pearson;

/// Correlation at a single lag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LagCorrelation {
    pub lag: i64,
    /// `None` when fewer than two pairs overlap or either side is constant.
    pub correlation: Option<f64>,
    /// Number of overlapping pairs used.
    pub n_pairs: usize,
}

/// The lag with the strongest absolute correlation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DominantLag {
    pub lag: i64,
    pub correlation: f64,
    pub lead: LeadRole,
    pub co_movement: CoMovement,
}

/// Correlation at every lag of a window, in ascending lag order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossCorrelation {
    pub first_name: String,
    pub second_name: String,
    pub window: LagWindow,
    pub entries: Vec<LagCorrelation>,
}

impl CrossCorrelation {
    pub fn at(&self, lag: i64) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.lag == lag)
            .and_then(|e| e.correlation)
    }

    /// Number of lags with a defined correlation.
    pub fn defined_count(&self) -> usize {
        self.entries.iter().filter(|e| e.correlation.is_some()).count()
    }

    /// `true` when no lag has a defined correlation.
    pub fn is_empty(&self) -> bool {
        self.defined_count() == 0
    }

    /// Lag of maximal |r| among defined lags; ties go to the first (most negative) lag.
    pub fn dominant(&self) -> Option<DominantLag> {
        let mut best: Option<(i64, f64)> = None;
        for e in &self.entries {
            let Some(r) = e.correlation else { continue };
            match best {
                Some((_, b)) if r.abs() <= b.abs() => {}
                _ => best = Some((e.lag, r)),
            }
        }
        best.map(|(lag, correlation)| DominantLag {
            lag,
            correlation,
            lead: LeadRole::from_lag(lag),
            co_movement: CoMovement::from_correlation(correlation),
        })
    }
}

/// Cross-correlation of an aligned pair (`first` against shifted `second`).
pub fn cross_correlation(pair: &AlignedPair, window: LagWindow) -> CrossCorrelation {
    CrossCorrelation {
        first_name: pair.first_name.clone(),
        second_name: pair.second_name.clone(),
        window,
        entries: lagged_correlations(&pair.first, &pair.second, window),
    }
}

/// Correlations of `first[t]` with `second[t + k]` for every lag of the window.
pub fn lagged_correlations(first: &[f64], second: &[f64], window: LagWindow) -> Vec<LagCorrelation> {
    let n = first.len().min(second.len());
    window
        .lags()
        .map(|lag| {
            let (a, b) = overlap(&first[..n], &second[..n], lag);
            LagCorrelation {
                lag,
                correlation: pearson(a, b),
                n_pairs: a.len(),
            }
        })
        .collect()
}

/// Slices of `first` and `second` that pair `first[t]` with `second[t + lag]`.
fn overlap<'a>(first: &'a [f64], second: &'a [f64], lag: i64) -> (&'a [f64], &'a [f64]) {
    let n = first.len();
    let shift = lag.unsigned_abs() as usize;
    if shift >= n {
        return (&[], &[]);
    }
    if lag >= 0 {
        (&first[..n - shift], &second[shift..])
    } else {
        (&first[shift..], &second[..n - shift])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn pair(first: Vec<f64>, second: Vec<f64>) -> AlignedPair {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates = (0..first.len())
            .map(|i| start + chrono::Duration::days(i as i64))
            .collect();
        AlignedPair {
            first_name: "a".to_string(),
            second_name: "b".to_string(),
            dates,
            first,
            second,
        }
    }

    /// Deterministic, non-periodic test signal.
    fn signal(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let x = i as f64;
                (x * 0.7).sin() + 0.5 * (x * 1.3).cos() + 0.01 * x
            })
            .collect()
    }

    #[test]
    fn lagged_copy_peaks_at_plus_three() {
        // b[t] = a[t-3]  ⇒  a[t] == b[t+3]
        let a = signal(60);
        let mut b = vec![0.0; 60];
        for t in 3..60 {
            b[t] = a[t - 3];
        }
        // Drop the first three (filler) positions from both sides.
        let p = pair(a[3..].to_vec(), b[3..].to_vec());
        let window = LagWindow::new(6).unwrap();
        let ccf = cross_correlation(&p, window);

        assert_eq!(ccf.entries.len(), 13);
        let dom = ccf.dominant().unwrap();
        assert_eq!(dom.lag, 3);
        assert!((dom.correlation - 1.0).abs() < 1e-9);
        assert_eq!(dom.lead, LeadRole::FirstLeads);
        assert_eq!(dom.co_movement, CoMovement::Same);
    }

    #[test]
    fn swapping_series_mirrors_lags() {
        let a = signal(40);
        let b: Vec<f64> = signal(45)[5..].iter().map(|v| -2.0 * v + 1.0).collect();
        let window = LagWindow::new(5).unwrap();
        let p = pair(a, b);
        let ab = cross_correlation(&p, window);
        let ba = cross_correlation(&p.swapped(), window);
        for k in window.lags() {
            assert_eq!(ab.at(k), ba.at(-k), "lag {k}");
        }
        let dom = ab.dominant().unwrap();
        assert_eq!(dom.co_movement, CoMovement::Opposite);
    }

    #[test]
    fn extreme_lags_without_overlap_are_undefined() {
        let p = pair(vec![1.0, 3.0, 2.0], vec![2.0, 1.0, 5.0]);
        let window = LagWindow::new(5).unwrap();
        let ccf = cross_correlation(&p, window);

        assert_eq!(ccf.entries.len(), 11);
        for e in &ccf.entries {
            if e.lag.abs() >= 2 {
                assert!(e.correlation.is_none(), "lag {} should be undefined", e.lag);
            } else {
                assert!(e.correlation.is_some(), "lag {} should be defined", e.lag);
            }
        }
        assert_eq!(ccf.entries[0].n_pairs, 0);
    }

    #[test]
    fn constant_input_has_no_dominant_lag() {
        let p = pair(vec![0.0; 20], signal(20));
        let ccf = cross_correlation(&p, LagWindow::new(3).unwrap());
        assert_eq!(ccf.entries.len(), 7);
        assert!(ccf.is_empty());
        assert!(ccf.dominant().is_none());
    }

    #[test]
    fn correlations_stay_in_range_and_are_deterministic() {
        let p = pair(signal(80), signal(90)[7..87].to_vec());
        let window = LagWindow::new(10).unwrap();
        let first = cross_correlation(&p, window);
        let second = cross_correlation(&p, window);
        assert_eq!(first, second);
        for e in &first.entries {
            if let Some(r) = e.correlation {
                assert!((-1.0..=1.0).contains(&r));
            }
        }
    }
}
