//! Student t-tests (two-sided).

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::math::stats::{mean, sample_variance};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TTest {
    pub t_stat: f64,
    pub df: f64,
    pub p_value: f64,
}

/// Pooled-variance two-sample t-test of `mean(a) == mean(b)`.
///
/// `None` if either sample has fewer than two values or the pooled variance is zero.
pub fn two_sample_t_test(a: &[f64], b: &[f64]) -> Option<TTest> {
    let (na, nb) = (a.len(), b.len());
    if na < 2 || nb < 2 {
        return None;
    }
    let df = (na + nb - 2) as f64;
    let pooled = ((na as f64 - 1.0) * sample_variance(a)? + (nb as f64 - 1.0) * sample_variance(b)?) / df;
    let se = (pooled * (1.0 / na as f64 + 1.0 / nb as f64)).sqrt();
    if !(se.is_finite() && se > 0.0) {
        return None;
    }
    let t_stat = (mean(a)? - mean(b)?) / se;
    two_sided(t_stat, df)
}

/// One-sample t-test of `mean(values) == mu`.
pub fn one_sample_t_test(values: &[f64], mu: f64) -> Option<TTest> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let se = (sample_variance(values)? / n as f64).sqrt();
    if !(se.is_finite() && se > 0.0) {
        return None;
    }
    let t_stat = (mean(values)? - mu) / se;
    two_sided(t_stat, n as f64 - 1.0)
}

fn two_sided(t_stat: f64, df: f64) -> Option<TTest> {
    if !t_stat.is_finite() {
        return None;
    }
    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    let p_value = (2.0 * dist.sf(t_stat.abs())).clamp(0.0, 1.0);
    Some(TTest { t_stat, df, p_value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_sample_matches_hand_computation() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b = [3.0, 4.0, 5.0, 6.0, 7.0];
        let t = two_sample_t_test(&a, &b).unwrap();
        // means differ by 2, pooled var 2.5, se = sqrt(2.5 * 0.4) = 1
        assert!((t.t_stat + 2.0).abs() < 1e-12);
        assert_eq!(t.df, 8.0);
        // two-sided p for t=2, df=8 ≈ 0.0805
        assert!((t.p_value - 0.0805).abs() < 1e-3, "p={}", t.p_value);
    }

    #[test]
    fn one_sample_detects_shift() {
        let v = [0.9, 1.1, 1.0, 1.2, 0.8, 1.0];
        let t = one_sample_t_test(&v, 0.0).unwrap();
        assert!(t.t_stat > 10.0);
        assert!(t.p_value < 1e-4);
    }

    #[test]
    fn degenerate_samples_yield_none() {
        assert!(two_sample_t_test(&[1.0], &[1.0, 2.0]).is_none());
        assert!(two_sample_t_test(&[1.0, 1.0], &[1.0, 1.0]).is_none());
        assert!(one_sample_t_test(&[3.0, 3.0, 3.0], 0.0).is_none());
    }
}
