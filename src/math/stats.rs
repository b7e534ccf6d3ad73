//! Descriptive statistics on plain `f64` slices.
//!
//! Every function returns `None` instead of NaN when the statistic is
//! undefined (too few points, zero variance), so callers cannot silently
//! carry NaN into later comparisons.

/// Minimum number of paired observations for a correlation.
pub const MIN_PAIRED_OBS: usize = 2;

/// Relative tolerance below which a spread is treated as zero.
const ZERO_SPREAD_REL: f64 = 1e-12;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample variance (n − 1 denominator).
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss = values.iter().map(|v| (v - m).powi(2)).sum::<f64>();
    Some(ss / (values.len() as f64 - 1.0))
}

/// Sample standard deviation (n − 1 denominator).
pub fn sample_std(values: &[f64]) -> Option<f64> {
    sample_variance(values).map(f64::sqrt)
}

/// Pearson product-moment correlation of two equally long slices.
///
/// `None` when fewer than [`MIN_PAIRED_OBS`] pairs exist, the lengths differ,
/// or either side has (numerically) zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len();
    if n != y.len() || n < MIN_PAIRED_OBS {
        return None;
    }
    let mx = mean(x)?;
    let my = mean(y)?;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (&a, &b) in x.iter().zip(y.iter()) {
        let dx = a - mx;
        let dy = b - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if is_zero_spread(sxx, n, x) || is_zero_spread(syy, n, y) {
        return None;
    }

    let r = sxy / (sxx.sqrt() * syy.sqrt());
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

/// Pearson correlation over the pairs where both sides are present.
pub fn pearson_defined(x: &[Option<f64>], y: &[Option<f64>]) -> Option<f64> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y.iter())
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .unzip();
    pearson(&xs, &ys)
}

/// `true` when the values vary beyond numerical noise.
pub fn has_spread(values: &[f64]) -> bool {
    let Some(m) = mean(values) else {
        return false;
    };
    let sum_sq = values.iter().map(|v| (v - m).powi(2)).sum::<f64>();
    !is_zero_spread(sum_sq, values.len(), values)
}

fn is_zero_spread(sum_sq: f64, n: usize, values: &[f64]) -> bool {
    let scale = values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let sd = (sum_sq / n as f64).sqrt();
    !(sd.is_finite()) || sd <= ZERO_SPREAD_REL * scale || sum_sq <= 0.0
}

/// Quantile with linear interpolation between order statistics.
///
/// `q` must lie in `[0, 1]`; non-finite values are ignored.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if !(0.0..=1.0).contains(&q) {
        return None;
    }
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    let h = (sorted.len() - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    let frac = h - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pearson_of_linear_relation_is_one() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y: Vec<f64> = x.iter().map(|v| 3.0 * v - 1.0).collect();
        let neg: Vec<f64> = x.iter().map(|v| -0.5 * v).collect();
        assert!((pearson(&x, &y).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&x, &neg).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_undefined_for_constant_or_short_input() {
        assert!(pearson(&[1.0, 2.0, 3.0], &[0.1, 0.1, 0.1]).is_none());
        assert!(pearson(&[1.0], &[2.0]).is_none());
        assert!(pearson(&[1.0, 2.0], &[2.0]).is_none());
    }

    #[test]
    fn pearson_defined_skips_missing_pairs() {
        let x = [Some(1.0), None, Some(2.0), Some(3.0)];
        let y = [Some(2.0), Some(100.0), Some(4.0), Some(6.0)];
        assert!((pearson_defined(&x, &y).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn spread_ignores_rounding_noise() {
        assert!(has_spread(&[1.0, 2.0]));
        assert!(!has_spread(&[3.0; 10]));
        assert!(!has_spread(&[1e6, 1e6 + 1e-9, 1e6]));
        assert!(!has_spread(&[]));
    }

    #[test]
    fn quantile_interpolates_linearly() {
        let v = [4.0, 1.0, 3.0, 2.0];
        assert_eq!(quantile(&v, 0.0), Some(1.0));
        assert_eq!(quantile(&v, 1.0), Some(4.0));
        // (n-1)*0.75 = 2.25 → 3 + 0.25*(4-3)
        assert!((quantile(&v, 0.75).unwrap() - 3.25).abs() < 1e-12);
        assert!(quantile(&[], 0.5).is_none());
        assert!(quantile(&v, 1.5).is_none());
    }

    #[test]
    fn sample_std_uses_n_minus_one() {
        let sd = sample_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        // population sd = 2, sample sd = 2 * sqrt(8/7)
        assert!((sd - 2.0 * (8.0_f64 / 7.0).sqrt()).abs() < 1e-12);
        assert!(sample_std(&[1.0]).is_none());
    }
}
