//! Elementwise and rolling transforms of a single series.
//!
//! Rolling windows run over consecutive observations (not calendar days). The
//! first `window - 1` observations have no full window and are dropped.

use chrono::NaiveDate;

use crate::domain::TimeSeries;
use crate::math::{mean, sample_std};

/// Trading days per year used for annualization.
pub const PERIODS_PER_YEAR: f64 = 252.0;

/// `ln(x_t / x_{t-1})`; steps with a non-positive level are skipped.
pub fn log_returns(series: &TimeSeries) -> TimeSeries {
    map_steps(series, |prev, curr| {
        (prev > 0.0 && curr > 0.0).then(|| (curr / prev).ln())
    })
}

/// `x_t / x_{t-1} - 1`; steps from a zero level are skipped.
pub fn pct_change(series: &TimeSeries) -> TimeSeries {
    map_steps(series, |prev, curr| (prev != 0.0).then(|| curr / prev - 1.0))
}

/// Standardize with the full-sample mean and sample standard deviation.
///
/// `None` for constant or too-short series.
pub fn zscore(series: &TimeSeries) -> Option<TimeSeries> {
    let values = series.values();
    let m = mean(&values)?;
    let sd = sample_std(&values).filter(|sd| *sd > 0.0 && sd.is_finite())?;
    let points = series.points().iter().map(|(d, v)| (*d, (v - m) / sd)).collect();
    Some(build(series.name(), points))
}

pub fn rolling_mean(series: &TimeSeries, window: usize) -> TimeSeries {
    rolling(series, window, mean)
}

pub fn rolling_std(series: &TimeSeries, window: usize) -> TimeSeries {
    rolling(series, window, sample_std)
}

/// Rolling standard deviation of simple returns, annualized.
pub fn annualized_volatility(series: &TimeSeries, window: usize) -> TimeSeries {
    let vol = rolling_std(&pct_change(series), window);
    let scale = PERIODS_PER_YEAR.sqrt();
    let points = vol.points().iter().map(|(d, v)| (*d, v * scale)).collect();
    build(series.name(), points)
}

fn rolling(series: &TimeSeries, window: usize, stat: impl Fn(&[f64]) -> Option<f64>) -> TimeSeries {
    let window = window.max(1);
    let points = series.points();
    let values = series.values();
    let out = (window..=values.len())
        .filter_map(|end| {
            let v = stat(&values[end - window..end])?;
            Some((points[end - 1].0, v))
        })
        .collect();
    build(series.name(), out)
}

fn map_steps(series: &TimeSeries, f: impl Fn(f64, f64) -> Option<f64>) -> TimeSeries {
    let out = series
        .points()
        .windows(2)
        .filter_map(|w| f(w[0].1, w[1].1).map(|v| (w[1].0, v)))
        .collect();
    build(series.name(), out)
}

// Outputs keep (a subset of) the input's date order.
fn build(name: &str, points: Vec<(NaiveDate, f64)>) -> TimeSeries {
    TimeSeries::from_ordered(name, points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[f64]) -> TimeSeries {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        TimeSeries::new(
            "x",
            values
                .iter()
                .enumerate()
                .map(|(i, v)| (start + chrono::Duration::days(i as i64), *v))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn log_returns_skip_non_positive_levels() {
        let r = log_returns(&series(&[100.0, 110.0, 0.0, 50.0, 55.0]));
        let v = r.values();
        assert_eq!(v.len(), 2);
        assert!((v[0] - (1.1_f64).ln()).abs() < 1e-12);
        assert!((v[1] - (1.1_f64).ln()).abs() < 1e-12);
    }

    #[test]
    fn zscore_centers_and_scales() {
        let z = zscore(&series(&[1.0, 2.0, 3.0])).unwrap();
        assert_eq!(z.values(), vec![-1.0, 0.0, 1.0]);
        assert!(zscore(&series(&[4.0, 4.0, 4.0])).is_none());
    }

    #[test]
    fn rolling_mean_drops_incomplete_windows() {
        let s = series(&[1.0, 2.0, 3.0, 4.0]);
        let m = rolling_mean(&s, 3);
        assert_eq!(m.values(), vec![2.0, 3.0]);
        assert_eq!(m.points()[0].0, s.points()[2].0);
    }

    #[test]
    fn annualized_volatility_of_constant_growth_is_zero() {
        let levels: Vec<f64> = (0..30).map(|i| 100.0 * 1.01_f64.powi(i)).collect();
        let vol = annualized_volatility(&series(&levels), 21);
        assert_eq!(vol.len(), 29 - 20);
        assert!(vol.values().iter().all(|v| v.abs() < 1e-9));
    }
}
