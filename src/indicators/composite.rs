//! Composite indicators built from several raw series.
//!
//! - stress index: mean of standardized components, smoothed
//! - flow index: traded value (price × volume), smoothed and min-max scaled
//! - rebased ratio: relative performance of two price series, 100 at start

use log::warn;

use crate::analysis::align::align;
use crate::domain::{Frame, TimeSeries};
use crate::error::AnalysisError;
use crate::indicators::transform::{rolling_mean, zscore};
use crate::math::mean;

pub const STRESS_INDEX_NAME: &str = "STRESS_INDEX";
pub const DEFAULT_STRESS_SMOOTHING: usize = 5;
/// About one trading month.
pub const DEFAULT_FLOW_WINDOW: usize = 21;

/// One input of the stress index.
///
/// `inverted` components move opposite to stress (a flattening yield curve,
/// say) and are negated after standardization.
#[derive(Debug, Clone)]
pub struct StressComponent {
    pub series: TimeSeries,
    pub inverted: bool,
}

impl StressComponent {
    pub fn new(series: TimeSeries) -> Self {
        Self {
            series,
            inverted: false,
        }
    }

    pub fn inverted(series: TimeSeries) -> Self {
        Self {
            series,
            inverted: true,
        }
    }
}

/// Per-date mean of the available component z-scores, then a trailing mean of
/// `smoothing` observations.
///
/// Constant or too-short components are skipped with a warning. Errors when
/// no component survives.
pub fn stress_index(components: &[StressComponent], smoothing: usize) -> Result<TimeSeries, AnalysisError> {
    let standardized: Vec<TimeSeries> = components
        .iter()
        .filter_map(|c| {
            let Some(z) = zscore(&c.series) else {
                warn!("stress index: component `{}` has no spread; skipped", c.series.name());
                return None;
            };
            if !c.inverted {
                return Some(z);
            }
            let flipped = z.points().iter().map(|(d, v)| (*d, -v)).collect();
            Some(TimeSeries::from_ordered(z.name(), flipped))
        })
        .collect();

    if standardized.is_empty() {
        return Err(AnalysisError::DegenerateSeries(
            "no usable stress index component".to_string(),
        ));
    }

    let frame = Frame::from_series(&standardized);
    let points = frame
        .dates()
        .iter()
        .enumerate()
        .filter_map(|(row, date)| {
            let row_values: Vec<f64> = frame.columns().iter().filter_map(|c| c.values[row]).collect();
            mean(&row_values).map(|m| (*date, m))
        })
        .collect();

    let raw = TimeSeries::from_ordered(STRESS_INDEX_NAME, points);
    Ok(rolling_mean(&raw, smoothing))
}

/// Traded-value proxy for institutional flow, scaled to `[0, 1]`.
///
/// Price and volume are paired on shared dates. A flat smoothed series maps to
/// all zeros.
pub fn flow_index(name: &str, price: &TimeSeries, volume: &TimeSeries, window: usize) -> TimeSeries {
    let pair = align(price, volume);
    let traded = pair
        .dates
        .iter()
        .zip(pair.first.iter().zip(pair.second.iter()))
        .map(|(d, (p, v))| (*d, p * v))
        .collect();
    let smoothed = rolling_mean(&TimeSeries::from_ordered(name, traded), window);

    let values = smoothed.values();
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = hi - lo;

    let points = smoothed
        .points()
        .iter()
        .map(|(d, v)| {
            let scaled = if range > 0.0 { (v - lo) / range } else { 0.0 };
            (*d, scaled)
        })
        .collect();
    TimeSeries::from_ordered(name, points)
}

/// `numerator / denominator` on shared dates, rebased to 100 at the first one.
///
/// Dates with a zero denominator are dropped. `None` when nothing is shared or
/// the base ratio is zero.
pub fn rebased_ratio(name: &str, numerator: &TimeSeries, denominator: &TimeSeries) -> Option<TimeSeries> {
    let pair = align(numerator, denominator);
    let ratios: Vec<_> = pair
        .dates
        .iter()
        .zip(pair.first.iter().zip(pair.second.iter()))
        .filter(|(_, (_, den))| **den != 0.0)
        .map(|(d, (num, den))| (*d, num / den))
        .collect();

    let base = ratios.first().map(|(_, r)| *r).filter(|r| *r != 0.0)?;
    let points = ratios.into_iter().map(|(d, r)| (d, r / base * 100.0)).collect();
    Some(TimeSeries::from_ordered(name, points))
}
