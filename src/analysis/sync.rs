//! Cross-asset synchronization.
//!
//! The synchronization index is the row-wise mean of trailing-window
//! correlations over every pair of a basket of assets. Comparing it between the
//! high- and low-stress tails of the stress distribution shows whether assets
//! move together more when stress is elevated.

use chrono::NaiveDate;
use log::warn;
use serde::Serialize;

use crate::analysis::align::align;
use crate::domain::{Frame, TimeSeries};
use crate::error::AnalysisError;
use crate::math::{TTest, mean, pearson, quantile, two_sample_t_test};

pub const SYNC_INDEX_NAME: &str = "SYNC_INDEX";

/// Trailing-window Pearson correlation.
///
/// Row `i` uses rows `i + 1 - window ..= i`; it is `None` until the window is
/// full, when any value in the window is missing, or when undefined.
pub fn rolling_correlation(x: &[Option<f64>], y: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let n = x.len().min(y.len());
    let mut out = vec![None; n];
    if window < 2 {
        return out;
    }
    for end in window..=n {
        let start = end - window;
        let pairs: Option<Vec<(f64, f64)>> = (start..end).map(|i| Some((x[i]?, y[i]?))).collect();
        if let Some(pairs) = pairs {
            let (xs, ys): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
            out[end - 1] = pearson(&xs, &ys);
        }
    }
    out
}

/// Rolling correlation of one asset pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairCorrelation {
    pub first: String,
    pub second: String,
    pub values: Vec<Option<f64>>,
}

impl PairCorrelation {
    pub fn label(&self) -> String {
        format!("{}_{}", self.first, self.second)
    }

    pub fn mean(&self) -> Option<f64> {
        let defined: Vec<f64> = self.values.iter().flatten().copied().collect();
        mean(&defined)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncIndex {
    pub window: usize,
    pub dates: Vec<NaiveDate>,
    pub pairs: Vec<PairCorrelation>,
    /// Mean of the defined pair correlations on each row.
    pub index: Vec<Option<f64>>,
}

impl SyncIndex {
    /// The index as a time series (rows without a value are dropped).
    pub fn series(&self) -> Result<TimeSeries, AnalysisError> {
        let points = self
            .dates
            .iter()
            .zip(self.index.iter())
            .filter_map(|(d, v)| v.map(|x| (*d, x)))
            .collect();
        TimeSeries::new(SYNC_INDEX_NAME, points)
    }
}

/// Rolling pairwise correlations across `assets` and their mean.
///
/// Assets absent from the frame are skipped; at least two must remain.
pub fn synchronization_index(frame: &Frame, assets: &[String], window: usize) -> Result<SyncIndex, AnalysisError> {
    let available: Vec<&String> = assets
        .iter()
        .filter(|a| {
            let present = frame.has_column(a);
            if !present {
                warn!("sync: asset `{a}` not in input; skipped");
            }
            present
        })
        .collect();

    if available.len() < 2 {
        return Err(AnalysisError::InsufficientData {
            needed: 2,
            got: available.len(),
        });
    }
    if window < 2 || window > frame.len() {
        return Err(AnalysisError::InsufficientData {
            needed: window.max(2),
            got: frame.len(),
        });
    }

    let mut pairs = Vec::new();
    for (i, first) in available.iter().enumerate() {
        for second in &available[i + 1..] {
            let (Some(x), Some(y)) = (frame.column(first), frame.column(second)) else {
                continue;
            };
            pairs.push(PairCorrelation {
                first: (*first).clone(),
                second: (*second).clone(),
                values: rolling_correlation(x, y, window),
            });
        }
    }

    let index = (0..frame.len())
        .map(|row| {
            let defined: Vec<f64> = pairs.iter().filter_map(|p| p.values[row]).collect();
            mean(&defined)
        })
        .collect();

    Ok(SyncIndex {
        window,
        dates: frame.dates().to_vec(),
        pairs,
        index,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeriodStats {
    pub n: usize,
    pub mean: Option<f64>,
}

/// Synchronization in the upper vs lower tail of the stress distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodComparison {
    pub upper_threshold: f64,
    pub lower_threshold: f64,
    pub high_stress: PeriodStats,
    pub low_stress: PeriodStats,
    pub test: Option<TTest>,
}

/// Compare `sync` where stress > Q(upper) against where stress < Q(lower).
pub fn compare_stress_periods(
    sync: &TimeSeries,
    stress: &TimeSeries,
    upper_q: f64,
    lower_q: f64,
) -> Result<PeriodComparison, AnalysisError> {
    let aligned = align(sync, stress);
    if aligned.is_empty() {
        return Err(AnalysisError::InsufficientData { needed: 1, got: 0 });
    }

    let got = aligned.len();
    let upper_threshold =
        quantile(&aligned.second, upper_q).ok_or(AnalysisError::InsufficientData { needed: 1, got })?;
    let lower_threshold =
        quantile(&aligned.second, lower_q).ok_or(AnalysisError::InsufficientData { needed: 1, got })?;

    let mut high = Vec::new();
    let mut low = Vec::new();
    for (&s, &level) in aligned.first.iter().zip(aligned.second.iter()) {
        if level > upper_threshold {
            high.push(s);
        } else if level < lower_threshold {
            low.push(s);
        }
    }

    Ok(PeriodComparison {
        upper_threshold,
        lower_threshold,
        high_stress: PeriodStats {
            n: high.len(),
            mean: mean(&high),
        },
        low_stress: PeriodStats {
            n: low.len(),
            mean: mean(&low),
        },
        test: two_sample_t_test(&high, &low),
    })
}
