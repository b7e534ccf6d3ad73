//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during analysis
//! - exported to JSON/CSV
//! - rendered by the report layer without re-computation

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, AppError};

pub const DEFAULT_MAX_LAG: usize = 30;
pub const DEFAULT_LAG_ORDERS: [usize; 4] = [1, 3, 5, 10];
pub const DEFAULT_SIGNIFICANCE: f64 = 0.05;
pub const DEFAULT_REGIME_QUANTILE: f64 = 0.75;
pub const DEFAULT_SHIFT_THRESHOLD: f64 = 0.2;

/// An ordered, date-indexed series of finite values.
///
/// Dates are strictly increasing (and therefore unique). The series is never
/// mutated by analysis code; transforms return a new series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    name: String,
    points: Vec<(NaiveDate, f64)>,
}

impl TimeSeries {
    pub fn new(name: impl Into<String>, points: Vec<(NaiveDate, f64)>) -> Result<Self, AnalysisError> {
        let name = name.into();
        if let Some((date, _)) = points.iter().find(|(_, v)| !v.is_finite()) {
            return Err(AnalysisError::InvalidSeries(format!(
                "`{name}` has a non-finite value at {date}"
            )));
        }
        if let Some(w) = points.windows(2).find(|w| w[1].0 <= w[0].0) {
            return Err(AnalysisError::InvalidSeries(format!(
                "`{name}` dates are not strictly increasing ({} then {})",
                w[0].0, w[1].0
            )));
        }
        Ok(Self { name, points })
    }

    /// Build from points already in strictly increasing date order (for
    /// example derived from another series). Non-finite values are dropped.
    pub(crate) fn from_ordered(name: impl Into<String>, points: Vec<(NaiveDate, f64)>) -> Self {
        debug_assert!(points.windows(2).all(|w| w[0].0 < w[1].0));
        Self {
            name: name.into(),
            points: points.into_iter().filter(|(_, v)| v.is_finite()).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn points(&self) -> &[(NaiveDate, f64)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|(d, _)| *d).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|(_, v)| *v).collect()
    }

    /// First difference: `diff[t] = x[t] - x[t-1]`, dated at `t`.
    ///
    /// The first observation has no predecessor and is dropped.
    pub fn difference(&self) -> TimeSeries {
        let points = self
            .points
            .windows(2)
            .map(|w| (w[1].0, w[1].1 - w[0].1))
            .collect();
        TimeSeries::from_ordered(self.name.clone(), points)
    }

    /// Same observations under a different name.
    pub fn renamed(&self, name: impl Into<String>) -> TimeSeries {
        TimeSeries {
            name: name.into(),
            points: self.points.clone(),
        }
    }
}

/// A named column of a [`Frame`]; `None` marks a missing cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// A date-indexed table of numeric columns (the "master dataset").
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    dates: Vec<NaiveDate>,
    columns: Vec<Column>,
}

impl Frame {
    pub fn new(dates: Vec<NaiveDate>) -> Result<Self, AnalysisError> {
        if let Some(w) = dates.windows(2).find(|w| w[1] <= w[0]) {
            return Err(AnalysisError::InvalidSeries(format!(
                "frame dates are not strictly increasing ({} then {})",
                w[0], w[1]
            )));
        }
        Ok(Self {
            dates,
            columns: Vec::new(),
        })
    }

    /// Outer-join a set of series on the union of their dates.
    pub fn from_series(series: &[TimeSeries]) -> Frame {
        let dates: Vec<NaiveDate> = series
            .iter()
            .flat_map(|s| s.points().iter().map(|(d, _)| *d))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let columns = series
            .iter()
            .map(|s| {
                let mut values = vec![None; dates.len()];
                let mut cursor = 0usize;
                for &(date, value) in s.points() {
                    // Both sides are sorted, so a forward scan is enough.
                    while dates[cursor] < date {
                        cursor += 1;
                    }
                    values[cursor] = Some(value);
                }
                Column {
                    name: s.name().to_string(),
                    values,
                }
            })
            .collect();

        Frame { dates, columns }
    }

    /// Insert (or replace) a column. Its length must match the date index.
    pub fn insert_column(&mut self, name: impl Into<String>, values: Vec<Option<f64>>) -> Result<(), AnalysisError> {
        let name = name.into();
        if values.len() != self.dates.len() {
            return Err(AnalysisError::InvalidSeries(format!(
                "column `{name}` has {} rows, frame has {}",
                values.len(),
                self.dates.len()
            )));
        }
        let values = values
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect();
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(col) => col.values = values,
            None => self.columns.push(Column { name, values }),
        }
        Ok(())
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Extract a column as a [`TimeSeries`], dropping missing cells.
    pub fn series(&self, name: &str) -> Result<TimeSeries, AnalysisError> {
        let values = self
            .column(name)
            .ok_or_else(|| AnalysisError::MissingColumn(name.to_string()))?;
        let points = self
            .dates
            .iter()
            .zip(values.iter())
            .filter_map(|(d, v)| v.map(|x| (*d, x)))
            .collect();
        TimeSeries::new(name, points)
    }
}

/// Symmetric lag window `[-max_lag, max_lag]` in time steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LagWindow {
    max_lag: usize,
}

impl LagWindow {
    /// `None` when `max_lag == 0`.
    pub fn new(max_lag: usize) -> Option<Self> {
        (max_lag > 0).then_some(Self { max_lag })
    }

    pub fn max_lag(self) -> usize {
        self.max_lag
    }

    /// All lags in ascending order.
    pub fn lags(self) -> impl Iterator<Item = i64> {
        let l = self.max_lag as i64;
        -l..=l
    }

    /// Number of lags in the window (`2L + 1`).
    pub fn size(self) -> usize {
        2 * self.max_lag + 1
    }
}

/// Directional verdict derived from the two Granger p-values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipVerdict {
    /// Only A→B is significant: the target reacts to the candidate.
    Reactive,
    /// Only B→A is significant: the candidate anticipates the target.
    Predictive,
    /// Both directions are significant.
    FeedbackLoop,
    /// Neither direction is significant.
    NoRelation,
}

impl RelationshipVerdict {
    pub fn label(self) -> &'static str {
        match self {
            RelationshipVerdict::Reactive => "REACTIVE",
            RelationshipVerdict::Predictive => "PREDICTIVE",
            RelationshipVerdict::FeedbackLoop => "FEEDBACK_LOOP",
            RelationshipVerdict::NoRelation => "NO_RELATION",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            RelationshipVerdict::Reactive => "flows react to the stress signal",
            RelationshipVerdict::Predictive => "flows move before stress rises",
            RelationshipVerdict::FeedbackLoop => "each series feeds the other",
            RelationshipVerdict::NoRelation => "no clear short-run statistical relation",
        }
    }
}

/// How a pair's correlation shifts from the calm to the stress regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegimeShift {
    /// Correlation rises under stress (contagion).
    Converge,
    /// Correlation falls under stress (decoupling).
    Diverge,
    Stable,
}

impl RegimeShift {
    pub fn label(self) -> &'static str {
        match self {
            RegimeShift::Converge => "CONVERGE",
            RegimeShift::Diverge => "DIVERGE",
            RegimeShift::Stable => "STABLE",
        }
    }
}

/// Which series leads at a given lag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadRole {
    /// Negative lag: the second series' past lines up with the first's present.
    SecondLeads,
    Contemporaneous,
    /// Positive lag: the first series' present lines up with the second's future.
    FirstLeads,
}

impl LeadRole {
    pub fn from_lag(lag: i64) -> Self {
        match lag.cmp(&0) {
            std::cmp::Ordering::Less => LeadRole::SecondLeads,
            std::cmp::Ordering::Equal => LeadRole::Contemporaneous,
            std::cmp::Ordering::Greater => LeadRole::FirstLeads,
        }
    }
}

/// Sign of the correlation at the dominant lag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoMovement {
    /// Both move the same way.
    Same,
    /// The first falls when the second rises.
    Opposite,
}

impl CoMovement {
    pub fn from_correlation(r: f64) -> Self {
        if r < 0.0 { CoMovement::Opposite } else { CoMovement::Same }
    }
}

/// A full run's analysis configuration.
///
/// Every component receives the relevant fields explicitly at call time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Maximum lag (time steps) of the cross-correlation window.
    pub max_lag: usize,
    /// Candidate Granger lag orders.
    pub lag_orders: Vec<usize>,
    /// p-values strictly below this are significant.
    pub significance: f64,
    /// Stress quantile separating calm from stress regimes.
    pub regime_quantile: f64,
    /// Minimum |stress − calm| correlation change to count as a shift.
    pub shift_threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_lag: DEFAULT_MAX_LAG,
            lag_orders: DEFAULT_LAG_ORDERS.to_vec(),
            significance: DEFAULT_SIGNIFICANCE,
            regime_quantile: DEFAULT_REGIME_QUANTILE,
            shift_threshold: DEFAULT_SHIFT_THRESHOLD,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.max_lag == 0 {
            return Err(AppError::new(2, "max lag must be > 0."));
        }
        if self.lag_orders.is_empty() || self.lag_orders.contains(&0) {
            return Err(AppError::new(2, "Granger lag orders must be non-empty and > 0."));
        }
        if !(self.significance.is_finite() && self.significance > 0.0 && self.significance < 1.0) {
            return Err(AppError::new(2, "significance must be in (0, 1)."));
        }
        if !(self.regime_quantile.is_finite() && self.regime_quantile > 0.0 && self.regime_quantile < 1.0) {
            return Err(AppError::new(2, "regime quantile must be in (0, 1)."));
        }
        if !(self.shift_threshold.is_finite() && self.shift_threshold >= 0.0) {
            return Err(AppError::new(2, "shift threshold must be finite and >= 0."));
        }
        Ok(())
    }

    pub fn lag_window(&self) -> Result<LagWindow, AppError> {
        LagWindow::new(self.max_lag).ok_or_else(|| AppError::new(2, "max lag must be > 0."))
    }

    /// Deduplicated lag orders in ascending order.
    pub fn sorted_lag_orders(&self) -> Vec<usize> {
        let mut lags = self.lag_orders.clone();
        lags.sort_unstable();
        lags.dedup();
        lags
    }
}
