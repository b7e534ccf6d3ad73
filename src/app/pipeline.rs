//! Shared analysis pipeline used by every CLI command.
//!
//! Keeping this in one place avoids duplicating the core workflows:
//!
//! - lead-lag: align + difference -> CCF -> Granger both ways -> verdict
//! - regimes: quantile split on stress -> per-pair correlations -> shift class
//! - sync: rolling pairwise correlations -> index -> high/low stress t-test
//! - events: stress peaks -> defensive ratio windows -> t-test
//!
//! Non-fatal failures of one pair are kept on that pair's result (and logged)
//! so a batch always completes.

use log::{info, warn};
use rayon::prelude::*;
use serde::Serialize;

use crate::analysis::events::{
    DEFAULT_EVENT_HALF_WINDOW, DEFAULT_EVENT_SIGMA, DEFAULT_EVENT_WINDOW, EventStudy, StressEvent, detect_stress_events,
    event_study,
};
use crate::analysis::regime::{RegimeComparison, compare_with_split, split_regimes};
use crate::analysis::sync::{PeriodComparison, SyncIndex, compare_stress_periods, synchronization_index};
use crate::analysis::{
    BidirectionalGranger, CausalSummary, CrossCorrelation, DominantLag, align_and_difference, cross_correlation,
    granger_bidirectional, summarize,
};
use crate::data::SyntheticData;
use crate::domain::{AnalysisConfig, Frame};
use crate::error::{AnalysisError, AppError};
use crate::math::mean;

/// Everything computed for one stress/flow pair.
#[derive(Debug, Clone, Serialize)]
pub struct PairAnalysis {
    pub stress: String,
    pub flow: String,
    /// Aligned observations after differencing.
    pub observations: usize,
    pub ccf: Option<CrossCorrelation>,
    pub dominant: Option<DominantLag>,
    pub granger: Option<BidirectionalGranger>,
    pub summary: Option<CausalSummary>,
    /// Why a step produced no result.
    pub issues: Vec<String>,
}

impl PairAnalysis {
    fn empty(stress: &str, flow: &str) -> Self {
        Self {
            stress: stress.to_string(),
            flow: flow.to_string(),
            observations: 0,
            ccf: None,
            dominant: None,
            granger: None,
            summary: None,
            issues: Vec::new(),
        }
    }

    fn note(&mut self, step: &str, err: impl std::fmt::Display) {
        warn!("{} vs {}: {step} skipped: {err}", self.stress, self.flow);
        self.issues.push(format!("{step}: {err}"));
    }
}

/// All lead-lag outputs of one run, in the order the flows were given.
#[derive(Debug, Clone, Serialize)]
pub struct LeadLagRun {
    pub config: AnalysisConfig,
    pub stress: String,
    pub pairs: Vec<PairAnalysis>,
}

/// Run the full lead-lag workflow for a single pair.
///
/// The stress series is the *first* series throughout: positive CCF lags mean
/// stress leads, `first_to_second` is stress → flow.
pub fn analyze_pair(frame: &Frame, stress_col: &str, flow_col: &str, config: &AnalysisConfig) -> PairAnalysis {
    let mut out = PairAnalysis::empty(stress_col, flow_col);

    let series = frame
        .series(stress_col)
        .and_then(|s| frame.series(flow_col).map(|f| (s, f)));
    let (stress, flow) = match series {
        Ok(pair) => pair,
        Err(e) => {
            out.note("input", e);
            return out;
        }
    };

    let Some(pair) = align_and_difference(&stress, &flow) else {
        out.note("alignment", "fewer than two shared observations after differencing");
        return out;
    };
    out.observations = pair.len();

    match config.lag_window() {
        Ok(window) => {
            let ccf = cross_correlation(&pair, window);
            out.dominant = ccf.dominant();
            if out.dominant.is_none() {
                out.note("cross-correlation", "no defined lag");
            }
            out.ccf = Some(ccf);
        }
        Err(e) => out.note("cross-correlation", e),
    }

    match granger_bidirectional(&pair, &config.sorted_lag_orders()) {
        Ok(granger) => {
            out.summary = summarize(&granger, config.significance);
            out.granger = Some(granger);
        }
        Err(e) => out.note("granger", e),
    }

    out
}

/// Analyze every flow against the stress column, pairs in parallel.
pub fn run_leadlag(
    frame: &Frame,
    stress_col: &str,
    flow_cols: &[String],
    config: &AnalysisConfig,
) -> Result<LeadLagRun, AppError> {
    config.validate()?;
    require_column(frame, stress_col)?;
    if flow_cols.is_empty() {
        return Err(AppError::new(2, "No flow columns to analyze."));
    }

    info!("lead-lag: {} flow(s) against `{stress_col}`", flow_cols.len());
    let pairs: Vec<PairAnalysis> = flow_cols
        .par_iter()
        .map(|flow| analyze_pair(frame, stress_col, flow, config))
        .collect();

    if pairs.iter().all(|p| p.ccf.is_none() && p.granger.is_none()) {
        return Err(AppError::new(3, "No flow produced a usable lead-lag result."));
    }

    Ok(LeadLagRun {
        config: config.clone(),
        stress: stress_col.to_string(),
        pairs,
    })
}

/// Calm vs stress correlations for each requested pair.
#[derive(Debug, Clone, Serialize)]
pub struct RegimeRun {
    pub stress: String,
    pub quantile: f64,
    pub threshold: f64,
    pub calm_rows: usize,
    pub stress_rows: usize,
    pub comparisons: Vec<RegimeComparison>,
}

pub fn run_regimes(
    frame: &Frame,
    stress_col: &str,
    pairs: &[(String, String)],
    config: &AnalysisConfig,
) -> Result<RegimeRun, AppError> {
    config.validate()?;
    let split = split_regimes(frame, stress_col, config.regime_quantile)?;
    let comparisons = compare_with_split(frame, &split, pairs, config.shift_threshold)?;
    if comparisons.is_empty() {
        return Err(AppError::new(3, "None of the requested regime pairs is present in the input."));
    }

    Ok(RegimeRun {
        stress: stress_col.to_string(),
        quantile: config.regime_quantile,
        threshold: split.threshold,
        calm_rows: split.calm_rows(),
        stress_rows: split.stress_rows(),
        comparisons,
    })
}

/// Parameters of the synchronization workflow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncParams {
    pub window: usize,
    pub upper_quantile: f64,
    pub lower_quantile: f64,
}

impl Default for SyncParams {
    fn default() -> Self {
        Self {
            window: 90,
            upper_quantile: 0.75,
            lower_quantile: 0.25,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncRun {
    pub params: SyncParams,
    /// Mean rolling correlation per pair label.
    pub pair_means: Vec<(String, Option<f64>)>,
    pub mean_index: Option<f64>,
    /// `None` when no stress column was available to split on.
    pub periods: Option<PeriodComparison>,
    #[serde(skip)]
    pub index: SyncIndex,
}

pub fn run_sync(
    frame: &Frame,
    stress_col: Option<&str>,
    assets: &[String],
    params: &SyncParams,
) -> Result<SyncRun, AppError> {
    let invalid_q = |q: f64| !(0.0..=1.0).contains(&q);
    if invalid_q(params.upper_quantile) || invalid_q(params.lower_quantile) || params.lower_quantile > params.upper_quantile
    {
        return Err(AppError::new(2, "Sync quantiles must satisfy 0 <= lower <= upper <= 1."));
    }

    let index = synchronization_index(frame, assets, params.window)?;
    let sync_series = index.series()?;
    if sync_series.is_empty() {
        return Err(AppError::new(3, "Synchronization index has no defined value."));
    }

    let periods = match stress_col {
        Some(col) => {
            let stress = frame.series(col)?;
            match compare_stress_periods(&sync_series, &stress, params.upper_quantile, params.lower_quantile) {
                Ok(cmp) => Some(cmp),
                Err(e) => {
                    warn!("sync: period comparison skipped: {e}");
                    None
                }
            }
        }
        None => None,
    };

    Ok(SyncRun {
        params: params.clone(),
        pair_means: index.pairs.iter().map(|p| (p.label(), p.mean())).collect(),
        mean_index: mean(&sync_series.values()),
        periods,
        index,
    })
}

/// Parameters of the event study.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventParams {
    pub sigma: f64,
    pub half_window: usize,
    pub pre_window: usize,
    pub post_window: usize,
}

impl Default for EventParams {
    fn default() -> Self {
        Self {
            sigma: DEFAULT_EVENT_SIGMA,
            half_window: DEFAULT_EVENT_HALF_WINDOW,
            pre_window: DEFAULT_EVENT_WINDOW,
            post_window: DEFAULT_EVENT_WINDOW,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EventRun {
    pub params: EventParams,
    pub stress: String,
    pub ratio: String,
    pub events: Vec<StressEvent>,
    pub study: EventStudy,
}

pub fn run_events(frame: &Frame, stress_col: &str, ratio_col: &str, params: &EventParams) -> Result<EventRun, AppError> {
    if !(params.sigma.is_finite() && params.sigma >= 0.0) {
        return Err(AppError::new(2, "Event sigma must be finite and >= 0."));
    }
    if params.half_window == 0 {
        return Err(AppError::new(2, "Event half-window must be at least 1."));
    }
    let stress = frame.series(stress_col)?;
    let ratio = frame.series(ratio_col)?;

    let events = detect_stress_events(&stress, params.sigma, params.half_window);
    info!("events: {} stress peak(s) above {} sigma", events.len(), params.sigma);
    let study = event_study(&events, &ratio, params.pre_window, params.post_window);

    Ok(EventRun {
        params: params.clone(),
        stress: stress_col.to_string(),
        ratio: ratio_col.to_string(),
        events,
        study,
    })
}

/// Everything a run produced, for the JSON summary.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub leadlag: Option<LeadLagRun>,
    pub regimes: Option<RegimeRun>,
    pub sync: Option<SyncRun>,
    pub events: Option<EventRun>,
}

/// Every workflow over a synthetic dataset, using its known column layout.
///
/// Lead-lag failures are fatal; the other workflows are logged and left out.
pub fn run_all(data: &SyntheticData, config: &AnalysisConfig) -> Result<RunSummary, AppError> {
    let leadlag = run_leadlag(&data.frame, &data.stress_column, &data.flow_columns, config)?;
    let regimes = optional("regimes", run_regimes(&data.frame, &data.stress_column, &data.regime_pairs(), config));
    let sync = optional(
        "sync",
        run_sync(
            &data.frame,
            Some(&data.stress_column),
            &data.return_columns,
            &SyncParams::default(),
        ),
    );
    let events = optional(
        "events",
        run_events(&data.frame, &data.stress_column, &data.ratio_column, &EventParams::default()),
    );

    Ok(RunSummary {
        leadlag: Some(leadlag),
        regimes,
        sync,
        events,
    })
}

fn optional<T>(step: &str, result: Result<T, AppError>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("{step} skipped: {e}");
            None
        }
    }
}

fn require_column(frame: &Frame, name: &str) -> Result<(), AppError> {
    if frame.has_column(name) {
        Ok(())
    } else {
        Err(AnalysisError::MissingColumn(name.to_string()).into())
    }
}
