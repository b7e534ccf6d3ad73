//! Seeded synthetic dataset with a planted lead-lag structure.
//!
//! A common daily stress shock drives three raw stress components (one of them
//! inverted). One flow series reacts to that shock `lead_days` *before* it hits
//! the stress components, so flows lead stress; a second flow is independent.
//! Two correlated equity assets and one defensive asset carry price and volume
//! series, and equity co-movement rises when the stress level is in its upper
//! quartile.
//!
//! Same configuration (seed included) => identical frame.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{DEFAULT_REGIME_QUANTILE, Frame, TimeSeries};
use crate::error::AppError;
use crate::indicators::{
    DEFAULT_FLOW_WINDOW, DEFAULT_STRESS_SMOOTHING, STRESS_INDEX_NAME, StressComponent, annualized_volatility,
    flow_index, log_returns, rebased_ratio, stress_index,
};
use crate::math::quantile;

pub const LEAD_FLOW: &str = "LEAD_Flow_Index";
pub const INDEPENDENT_FLOW: &str = "INDEPENDENT_Flow_Index";
pub const DEFENSIVE_RATIO: &str = "DEFENSIVE_RATIO";
pub const EQUITY_VOLATILITY: &str = "FXI_Vol_30d";

/// Trailing window of the equity volatility column.
const VOL_WINDOW: usize = 30;

/// Minimum length that leaves room for smoothing windows and Granger lags.
const MIN_DAYS: usize = 60;

#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticConfig {
    pub seed: u64,
    /// Number of business days.
    pub days: usize,
    pub start: NaiveDate,
    /// How many days flow innovations precede the stress shock.
    pub lead_days: usize,
    /// Weight of the stress shock in the leading flow's innovations, in `[0, 1]`.
    pub coupling: f64,
    pub stress_smoothing: usize,
    pub flow_window: usize,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            seed: 7,
            days: 1500,
            start: NaiveDate::from_ymd_opt(2015, 1, 5).unwrap_or_default(),
            lead_days: 3,
            coupling: 0.6,
            stress_smoothing: DEFAULT_STRESS_SMOOTHING,
            flow_window: DEFAULT_FLOW_WINDOW,
        }
    }
}

/// Generated frame plus the names of the columns each analysis expects.
#[derive(Debug, Clone)]
pub struct SyntheticData {
    pub frame: Frame,
    pub stress_column: String,
    pub flow_columns: Vec<String>,
    /// Log-return columns of every asset, equities first.
    pub return_columns: Vec<String>,
    pub ratio_column: String,
}

impl SyntheticData {
    /// Return-column pairs compared across stress regimes.
    pub fn regime_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for (i, first) in self.return_columns.iter().enumerate() {
            for second in &self.return_columns[i + 1..] {
                pairs.push((first.clone(), second.clone()));
            }
        }
        pairs
    }
}

pub fn generate_synthetic(config: &SyntheticConfig) -> Result<SyntheticData, AppError> {
    if config.days < MIN_DAYS {
        return Err(AppError::new(2, format!("Synthetic sample needs at least {MIN_DAYS} days.")));
    }
    if !(0.0..=1.0).contains(&config.coupling) {
        return Err(AppError::new(2, "Coupling must be within [0, 1]."));
    }
    if config.lead_days >= config.days / 2 {
        return Err(AppError::new(2, "Lead must be shorter than half the sample."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, 1.0).map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;
    let mut draw = |n: usize| -> Vec<f64> { (0..n).map(|_| normal.sample(&mut rng)).collect() };

    let n = config.days;
    let dates = business_days(config.start, n);

    // shock[t] hits stress on day t and the leading flow on day t - lead.
    let shock = draw(n + config.lead_days);
    let stress_level = walk(0.0, shock[..n].iter().copied());
    let high_stress = quantile(&stress_level, DEFAULT_REGIME_QUANTILE)
        .ok_or_else(|| AppError::new(4, "Failed to compute the stress quartile."))?;

    let (vix_noise, ted_noise, curve_noise) = (draw(n), draw(n), draw(n));
    let vix = walk(20.0, (0..n).map(|t| 1.5 * shock[t] + 0.3 * vix_noise[t]));
    let ted = walk(0.4, (0..n).map(|t| 0.05 * shock[t] + 0.02 * ted_noise[t]));
    let curve = walk(1.0, (0..n).map(|t| -0.1 * shock[t] + 0.03 * curve_noise[t]));

    let idio = (1.0 - config.coupling * config.coupling).sqrt();
    let (lead_noise, indep_noise) = (draw(n), draw(n));
    let lead_flow = walk(
        50.0,
        (0..n).map(|t| -config.coupling * shock[t + config.lead_days] + idio * lead_noise[t]),
    );
    let independent_flow = walk(50.0, indep_noise.iter().copied());

    // Equities share a market factor whose weight jumps in high stress.
    let (market, fxi_idio, mchi_idio, gld_idio) = (draw(n), draw(n), draw(n), draw(n));
    let loading: Vec<f64> = stress_level
        .iter()
        .map(|s| if *s > high_stress { 0.9 } else { 0.3 })
        .collect();
    let equity_return = |idio: &[f64], t: usize| {
        let w = loading[t];
        0.01 * (w * market[t] + (1.0 - w * w).sqrt() * idio[t] - 0.2 * shock[t])
    };
    let fxi_price = compound(30.0, (0..n).map(|t| equity_return(&fxi_idio, t)));
    let mchi_price = compound(45.0, (0..n).map(|t| equity_return(&mchi_idio, t)));
    let gld_price = compound(120.0, (0..n).map(|t| 0.006 * (0.4 * shock[t] + gld_idio[t])));

    let (fxi_vol_noise, mchi_vol_noise) = (draw(n), draw(n));
    let volume = |noise: &[f64], base: f64| -> Vec<f64> {
        (0..n)
            .map(|t| base * (0.2 * noise[t] + 0.1 * shock[t].abs()).exp())
            .collect()
    };
    let fxi_volume = volume(&fxi_vol_noise, 2.0e7);
    let mchi_volume = volume(&mchi_vol_noise, 5.0e6);

    let series = |name: &str, values: &[f64]| {
        TimeSeries::from_ordered(name, dates.iter().copied().zip(values.iter().copied()).collect())
    };

    let vix = series("VIX", &vix);
    let ted = series("TED_Spread", &ted);
    let curve = series("Yield_Curve_10Y2Y", &curve);
    let stress = stress_index(
        &[
            StressComponent::new(vix.clone()),
            StressComponent::new(ted.clone()),
            StressComponent::inverted(curve.clone()),
        ],
        config.stress_smoothing,
    )?;

    let fxi = series("FXI_Price", &fxi_price);
    let mchi = series("MCHI_Price", &mchi_price);
    let gld = series("GLD_Price", &gld_price);
    let fxi_vol = series("FXI_Volume", &fxi_volume);
    let mchi_vol = series("MCHI_Volume", &mchi_volume);

    let ratio = rebased_ratio(DEFENSIVE_RATIO, &gld, &fxi)
        .ok_or_else(|| AppError::new(4, "Failed to build the defensive ratio."))?;

    let returns = [
        log_returns(&fxi).renamed("FXI_Return"),
        log_returns(&mchi).renamed("MCHI_Return"),
        log_returns(&gld).renamed("GLD_Return"),
    ];
    let return_columns = returns.iter().map(|s| s.name().to_string()).collect();
    let equity_vol = annualized_volatility(&fxi, VOL_WINDOW).renamed(EQUITY_VOLATILITY);

    let mut all = vec![
        vix,
        ted,
        curve,
        stress,
        series(LEAD_FLOW, &lead_flow),
        series(INDEPENDENT_FLOW, &independent_flow),
        flow_index("FXI_Flow_Index", &fxi, &fxi_vol, config.flow_window),
        flow_index("MCHI_Flow_Index", &mchi, &mchi_vol, config.flow_window),
        fxi,
        fxi_vol,
        mchi,
        mchi_vol,
        gld,
        ratio,
        equity_vol,
    ];
    all.extend(returns);

    Ok(SyntheticData {
        frame: Frame::from_series(&all),
        stress_column: STRESS_INDEX_NAME.to_string(),
        flow_columns: vec![LEAD_FLOW.to_string(), INDEPENDENT_FLOW.to_string()],
        return_columns,
        ratio_column: DEFENSIVE_RATIO.to_string(),
    })
}

fn business_days(start: NaiveDate, n: usize) -> Vec<NaiveDate> {
    let mut out = Vec::with_capacity(n);
    let mut day = start;
    while out.len() < n {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            out.push(day);
        }
        day += Duration::days(1);
    }
    out
}

fn walk(start: f64, steps: impl Iterator<Item = f64>) -> Vec<f64> {
    steps
        .scan(start, |acc, x| {
            *acc += x;
            Some(*acc)
        })
        .collect()
}

/// Price path from simple returns.
fn compound(start: f64, returns: impl Iterator<Item = f64>) -> Vec<f64> {
    returns
        .scan(start, |acc, r| {
            *acc *= 1.0 + r;
            Some(*acc)
        })
        .collect()
}
