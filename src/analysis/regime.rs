//! Calm vs stress regime comparison.
//!
//! The sample is split once, on the stress column alone, at a quantile
//! threshold. Every pair is then correlated inside each regime, so all pairs
//! share the same split.

use log::{debug, warn};
use serde::Serialize;

use crate::domain::{Frame, RegimeShift};
use crate::error::AnalysisError;
use crate::math::{pearson_defined, quantile};

/// Regime membership of each frame row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegimeSplit {
    pub threshold: f64,
    /// `Some(true)` = stress regime, `Some(false)` = calm, `None` = stress missing.
    pub membership: Vec<Option<bool>>,
}

impl RegimeSplit {
    pub fn stress_rows(&self) -> usize {
        self.membership.iter().filter(|m| **m == Some(true)).count()
    }

    pub fn calm_rows(&self) -> usize {
        self.membership.iter().filter(|m| **m == Some(false)).count()
    }
}

/// One pair's correlation in each regime.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegimeComparison {
    pub first: String,
    pub second: String,
    pub calm: Option<f64>,
    pub stress: Option<f64>,
    /// `stress − calm`; `None` if either correlation is undefined.
    pub diff: Option<f64>,
    pub shift: Option<RegimeShift>,
}

impl RegimeComparison {
    pub fn pair_label(&self) -> String {
        format!("{} vs {}", self.first, self.second)
    }
}

/// `diff > t` converge, `diff < −t` diverge, otherwise stable.
pub fn classify_shift(diff: f64, shift_threshold: f64) -> RegimeShift {
    if diff > shift_threshold {
        RegimeShift::Converge
    } else if diff < -shift_threshold {
        RegimeShift::Diverge
    } else {
        RegimeShift::Stable
    }
}

/// Split rows at the `q`-quantile of the stress column (stress > threshold).
pub fn split_regimes(frame: &Frame, stress_col: &str, q: f64) -> Result<RegimeSplit, AnalysisError> {
    let stress = frame
        .column(stress_col)
        .ok_or_else(|| AnalysisError::MissingColumn(stress_col.to_string()))?;

    let defined: Vec<f64> = stress.iter().flatten().copied().collect();
    let threshold = quantile(&defined, q).ok_or(AnalysisError::InsufficientData {
        needed: 1,
        got: defined.len(),
    })?;

    let membership = stress.iter().map(|v| v.map(|s| s > threshold)).collect();
    Ok(RegimeSplit { threshold, membership })
}

/// Compare calm vs stress correlations for each pair present in the frame.
///
/// Pairs referencing absent columns are skipped (logged), not treated as errors.
pub fn compare_regimes(
    frame: &Frame,
    stress_col: &str,
    pairs: &[(String, String)],
    q: f64,
    shift_threshold: f64,
) -> Result<Vec<RegimeComparison>, AnalysisError> {
    let split = split_regimes(frame, stress_col, q)?;
    compare_with_split(frame, &split, pairs, shift_threshold)
}

/// Same as [`compare_regimes`] with a split already computed on `frame`.
pub fn compare_with_split(
    frame: &Frame,
    split: &RegimeSplit,
    pairs: &[(String, String)],
    shift_threshold: f64,
) -> Result<Vec<RegimeComparison>, AnalysisError> {
    if split.membership.len() != frame.len() {
        return Err(AnalysisError::InvalidSeries(format!(
            "regime split covers {} rows, frame has {}",
            split.membership.len(),
            frame.len()
        )));
    }
    debug!(
        "regime: threshold={:.4} stress_rows={} calm_rows={}",
        split.threshold,
        split.stress_rows(),
        split.calm_rows()
    );

    let mut out = Vec::with_capacity(pairs.len());
    for (first, second) in pairs {
        let (Some(x), Some(y)) = (frame.column(first), frame.column(second)) else {
            warn!("regime: skipping pair `{first}` / `{second}` (column not in input)");
            continue;
        };

        let calm = regime_correlation(x, y, &split.membership, false);
        let stress = regime_correlation(x, y, &split.membership, true);
        let diff = match (calm, stress) {
            (Some(c), Some(s)) => Some(s - c),
            _ => None,
        };

        out.push(RegimeComparison {
            first: first.clone(),
            second: second.clone(),
            calm,
            stress,
            diff,
            shift: diff.map(|d| classify_shift(d, shift_threshold)),
        });
    }
    Ok(out)
}

fn regime_correlation(x: &[Option<f64>], y: &[Option<f64>], membership: &[Option<bool>], stressed: bool) -> Option<f64> {
    let (xs, ys): (Vec<Option<f64>>, Vec<Option<f64>>) = x
        .iter()
        .zip(y.iter())
        .zip(membership.iter())
        .filter(|(_, m)| **m == Some(stressed))
        .map(|((a, b), _)| (*a, *b))
        .unzip();
    pearson_defined(&xs, &ys)
}
