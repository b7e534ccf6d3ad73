//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the analysis code returns structured results and stays testable
//! - output changes are localized

use crate::analysis::events::StressEvent;
use crate::analysis::granger::GrangerOutcome;
use crate::analysis::{CrossCorrelation, DominantLag};
use crate::app::pipeline::{EventRun, LeadLagRun, PairAnalysis, RegimeRun, SyncRun};
use crate::domain::{CoMovement, LeadRole};
use crate::io::ingest::IngestedFrame;

/// How many of the strongest lags to list per pair.
const TOP_LAGS: usize = 5;
const MAX_ROW_ERRORS: usize = 10;

pub fn format_ingest_summary(ingest: &IngestedFrame) -> String {
    let mut out = String::new();
    let frame = &ingest.frame;
    out.push_str(&format!(
        "Input: rows read={} used={} duplicate dates={} | columns={}\n",
        ingest.rows_read,
        ingest.rows_used,
        ingest.duplicate_dates,
        frame.columns().len()
    ));
    if let (Some(first), Some(last)) = (frame.dates().first(), frame.dates().last()) {
        out.push_str(&format!("Period: {first} .. {last}\n"));
    }
    if !ingest.row_errors.is_empty() {
        out.push_str(&format!("Row errors: {}\n", ingest.row_errors.len()));
        for e in ingest.row_errors.iter().take(MAX_ROW_ERRORS) {
            match &e.column {
                Some(col) => out.push_str(&format!("  line {} [{col}]: {}\n", e.line, e.message)),
                None => out.push_str(&format!("  line {}: {}\n", e.line, e.message)),
            }
        }
        if ingest.row_errors.len() > MAX_ROW_ERRORS {
            out.push_str(&format!("  ... {} more\n", ingest.row_errors.len() - MAX_ROW_ERRORS));
        }
    }
    out
}

/// Full lead-lag report: one section per flow.
pub fn format_leadlag(run: &LeadLagRun) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== Lead-lag: {} vs flows ===\n", run.stress));
    out.push_str(&format!(
        "max lag={} | granger lags={:?} | significance={}\n",
        run.config.max_lag,
        run.config.sorted_lag_orders(),
        run.config.significance
    ));
    for pair in &run.pairs {
        out.push('\n');
        out.push_str(&format_pair(pair));
    }
    out
}

fn format_pair(pair: &PairAnalysis) -> String {
    let mut out = String::new();
    out.push_str(&format!("--- {} vs {} (n={}) ---\n", pair.stress, pair.flow, pair.observations));

    if let Some(ccf) = &pair.ccf {
        out.push_str(&format_ccf(ccf, pair.dominant.as_ref()));
    }
    if let Some(granger) = &pair.granger {
        out.push_str(&format_outcome(&granger.first_name, &granger.second_name, &granger.first_to_second));
        out.push_str(&format_outcome(&granger.second_name, &granger.first_name, &granger.second_to_first));
    }
    if let Some(summary) = &pair.summary {
        out.push_str(&format!(
            "Verdict: {} ({})\n",
            summary.verdict.label(),
            summary.verdict.description()
        ));
    }
    for issue in &pair.issues {
        out.push_str(&format!("  (skipped) {issue}\n"));
    }
    out
}

/// Strongest lags plus a plain-language reading of the dominant one.
pub fn format_ccf(ccf: &CrossCorrelation, dominant: Option<&DominantLag>) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Cross-correlation: {} of {} lags defined\n",
        ccf.defined_count(),
        ccf.entries.len()
    ));

    let mut ranked: Vec<(i64, f64)> = ccf
        .entries
        .iter()
        .filter_map(|e| e.correlation.map(|r| (e.lag, r)))
        .collect();
    ranked.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
    for (lag, r) in ranked.iter().take(TOP_LAGS) {
        out.push_str(&format!("  lag {lag:>+4}  r={r:>+.4}\n"));
    }

    if let Some(d) = dominant {
        out.push_str(&format!(
            "Dominant lag {:+} (r={:+.4}): {}; {}\n",
            d.lag,
            d.correlation,
            describe_lead(d, &ccf.first_name, &ccf.second_name),
            describe_co_movement(d.co_movement)
        ));
    }
    out
}

fn describe_lead(d: &DominantLag, first: &str, second: &str) -> String {
    let steps = d.lag.unsigned_abs();
    match d.lead {
        LeadRole::SecondLeads => format!("{second} leads {first} by {steps} step(s)"),
        LeadRole::FirstLeads => format!("{first} leads {second} by {steps} step(s)"),
        LeadRole::Contemporaneous => "contemporaneous".to_string(),
    }
}

fn describe_co_movement(c: CoMovement) -> &'static str {
    match c {
        CoMovement::Same => "same direction",
        CoMovement::Opposite => "opposite direction (one falls when the other rises)",
    }
}

fn format_outcome(cause: &str, effect: &str, outcome: &GrangerOutcome) -> String {
    let mut out = String::new();
    out.push_str(&format!("Granger {cause} -> {effect}:\n"));
    let best = outcome.best().map(|b| b.lag);
    for r in &outcome.results {
        let mark = if Some(r.lag) == best { "*" } else { " " };
        out.push_str(&format!(
            "{mark} lag {:>3}  F={:>9.4}  p={:.4}  df=({}, {})\n",
            r.lag, r.f_stat, r.p_value, r.df_num, r.df_denom
        ));
    }
    out
}

/// Compact block appended to the Granger log file.
pub fn format_granger_log(run: &LeadLagRun) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== Granger causality: {} ===\n", run.stress));
    for pair in &run.pairs {
        out.push_str(&format!("\n--- {} ---\n", pair.flow));
        match &pair.summary {
            Some(s) => {
                out.push_str(&format!(
                    "{} -> {}: best lag {} p={:.4}\n",
                    s.first_name, s.second_name, s.first_to_second.lag, s.first_to_second.p_value
                ));
                out.push_str(&format!(
                    "{} -> {}: best lag {} p={:.4}\n",
                    s.second_name, s.first_name, s.second_to_first.lag, s.second_to_first.p_value
                ));
                out.push_str(&format!("Verdict: {}\n", s.verdict.label()));
            }
            None => out.push_str("no result\n"),
        }
    }
    out
}

/// `pair | calm | stress | diff | status` table.
pub fn format_regimes(run: &RegimeRun) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "=== Regimes: {} > Q{:.2} = {:.4} (stress rows={}, calm rows={}) ===\n",
        run.stress, run.quantile, run.threshold, run.stress_rows, run.calm_rows
    ));
    out.push_str(format!("{:<32} {:>8} {:>8} {:>8} {:<9}\n", "pair", "calm", "stress", "diff", "status").trim_end());
    out.push('\n');
    out.push_str(format!("{:-<32} {:-<8} {:-<8} {:-<8} {:-<9}\n", "", "", "", "", "").trim_end());
    out.push('\n');
    for c in &run.comparisons {
        out.push_str(
            format!(
                "{:<32} {:>8} {:>8} {:>8} {:<9}\n",
                truncate(&c.pair_label(), 32),
                fmt_opt(c.calm),
                fmt_opt(c.stress),
                fmt_opt(c.diff),
                c.shift.map(|s| s.label()).unwrap_or("n/a"),
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

pub fn format_sync(run: &SyncRun) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== Synchronization (window={}) ===\n", run.params.window));
    for (label, mean) in &run.pair_means {
        out.push_str(&format!("  {label:<32} mean r={}\n", fmt_opt(*mean)));
    }
    out.push_str(&format!("Index mean: {}\n", fmt_opt(run.mean_index)));

    if let Some(p) = &run.periods {
        out.push_str(&format!(
            "High stress (> {:.4}): n={} mean={}\n",
            p.upper_threshold,
            p.high_stress.n,
            fmt_opt(p.high_stress.mean)
        ));
        out.push_str(&format!(
            "Low stress  (< {:.4}): n={} mean={}\n",
            p.lower_threshold,
            p.low_stress.n,
            fmt_opt(p.low_stress.mean)
        ));
        match &p.test {
            Some(t) => out.push_str(&format!("t={:.3} p={:.4} (df={})\n", t.t_stat, t.p_value, t.df)),
            None => out.push_str("t-test: not enough observations\n"),
        }
    }
    out
}

pub fn format_events(run: &EventRun) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "=== Event study: {} peaks > mean + {}σ, ratio {} ===\n",
        run.stress, run.params.sigma, run.ratio
    ));
    out.push_str(&format!("Events: {}\n", run.events.len()));
    for StressEvent { date, value } in &run.events {
        out.push_str(&format!("  {date}: stress={value:.2}\n"));
    }

    let study = &run.study;
    out.push_str(&format!(
        "With full windows ({} before / {} after): {}\n",
        study.pre_window,
        study.post_window,
        study.windows.len()
    ));
    if study.windows.is_empty() {
        return out;
    }
    out.push_str(&format!("Mean change before: {}\n", fmt_signed(study.mean_pre)));
    out.push_str(&format!("Mean change after:  {}\n", fmt_signed(study.mean_post)));
    match &study.pre_test {
        Some(t) => out.push_str(&format!("Pre-event t={:.3} p={:.4}\n", t.t_stat, t.p_value)),
        None => out.push_str("Pre-event t-test: not enough events\n"),
    }
    out
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.4}")).unwrap_or_else(|| "n/a".to_string())
}

fn fmt_signed(v: Option<f64>) -> String {
    v.map(|x| format!("{x:+.2}")).unwrap_or_else(|| "n/a".to_string())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ccf::LagCorrelation;
    use crate::analysis::regime::RegimeComparison;
    use crate::domain::{LagWindow, RegimeShift};

    #[test]
    fn ccf_report_reads_the_dominant_lag() {
        let ccf = CrossCorrelation {
            first_name: "STRESS".into(),
            second_name: "FLOW".into(),
            window: LagWindow::new(1).unwrap(),
            entries: vec![
                LagCorrelation { lag: -1, correlation: Some(-0.8), n_pairs: 9 },
                LagCorrelation { lag: 0, correlation: Some(0.1), n_pairs: 10 },
                LagCorrelation { lag: 1, correlation: None, n_pairs: 1 },
            ],
        };
        let text = format_ccf(&ccf, ccf.dominant().as_ref());
        assert!(text.contains("2 of 3 lags defined"));
        assert!(text.contains("FLOW leads STRESS by 1 step(s)"));
        assert!(text.contains("opposite direction"));
    }

    #[test]
    fn regime_table_marks_undefined_cells() {
        let run = RegimeRun {
            stress: "STRESS".into(),
            quantile: 0.75,
            threshold: 1.0,
            calm_rows: 30,
            stress_rows: 10,
            comparisons: vec![
                RegimeComparison {
                    first: "A".into(),
                    second: "B".into(),
                    calm: Some(0.1),
                    stress: Some(0.5),
                    diff: Some(0.4),
                    shift: Some(RegimeShift::Converge),
                },
                RegimeComparison {
                    first: "A".into(),
                    second: "C".into(),
                    calm: None,
                    stress: Some(0.2),
                    diff: None,
                    shift: None,
                },
            ],
        };
        let text = format_regimes(&run);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[3].ends_with("CONVERGE"));
        assert!(lines[4].contains("n/a"));
    }

    #[test]
    fn truncate_marks_cut_text() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd.");
    }
}
