//! Command-line parsing for the stress/flow lead-lag analyzer.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the statistics code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::analysis::events::{DEFAULT_EVENT_HALF_WINDOW, DEFAULT_EVENT_SIGMA, DEFAULT_EVENT_WINDOW};
use crate::domain::{
    DEFAULT_LAG_ORDERS, DEFAULT_MAX_LAG, DEFAULT_REGIME_QUANTILE, DEFAULT_SHIFT_THRESHOLD, DEFAULT_SIGNIFICANCE,
};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "leadlag",
    version,
    about = "Lead-lag and Granger analysis of institutional flows vs financial stress"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Cross-correlation + bidirectional Granger tests of each flow against stress.
    Analyze(AnalyzeArgs),
    /// Compare pairwise correlations between calm and stress regimes.
    Regime(RegimeArgs),
    /// Rolling cross-asset synchronization index and high/low stress comparison.
    Sync(SyncArgs),
    /// Stress-event study of a defensive ratio.
    Events(EventsArgs),
    /// Generate a seeded synthetic dataset and run every analysis on it.
    Demo(DemoArgs),
}

/// Statistical settings shared by the analysis commands.
#[derive(Debug, Args, Clone)]
pub struct AnalysisArgs {
    /// Maximum lag (time steps) of the cross-correlation window.
    #[arg(long, default_value_t = DEFAULT_MAX_LAG)]
    pub max_lag: usize,

    /// Granger lag orders (comma-separated).
    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_LAG_ORDERS.to_vec())]
    pub lags: Vec<usize>,

    /// p-values strictly below this are significant.
    #[arg(long, default_value_t = DEFAULT_SIGNIFICANCE)]
    pub significance: f64,

    /// Stress quantile separating calm from stress regimes.
    #[arg(long, default_value_t = DEFAULT_REGIME_QUANTILE)]
    pub regime_quantile: f64,

    /// Minimum correlation change (stress - calm) to call a shift.
    #[arg(long, default_value_t = DEFAULT_SHIFT_THRESHOLD)]
    pub shift_threshold: f64,
}

/// Input table options.
#[derive(Debug, Args, Clone)]
pub struct InputArgs {
    /// CSV with a date column first and one column per series.
    #[arg(short, long, value_name = "CSV")]
    pub input: PathBuf,

    /// Stress index column.
    #[arg(short, long, default_value = "STRESS_INDEX")]
    pub stress: String,
}

#[derive(Debug, Args, Clone)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Flow column(s) to test. Defaults to every column whose name contains "flow".
    #[arg(short, long = "flow")]
    pub flows: Vec<String>,

    #[command(flatten)]
    pub analysis: AnalysisArgs,

    /// Directory for one `ccf_<flow>.csv` per flow.
    #[arg(long, value_name = "DIR")]
    pub export_ccf: Option<PathBuf>,

    /// Append the Granger summary to this text file.
    #[arg(long, value_name = "PATH")]
    pub granger_log: Option<PathBuf>,

    /// Write every result as JSON.
    #[arg(long, value_name = "JSON")]
    pub summary: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct RegimeArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Pair to compare as `FIRST:SECOND` (repeatable).
    #[arg(short, long = "pair", value_parser = parse_pair, required = true)]
    pub pairs: Vec<(String, String)>,

    #[command(flatten)]
    pub analysis: AnalysisArgs,

    /// Write the regime table as CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct SyncArgs {
    /// CSV with a date column first and one column per series.
    #[arg(short, long, value_name = "CSV")]
    pub input: PathBuf,

    /// Asset columns (comma-separated, at least two).
    #[arg(short, long, value_delimiter = ',', required = true)]
    pub assets: Vec<String>,

    /// Stress column for the high/low stress comparison.
    #[arg(short, long)]
    pub stress: Option<String>,

    /// Rolling window (rows).
    #[arg(long, default_value_t = 90)]
    pub window: usize,

    /// Write dates, pair correlations and the index as CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct EventsArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Defensive ratio column.
    #[arg(short, long, default_value = "DEFENSIVE_RATIO")]
    pub ratio: String,

    /// Peaks must exceed mean + sigma * std.
    #[arg(long, default_value_t = DEFAULT_EVENT_SIGMA)]
    pub sigma: f64,

    /// A peak is the maximum of this many rows on each side.
    #[arg(long, default_value_t = DEFAULT_EVENT_HALF_WINDOW)]
    pub half_window: usize,

    /// Rows before the event.
    #[arg(long, default_value_t = DEFAULT_EVENT_WINDOW)]
    pub pre: usize,

    /// Rows after the event.
    #[arg(long, default_value_t = DEFAULT_EVENT_WINDOW)]
    pub post: usize,
}

#[derive(Debug, Args, Clone)]
pub struct DemoArgs {
    /// Random seed.
    #[arg(long, default_value_t = 7)]
    pub seed: u64,

    /// Number of business days to generate.
    #[arg(long, default_value_t = 1500)]
    pub days: usize,

    /// Days by which the leading flow precedes stress.
    #[arg(long, default_value_t = 3)]
    pub lead_days: usize,

    /// Weight of the stress shock in the leading flow, in [0, 1].
    #[arg(long, default_value_t = 0.6)]
    pub coupling: f64,

    #[command(flatten)]
    pub analysis: AnalysisArgs,

    /// Write the dataset and every result into this directory.
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,
}

/// `FIRST:SECOND` -> `(FIRST, SECOND)`.
fn parse_pair(s: &str) -> Result<(String, String), String> {
    let (a, b) = s
        .split_once(':')
        .ok_or_else(|| format!("expected FIRST:SECOND, got '{s}'"))?;
    let (a, b) = (a.trim(), b.trim());
    if a.is_empty() || b.is_empty() {
        return Err(format!("expected FIRST:SECOND, got '{s}'"));
    }
    Ok((a.to_string(), b.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_defaults_match_documented_constants() {
        let cli = Cli::try_parse_from(["leadlag", "analyze", "-i", "data.csv"]).unwrap();
        let Command::Analyze(args) = cli.command else { panic!("expected analyze") };
        assert_eq!(args.input.stress, "STRESS_INDEX");
        assert!(args.flows.is_empty());
        assert_eq!(args.analysis.max_lag, 30);
        assert_eq!(args.analysis.lags, vec![1, 3, 5, 10]);
        assert_eq!(args.analysis.significance, 0.05);
    }

    #[test]
    fn lags_and_flows_parse() {
        let cli = Cli::try_parse_from([
            "leadlag", "analyze", "-i", "x.csv", "-f", "A", "--flow", "B", "--lags", "2,4",
        ])
        .unwrap();
        let Command::Analyze(args) = cli.command else { panic!("expected analyze") };
        assert_eq!(args.flows, vec!["A", "B"]);
        assert_eq!(args.analysis.lags, vec![2, 4]);
    }

    #[test]
    fn pairs_parse() {
        assert_eq!(parse_pair("FXI:MCHI").unwrap(), ("FXI".to_string(), "MCHI".to_string()));
        assert!(parse_pair("FXI").is_err());
        assert!(parse_pair(":MCHI").is_err());

        let cli = Cli::try_parse_from(["leadlag", "regime", "-i", "x.csv", "-p", "A:B", "-p", "A:C"]).unwrap();
        let Command::Regime(args) = cli.command else { panic!("expected regime") };
        assert_eq!(args.pairs.len(), 2);
    }
}
