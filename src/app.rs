//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and initializes logging
//! - parses CLI arguments
//! - loads the input table (or generates a synthetic one)
//! - runs the analysis pipeline
//! - prints reports and writes optional exports

use std::path::{Path, PathBuf};

use clap::Parser;
use log::info;

use crate::cli::{AnalysisArgs, AnalyzeArgs, Command, DemoArgs, EventsArgs, RegimeArgs, SyncArgs};
use crate::data::{SyntheticConfig, generate_synthetic};
use crate::domain::{AnalysisConfig, Frame};
use crate::error::AppError;
use crate::io::ingest::{IngestedFrame, load_frame};

pub mod pipeline;

use pipeline::{EventParams, RunSummary, SyncParams};

/// Entry point for the `leadlag` binary.
pub fn run() -> Result<(), AppError> {
    // `.env` first so RUST_LOG can live there.
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = crate::cli::Cli::parse();
    match cli.command {
        Command::Analyze(args) => handle_analyze(args),
        Command::Regime(args) => handle_regime(args),
        Command::Sync(args) => handle_sync(args),
        Command::Events(args) => handle_events(args),
        Command::Demo(args) => handle_demo(args),
    }
}

pub fn analysis_config_from_args(args: &AnalysisArgs) -> AnalysisConfig {
    AnalysisConfig {
        max_lag: args.max_lag,
        lag_orders: args.lags.clone(),
        significance: args.significance,
        regime_quantile: args.regime_quantile,
        shift_threshold: args.shift_threshold,
    }
}

fn handle_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let config = analysis_config_from_args(&args.analysis);
    config.validate()?;

    let ingest = load_input(&args.input.input)?;
    let flows = if args.flows.is_empty() {
        default_flow_columns(&ingest.frame, &args.input.stress)
    } else {
        args.flows.clone()
    };

    let run = pipeline::run_leadlag(&ingest.frame, &args.input.stress, &flows, &config)?;
    println!("{}", crate::report::format_leadlag(&run));

    if let Some(dir) = &args.export_ccf {
        export_ccfs(dir, &run)?;
    }
    if let Some(path) = &args.granger_log {
        crate::io::export::append_granger_log(path, &crate::report::format_granger_log(&run))?;
    }
    if let Some(path) = &args.summary {
        let summary = RunSummary {
            leadlag: Some(run),
            ..RunSummary::default()
        };
        crate::io::export::write_summary_json(path, &summary)?;
    }
    Ok(())
}

fn handle_regime(args: RegimeArgs) -> Result<(), AppError> {
    let config = analysis_config_from_args(&args.analysis);
    let ingest = load_input(&args.input.input)?;

    let run = pipeline::run_regimes(&ingest.frame, &args.input.stress, &args.pairs, &config)?;
    println!("{}", crate::report::format_regimes(&run));

    if let Some(path) = &args.export {
        crate::io::export::write_regime_csv(path, &run.comparisons)?;
    }
    Ok(())
}

fn handle_sync(args: SyncArgs) -> Result<(), AppError> {
    let ingest = load_input(&args.input)?;
    let params = SyncParams {
        window: args.window,
        ..SyncParams::default()
    };

    let run = pipeline::run_sync(&ingest.frame, args.stress.as_deref(), &args.assets, &params)?;
    println!("{}", crate::report::format_sync(&run));

    if let Some(path) = &args.export {
        crate::io::export::write_sync_csv(path, &run.index)?;
    }
    Ok(())
}

fn handle_events(args: EventsArgs) -> Result<(), AppError> {
    let ingest = load_input(&args.input.input)?;
    let params = EventParams {
        sigma: args.sigma,
        half_window: args.half_window,
        pre_window: args.pre,
        post_window: args.post,
    };

    let run = pipeline::run_events(&ingest.frame, &args.input.stress, &args.ratio, &params)?;
    println!("{}", crate::report::format_events(&run));
    Ok(())
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = analysis_config_from_args(&args.analysis);
    config.validate()?;

    let synthetic = SyntheticConfig {
        seed: args.seed,
        days: args.days,
        lead_days: args.lead_days,
        coupling: args.coupling,
        ..SyntheticConfig::default()
    };
    let data = generate_synthetic(&synthetic)?;
    info!(
        "demo: {} rows x {} columns (seed {})",
        data.frame.len(),
        data.frame.columns().len(),
        args.seed
    );

    let summary = pipeline::run_all(&data, &config)?;
    if let Some(run) = &summary.leadlag {
        println!("{}", crate::report::format_leadlag(run));
    }
    if let Some(run) = &summary.regimes {
        println!("{}", crate::report::format_regimes(run));
    }
    if let Some(run) = &summary.sync {
        println!("{}", crate::report::format_sync(run));
    }
    if let Some(run) = &summary.events {
        println!("{}", crate::report::format_events(run));
    }

    if let Some(dir) = &args.out_dir {
        write_demo_outputs(dir, &data.frame, &summary)?;
        println!("Outputs written to {}", dir.display());
    }
    Ok(())
}

fn write_demo_outputs(dir: &Path, frame: &Frame, summary: &RunSummary) -> Result<(), AppError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| AppError::new(2, format!("Failed to create output directory '{}': {e}", dir.display())))?;

    crate::io::export::write_frame_csv(&dir.join("master_dataset.csv"), frame)?;
    if let Some(run) = &summary.leadlag {
        export_ccfs(dir, run)?;
        crate::io::export::append_granger_log(
            &dir.join("granger_results.txt"),
            &crate::report::format_granger_log(run),
        )?;
    }
    if let Some(run) = &summary.regimes {
        crate::io::export::write_regime_csv(&dir.join("regime_correlations.csv"), &run.comparisons)?;
    }
    if let Some(run) = &summary.sync {
        crate::io::export::write_sync_csv(&dir.join("synchronization_index.csv"), &run.index)?;
    }
    crate::io::export::write_summary_json(&dir.join("summary.json"), summary)
}

fn export_ccfs(dir: &Path, run: &pipeline::LeadLagRun) -> Result<(), AppError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| AppError::new(2, format!("Failed to create output directory '{}': {e}", dir.display())))?;
    for pair in &run.pairs {
        if let Some(ccf) = &pair.ccf {
            crate::io::export::write_ccf_csv(&ccf_path(dir, &pair.flow), ccf)?;
        }
    }
    Ok(())
}

/// `ccf_<flow>.csv` with anything outside `[A-Za-z0-9_-]` replaced.
fn ccf_path(dir: &Path, flow: &str) -> PathBuf {
    let safe: String = flow
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    dir.join(format!("ccf_{safe}.csv"))
}

fn load_input(path: &Path) -> Result<IngestedFrame, AppError> {
    let ingest = load_frame(path)?;
    print!("{}", crate::report::format_ingest_summary(&ingest));
    Ok(ingest)
}

/// Every non-stress column whose name mentions "flow" (case-insensitive).
fn default_flow_columns(frame: &Frame, stress_col: &str) -> Vec<String> {
    frame
        .column_names()
        .into_iter()
        .filter(|name| *name != stress_col && name.to_ascii_lowercase().contains("flow"))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ccf_file_names_are_sanitized() {
        let p = ccf_path(Path::new("out"), "China Tech/Flow");
        assert_eq!(p, Path::new("out").join("ccf_China_Tech_Flow.csv"));
    }

    #[test]
    fn default_flows_skip_stress_and_other_columns() {
        let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut frame = Frame::new(vec![start]).unwrap();
        for name in ["STRESS_INDEX", "EEM_Flow_Index", "VIX", "india_flow"] {
            frame.insert_column(name, vec![Some(1.0)]).unwrap();
        }
        assert_eq!(default_flow_columns(&frame, "STRESS_INDEX"), vec!["EEM_Flow_Index", "india_flow"]);
    }

    #[test]
    fn config_from_args_copies_every_field() {
        let args = AnalysisArgs {
            max_lag: 12,
            lags: vec![2, 1],
            significance: 0.01,
            regime_quantile: 0.9,
            shift_threshold: 0.3,
        };
        let config = analysis_config_from_args(&args);
        assert_eq!(config.max_lag, 12);
        assert_eq!(config.sorted_lag_orders(), vec![1, 2]);
        assert_eq!(config.significance, 0.01);
        assert_eq!(config.regime_quantile, 0.9);
        assert_eq!(config.shift_threshold, 0.3);
    }
}
