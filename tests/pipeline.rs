//! End-to-end: synthetic data -> CSV on disk -> ingest -> analyses -> exports.

use leadlag::app::pipeline::{RunSummary, run_leadlag, run_regimes};
use leadlag::data::{SyntheticConfig, generate_synthetic};
use leadlag::data::synthetic::{INDEPENDENT_FLOW, LEAD_FLOW};
use leadlag::domain::{AnalysisConfig, LeadRole, RelationshipVerdict};
use leadlag::io::{load_frame, write_ccf_csv, write_frame_csv, write_summary_json};

#[test]
fn csv_round_trip_preserves_planted_lead() {
    let dir = tempfile::tempdir().unwrap();
    let data = generate_synthetic(&SyntheticConfig {
        stress_smoothing: 1,
        ..SyntheticConfig::default()
    })
    .unwrap();

    let csv_path = dir.path().join("master.csv");
    write_frame_csv(&csv_path, &data.frame).unwrap();
    let ingest = load_frame(&csv_path).unwrap();
    assert!(ingest.row_errors.is_empty());
    assert_eq!(ingest.rows_used, data.frame.len());

    let flows = vec![LEAD_FLOW.to_string(), INDEPENDENT_FLOW.to_string()];
    let config = AnalysisConfig::default();
    let run = run_leadlag(&ingest.frame, &data.stress_column, &flows, &config).unwrap();

    let lead = &run.pairs[0];
    assert_eq!(lead.flow, LEAD_FLOW);
    let dominant = lead.dominant.unwrap();
    assert_eq!(dominant.lag, -3);
    assert_eq!(dominant.lead, LeadRole::SecondLeads);
    let verdict = lead.summary.as_ref().unwrap().verdict;
    assert!(matches!(
        verdict,
        RelationshipVerdict::Predictive | RelationshipVerdict::FeedbackLoop
    ));

    let ccf_path = dir.path().join("ccf_lead.csv");
    write_ccf_csv(&ccf_path, lead.ccf.as_ref().unwrap()).unwrap();
    let ccf_text = std::fs::read_to_string(&ccf_path).unwrap();
    // Header plus one row per lag in [-30, 30].
    assert_eq!(ccf_text.lines().count(), 62);

    let regimes = run_regimes(&ingest.frame, &data.stress_column, &data.regime_pairs(), &config).unwrap();
    assert_eq!(regimes.comparisons.len(), 3);

    let summary = RunSummary {
        leadlag: Some(run),
        regimes: Some(regimes),
        ..RunSummary::default()
    };
    let json_path = dir.path().join("summary.json");
    write_summary_json(&json_path, &summary).unwrap();
    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(json["leadlag"]["pairs"][0]["flow"], LEAD_FLOW);
    assert!(json["sync"].is_null());
}

#[test]
fn independent_flow_is_unrelated_to_stress() {
    let data = generate_synthetic(&SyntheticConfig {
        seed: 7,
        ..SyntheticConfig::default()
    })
    .unwrap();
    let flows = vec![LEAD_FLOW.to_string(), INDEPENDENT_FLOW.to_string()];
    let run = run_leadlag(&data.frame, &data.stress_column, &flows, &AnalysisConfig::default()).unwrap();

    let independent = &run.pairs[1];
    assert_eq!(independent.flow, INDEPENDENT_FLOW);
    assert!(independent.issues.is_empty());
    assert_eq!(
        independent.summary.as_ref().unwrap().verdict,
        RelationshipVerdict::NoRelation
    );
}

#[test]
fn missing_input_file_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_frame(&dir.path().join("absent.csv")).unwrap_err();
    assert_eq!(err.exit_code(), 2);
}
