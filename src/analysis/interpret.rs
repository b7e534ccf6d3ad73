//! Reduce two directional Granger p-values to a single verdict.

use serde::Serialize;

use crate::analysis::granger::{BidirectionalGranger, GrangerLagResult};
use crate::domain::RelationshipVerdict;

/// Decision table over (A→B significant, B→A significant).
///
/// Significance is strict: `p < threshold`. Total over every pair of p-values.
pub fn interpret(p_ab: f64, p_ba: f64, threshold: f64) -> RelationshipVerdict {
    match (p_ab < threshold, p_ba < threshold) {
        (true, false) => RelationshipVerdict::Reactive,
        (false, true) => RelationshipVerdict::Predictive,
        (true, true) => RelationshipVerdict::FeedbackLoop,
        (false, false) => RelationshipVerdict::NoRelation,
    }
}

/// Best (lag, p) per direction plus the verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CausalSummary {
    pub first_name: String,
    pub second_name: String,
    pub first_to_second: GrangerLagResult,
    pub second_to_first: GrangerLagResult,
    pub verdict: RelationshipVerdict,
}

/// Summarize a bidirectional test. `None` if either direction has no result.
pub fn summarize(granger: &BidirectionalGranger, threshold: f64) -> Option<CausalSummary> {
    let ab = *granger.first_to_second.best()?;
    let ba = *granger.second_to_first.best()?;
    Some(CausalSummary {
        first_name: granger.first_name.clone(),
        second_name: granger.second_name.clone(),
        first_to_second: ab,
        second_to_first: ba,
        verdict: interpret(ab.p_value, ba.p_value, threshold),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::granger::GrangerOutcome;

    #[test]
    fn decision_table() {
        assert_eq!(interpret(0.01, 0.50, 0.05), RelationshipVerdict::Reactive);
        assert_eq!(interpret(0.50, 0.01, 0.05), RelationshipVerdict::Predictive);
        assert_eq!(interpret(0.01, 0.01, 0.05), RelationshipVerdict::FeedbackLoop);
        assert_eq!(interpret(0.50, 0.50, 0.05), RelationshipVerdict::NoRelation);
    }

    #[test]
    fn threshold_itself_is_not_significant() {
        assert_eq!(interpret(0.05, 0.05, 0.05), RelationshipVerdict::NoRelation);
        assert_eq!(interpret(0.049_999, 0.05, 0.05), RelationshipVerdict::Reactive);
    }

    #[test]
    fn total_over_unit_square() {
        for i in 0..=20 {
            for j in 0..=20 {
                let v = interpret(i as f64 / 20.0, j as f64 / 20.0, 0.05);
                assert!(matches!(
                    v,
                    RelationshipVerdict::Reactive
                        | RelationshipVerdict::Predictive
                        | RelationshipVerdict::FeedbackLoop
                        | RelationshipVerdict::NoRelation
                ));
            }
        }
    }

    #[test]
    fn summarize_uses_best_lags() {
        let lag = |lag, p| GrangerLagResult { lag, f_stat: 1.0, p_value: p, df_num: lag, df_denom: 50 };
        let granger = BidirectionalGranger {
            first_name: "stress".to_string(),
            second_name: "flow".to_string(),
            first_to_second: GrangerOutcome { n_obs: 80, results: vec![lag(1, 0.3), lag(3, 0.2)] },
            second_to_first: GrangerOutcome { n_obs: 80, results: vec![lag(1, 0.04), lag(3, 0.001)] },
        };
        let s = summarize(&granger, 0.05).unwrap();
        assert_eq!(s.first_to_second.lag, 3);
        assert_eq!(s.second_to_first.lag, 3);
        assert_eq!(s.verdict, RelationshipVerdict::Predictive);
    }

    #[test]
    fn independent_flow_shows_no_relation() {
        use crate::analysis::{align_and_difference, granger_bidirectional};
        use crate::data::synthetic::INDEPENDENT_FLOW;
        use crate::data::{SyntheticConfig, generate_synthetic};
        use crate::domain::{DEFAULT_LAG_ORDERS, DEFAULT_SIGNIFICANCE};

        let data = generate_synthetic(&SyntheticConfig {
            seed: 7,
            ..SyntheticConfig::default()
        })
        .unwrap();
        let stress = data.frame.series(&data.stress_column).unwrap();
        let flow = data.frame.series(INDEPENDENT_FLOW).unwrap();
        let pair = align_and_difference(&stress, &flow).unwrap();

        let granger = granger_bidirectional(&pair, &DEFAULT_LAG_ORDERS).unwrap();
        assert_eq!(granger.first_to_second.results.len(), DEFAULT_LAG_ORDERS.len());
        let s = summarize(&granger, DEFAULT_SIGNIFICANCE).unwrap();
        assert_eq!(s.verdict, RelationshipVerdict::NoRelation);
    }
}
